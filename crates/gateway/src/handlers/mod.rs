//! API handlers module

pub mod codec;
pub mod datasets;
pub mod features;
pub mod health;
