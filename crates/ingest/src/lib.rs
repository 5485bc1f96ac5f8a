//! MagScope dataset ingestion
//!
//! The loader collaborator: turns raw JSONL paper dumps into the frame the
//! derivation layer consumes, and parses the externally built author
//! statistics file. Dataset selection goes through a small catalog rooted at
//! a configurable data directory.

pub mod catalog;
pub mod loader;

pub use catalog::{DatasetCatalog, DatasetEntry};
pub use loader::{load_author_stats, load_dataset, LoadOptions, DROPPED_FIELDS};
