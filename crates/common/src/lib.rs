//! MagScope Common Library
//!
//! Shared code for the MagScope services including:
//! - The in-memory tabular frame model
//! - Author citation statistics types
//! - Error types and handling
//! - Configuration management
//! - Derivation memoization
//! - Metrics and observability

pub mod cache;
pub mod config;
pub mod errors;
pub mod frame;
pub mod metrics;
pub mod stats;

// Re-export commonly used types
pub use cache::MemoCache;
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use frame::{Frame, Value};
pub use stats::{AuthorStats, AuthorStatsMap};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix shared by flattened author identifier columns (`Author_1`, ...)
/// and by one-hot indicator columns
pub const AUTHOR_PREFIX: &str = "Author_";

/// Unique key column every loaded record carries
pub const PAPER_ID_COLUMN: &str = "PaperId";

/// Citation count column used by bucketing and group ranking
pub const CITATION_COUNT_COLUMN: &str = "CitationCount";

/// Popularity score column used by MagBin bucketing
pub const RANK_COLUMN: &str = "Rank";
