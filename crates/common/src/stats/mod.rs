//! Author citation statistics
//!
//! Read-only reference data built by an upstream collaborator and handed to
//! the derivation layer. The core never mutates it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-author citation statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorStats {
    /// Citations across all of the author's papers
    #[serde(rename = "TotalCitationCount")]
    pub total_citation_count: i64,

    /// Citations attributable to each individual paper, keyed by PaperId
    #[serde(rename = "CitationCounts")]
    pub citation_counts: HashMap<i64, i64>,
}

/// Author id -> statistics. Author ids are kept in their string form so the
/// map key matches however the identifier appears in the dataset.
pub type AuthorStatsMap = HashMap<String, AuthorStats>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "42": {"TotalCitationCount": 100, "CitationCounts": {"1": 10, "2": 90}}
        }"#;
        let map: AuthorStatsMap = serde_json::from_str(json).unwrap();
        let stats = &map["42"];
        assert_eq!(stats.total_citation_count, 100);
        assert_eq!(stats.citation_counts[&1], 10);
    }
}
