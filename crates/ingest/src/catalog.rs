//! Dataset catalog
//!
//! Named dataset files resolved against the configured data directory, so a
//! deployment can point the same catalog at a mounted disk via
//! `APP__DATASET__DATA_DIR`.

use magscope_common::errors::{AppError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One selectable dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetEntry {
    /// Stable identifier used by the API
    pub name: String,
    /// File name under the data directory
    pub file: String,
    /// Human-readable label for the selector UI
    pub label: String,
}

/// The known dataset files
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    data_dir: PathBuf,
    entries: Vec<DatasetEntry>,
}

impl DatasetCatalog {
    /// Build the catalog rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let entry = |name: &str, file: &str, label: &str| DatasetEntry {
            name: name.to_string(),
            file: file.to_string(),
            label: label.to_string(),
        };

        Self {
            data_dir: data_dir.into(),
            entries: vec![
                entry("sample", "sample_data.jsonl", "Small sample (50 rows)"),
                entry("250k", "250k.docs.jsonl", "Large sample (250k rows)"),
                entry("full", "mag5.docs.jsonl", "Full dataset (5m rows, slooow)"),
            ],
        }
    }

    /// All catalog entries, in selector order
    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// Directory the entries resolve against
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a dataset name to its file path
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| self.data_dir.join(&entry.file))
            .ok_or_else(|| AppError::NotFound {
                resource_type: "dataset".to_string(),
                id: name.to_string(),
            })
    }
}
