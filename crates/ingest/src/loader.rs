//! Dataset loading
//!
//! Parses newline-delimited JSON paper records into a [`Frame`], flattening
//! the nested `Authors`, `FieldsOfStudy` and `Journal` substructures the way
//! the downstream derivations expect them, and discarding fields nothing
//! consumes.

use magscope_common::errors::Result;
use magscope_common::frame::{Frame, Value};
use magscope_common::metrics::record_load;
use magscope_common::stats::AuthorStatsMap;
use magscope_common::AUTHOR_PREFIX;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Fields discarded during flattening; nothing downstream reads them
pub const DROPPED_FIELDS: &[&str] = &[
    "Urls",
    "PdfUrl",
    "Doi",
    "BookTitle",
    "Volume",
    "Issue",
    "FirstPage",
    "LastPage",
];

/// Loading parameters
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Stop after this many records
    pub limit: usize,
    /// Report progress every this many parsed records
    pub progress_every: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            limit: 1000,
            progress_every: 50,
        }
    }
}

/// Load a JSONL dataset into a frame.
///
/// `progress` receives the parsed fraction of `limit` in [0, 1]; the caller
/// decides how to surface it (the gateway logs it).
pub fn load_dataset(
    path: &Path,
    options: &LoadOptions,
    mut progress: impl FnMut(f32),
) -> Result<Frame> {
    let started = Instant::now();
    let dataset = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    info!(dataset = %dataset, limit = options.limit, "Loading dataset");

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for line in reader.lines() {
        if records.len() >= options.limit {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let doc: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&line)?;
        records.push(flatten_record(doc));

        if records.len() % options.progress_every == 0 {
            progress(records.len() as f32 / options.limit as f32);
        }
    }
    progress(1.0);

    let frame = Frame::from_records(records);
    let elapsed = started.elapsed().as_secs_f64();
    record_load(elapsed, frame.len(), &dataset);
    info!(
        dataset = %dataset,
        rows = frame.len(),
        columns = frame.width(),
        elapsed_secs = elapsed,
        "Finished loading dataset"
    );

    Ok(frame)
}

/// Flatten one raw record into (column, value) pairs
fn flatten_record(doc: serde_json::Map<String, serde_json::Value>) -> Vec<(String, Value)> {
    let mut record = Vec::with_capacity(doc.len());

    for (key, value) in doc {
        match key.as_str() {
            // Author id per position; AuthorName and SequenceNumber are not
            // carried into the frame
            "Authors" => {
                if let serde_json::Value::Array(authors) = value {
                    for (k, author) in authors.into_iter().enumerate() {
                        let id = author
                            .get("AuthorId")
                            .cloned()
                            .unwrap_or(serde_json::Value::Null);
                        record.push((format!("{}{}", AUTHOR_PREFIX, k + 1), id.into()));
                    }
                }
            }

            // One column per field-of-study level
            "FieldsOfStudy" => {
                if let serde_json::Value::Array(fields) = value {
                    for field in fields {
                        let (Some(level), Some(name)) =
                            (field.get("Level").cloned(), field.get("Name").cloned())
                        else {
                            continue;
                        };
                        let level = level.as_i64().unwrap_or_default();
                        record.push((format!("FieldOfStudy_{}", level), name.into()));
                    }
                }
            }

            // Journal also carries JournalId and Website; only the name is kept
            "Journal" => {
                if let Some(name) = value.get("JournalName") {
                    record.push(("JournalName".to_string(), name.clone().into()));
                }
            }

            _ if DROPPED_FIELDS.contains(&key.as_str()) => {
                debug!(field = %key, "Dropping unused field");
            }

            _ => record.push((key, value.into())),
        }
    }

    record
}

/// Parse the externally built author statistics file.
///
/// Reference data only: the derivations read it, nothing here or downstream
/// ever writes it back.
pub fn load_author_stats(path: &Path) -> Result<AuthorStatsMap> {
    let file = File::open(path)?;
    let stats: AuthorStatsMap = serde_json::from_reader(BufReader::new(file))?;
    info!(
        path = %path.display(),
        authors = stats.len(),
        "Loaded author statistics"
    );
    Ok(stats)
}
