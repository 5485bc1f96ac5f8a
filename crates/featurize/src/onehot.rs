//! One-hot expander
//!
//! Expands the sparse `Author_<n>` identifier columns into per-author
//! indicator columns. Heavy on datasets with many distinct authors; the
//! surrounding UI warns about it rather than this module optimizing for it.

use crate::authors::author_id_columns;
use magscope_common::frame::{Frame, Value};
use magscope_common::AUTHOR_PREFIX;
use tracing::debug;

/// Expand author identifier columns into indicator columns.
///
/// Each distinct non-null author id across the `Author_<n>` columns becomes
/// an `Author_<id>` column holding 1 for rows that list the author and 0
/// otherwise; the original identifier columns are dropped. A frame without
/// author columns is returned unchanged.
pub fn one_hot_encode_authors(frame: &Frame) -> Frame {
    let author_columns = author_id_columns(frame);
    if author_columns.is_empty() {
        return frame.clone();
    }

    // Distinct ids in first-seen order, scanning column by column
    let mut distinct: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for column in &author_columns {
        for value in frame.column(column).expect("author column exists") {
            if let Some(id) = value.key() {
                if seen.insert(id.clone()) {
                    distinct.push(id);
                }
            }
        }
    }

    debug!(
        author_columns = author_columns.len(),
        distinct_authors = distinct.len(),
        rows = frame.len(),
        "One-hot encoding authors"
    );

    let mut out = frame.drop_columns(&author_columns);
    for id in distinct {
        let indicator: Vec<Value> = (0..frame.len())
            .map(|row| {
                let listed = author_columns.iter().any(|column| {
                    frame
                        .value(column, row)
                        .ok()
                        .and_then(Value::key)
                        .as_deref()
                        == Some(id.as_str())
                });
                Value::Int(i64::from(listed))
            })
            .collect();
        out = out
            .with_column(&format!("{}{}", AUTHOR_PREFIX, id), indicator)
            .expect("indicator length matches frame");
    }

    out
}
