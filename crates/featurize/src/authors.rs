//! Author aggregator
//!
//! Per-row aggregates over the `Author_<n>` identifier columns and the
//! externally supplied author statistics map: the binary `AuthorProminence`
//! flag and the `AuthorRank` dense rank of author citation sums.
//!
//! The citation contribution of a row's authors deliberately excludes the
//! paper itself: each author contributes
//! `TotalCitationCount - CitationCounts[PaperId]`.

use crate::rank::dense_rank;
use magscope_common::errors::{AppError, Result};
use magscope_common::frame::{Frame, Value};
use magscope_common::stats::AuthorStatsMap;
use magscope_common::{AUTHOR_PREFIX, PAPER_ID_COLUMN};
use regex_lite::Regex;
use tracing::debug;

/// Names of the author identifier columns (`Author_1`, `Author_2`, ...)
pub fn author_id_columns(frame: &Frame) -> Vec<String> {
    let pattern = Regex::new(&format!(r"^{}\d+$", AUTHOR_PREFIX)).expect("static pattern");
    frame
        .names()
        .iter()
        .filter(|name| pattern.is_match(name))
        .cloned()
        .collect()
}

/// Citation count attributable to a row's authors, excluding the row's own
/// paper. Rows without authors contribute 0. An author id absent from the
/// statistics map, or a paper id absent from that author's per-paper counts,
/// is a lookup failure.
fn citations_for_row(
    frame: &Frame,
    row: usize,
    author_columns: &[String],
    stats: &AuthorStatsMap,
) -> Result<i64> {
    let paper_id = frame
        .value(PAPER_ID_COLUMN, row)?
        .as_i64()
        .ok_or_else(|| AppError::InvalidFormat {
            message: format!("row {} has a non-integer PaperId", row),
        })?;

    let mut sum = 0i64;
    for column in author_columns {
        let Some(author_id) = frame.value(column, row)?.key() else {
            continue;
        };

        let author = stats
            .get(&author_id)
            .ok_or_else(|| AppError::UnknownAuthor {
                author_id: author_id.clone(),
            })?;
        let own = author
            .citation_counts
            .get(&paper_id)
            .ok_or(AppError::UnknownPaper {
                author_id,
                paper_id,
            })?;

        sum += author.total_citation_count - own;
    }

    Ok(sum)
}

/// Author citation sums for every row of the frame
pub fn author_citation_sums(frame: &Frame, stats: &AuthorStatsMap) -> Result<Vec<i64>> {
    let author_columns = author_id_columns(frame);
    (0..frame.len())
        .map(|row| citations_for_row(frame, row, &author_columns, stats))
        .collect()
}

/// Derive the binary `AuthorProminence` column: 1 when the row's author
/// citation sum strictly exceeds `threshold`, else 0.
pub fn add_author_prominence(
    frame: &Frame,
    stats: &AuthorStatsMap,
    threshold: i64,
) -> Result<Frame> {
    let sums = author_citation_sums(frame, stats)?;
    debug!(rows = frame.len(), threshold, "Derived author prominence");

    let column = sums
        .into_iter()
        .map(|sum| Value::Int(i64::from(sum > threshold)))
        .collect();
    frame.with_column("AuthorProminence", column)
}

/// Derive `AuthorRank`: the dense rank (ascending, 1-based) of each row's
/// author citation sum across the whole frame.
pub fn add_author_rank(frame: &Frame, stats: &AuthorStatsMap) -> Result<Frame> {
    let sums = author_citation_sums(frame, stats)?;
    let ranks = dense_rank(&sums);

    let column = ranks.into_iter().map(|r| Value::Int(r as i64)).collect();
    frame.with_column("AuthorRank", column)
}
