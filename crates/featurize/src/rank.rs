//! Rank transformer
//!
//! Dense ranking of per-row aggregates: shared by `AuthorRank` and by the
//! per-group `<col>Rank` columns built from grouped citation sums. A rank is
//! coupled to the full frame's current composition, so it is recomputed
//! whenever the frame changes.

use magscope_common::errors::Result;
use magscope_common::frame::{Frame, Value};
use magscope_common::CITATION_COUNT_COLUMN;
use std::collections::HashMap;
use tracing::debug;

/// Sentinel a null group value is folded into before ranking. A real
/// `"None"` category in the data would collide with it.
pub const GROUP_NULL_SENTINEL: &str = "None";

/// Dense rank of each value: ascending, ties share a rank, ranks are
/// consecutive integers starting at 1.
pub fn dense_rank(values: &[i64]) -> Vec<u64> {
    let mut distinct: Vec<i64> = values.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    let rank_of: HashMap<i64, u64> = distinct
        .into_iter()
        .enumerate()
        .map(|(i, v)| (v, i as u64 + 1))
        .collect();

    values.iter().map(|v| rank_of[v]).collect()
}

/// Derive `<group_column>Rank`: the dense rank of each row's group citation
/// sum, where a group's sum is `CitationCount` summed over all rows sharing
/// the group value. Rows with a null group value take the sum 0 through the
/// [`GROUP_NULL_SENTINEL`] and therefore rank lowest.
pub fn add_group_rank(frame: &Frame, group_column: &str) -> Result<Frame> {
    let groups = frame.column(group_column)?;
    let citations = frame.column(CITATION_COUNT_COLUMN)?;

    let mut sums: HashMap<String, i64> = HashMap::new();
    for (group, citation) in groups.iter().zip(citations) {
        if let Some(key) = group.key() {
            *sums.entry(key).or_insert(0) += citation.as_i64().unwrap_or(0);
        }
    }

    let row_sums: Vec<i64> = groups
        .iter()
        .map(|group| {
            let key = group
                .key()
                .unwrap_or_else(|| GROUP_NULL_SENTINEL.to_string());
            if key == GROUP_NULL_SENTINEL {
                0
            } else {
                sums.get(&key).copied().unwrap_or(0)
            }
        })
        .collect();

    debug!(
        column = %group_column,
        groups = sums.len(),
        rows = frame.len(),
        "Ranked grouped citation sums"
    );

    let ranks = dense_rank(&row_sums);
    let column = ranks.into_iter().map(|r| Value::Int(r as i64)).collect();
    frame.with_column(&format!("{}Rank", group_column), column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use magscope_common::errors::AppError;

    #[test]
    fn test_dense_rank_ties_share_and_no_gaps() {
        let ranks = dense_rank(&[300, 100, 300, 50, 100]);
        assert_eq!(ranks, vec![3, 2, 3, 1, 2]);
    }

    #[test]
    fn test_dense_rank_single_value() {
        assert_eq!(dense_rank(&[7, 7, 7]), vec![1, 1, 1]);
    }

    fn field_frame() -> Frame {
        Frame::from_columns(vec![
            (
                "FieldOfStudy_0".into(),
                vec![
                    Value::Str("biology".into()),
                    Value::Str("biology".into()),
                    Value::Str("physics".into()),
                    Value::Null,
                ],
            ),
            (
                "CitationCount".into(),
                vec![
                    Value::Int(200),
                    Value::Int(100),
                    Value::Int(100),
                    Value::Int(999),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_group_rank_orders_by_summed_citations() {
        // biology sums 300, physics 100, null row contributes and gets 0
        let derived = add_group_rank(&field_frame(), "FieldOfStudy_0").unwrap();
        assert_eq!(
            derived.column("FieldOfStudy_0Rank").unwrap(),
            &[Value::Int(3), Value::Int(3), Value::Int(2), Value::Int(1)]
        );
    }

    #[test]
    fn test_null_group_ranks_lowest() {
        let derived = add_group_rank(&field_frame(), "FieldOfStudy_0").unwrap();
        let ranks = derived.column("FieldOfStudy_0Rank").unwrap();
        let null_rank = &ranks[3];
        assert!(ranks.iter().all(|r| r.as_i64() >= null_rank.as_i64()));
        assert_eq!(null_rank, &Value::Int(1));
    }

    #[test]
    fn test_missing_group_column_fails() {
        let err = add_group_rank(&field_frame(), "DocType").unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { .. }));
    }
}
