//! Bucketizer
//!
//! Assigns ordinal labels to a numeric column by quantile binning (equal
//! observation counts) or fixed-width binning (equal value ranges). Drives
//! the `MagBin` and `CitationBin` derived columns.

use magscope_common::errors::{AppError, Result};
use magscope_common::frame::{Frame, Value};
use magscope_common::{CITATION_COUNT_COLUMN, RANK_COLUMN};
use serde::{Deserialize, Serialize};

/// Label assigned to out-of-range or non-numeric cells
pub const OUT_OF_RANGE_LABEL: &str = "nan";

/// Bucketing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSpec {
    /// Equal-count buckets when true, equal-width buckets when false
    #[serde(default = "default_use_quantiles")]
    pub use_quantiles: bool,

    /// Explicit lower edges of the buckets: quantile probabilities in
    /// quantile mode, raw values in fixed mode. Count must equal the label
    /// count. Defaults to edges derived from the label count.
    #[serde(default)]
    pub boundaries: Option<Vec<f64>>,

    /// Ordered low-to-high bucket labels
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
}

fn default_use_quantiles() -> bool {
    true
}

fn default_labels() -> Vec<String> {
    vec![
        "low".to_string(),
        "below-average".to_string(),
        "above-average".to_string(),
        "high".to_string(),
    ]
}

impl Default for BucketSpec {
    fn default() -> Self {
        Self {
            use_quantiles: default_use_quantiles(),
            boundaries: None,
            labels: default_labels(),
        }
    }
}

impl BucketSpec {
    /// Fixed-width variant with the default labels
    pub fn fixed_width() -> Self {
        Self {
            use_quantiles: false,
            ..Self::default()
        }
    }

    /// Validate the parameters before any row is processed
    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(AppError::Configuration {
                message: "bucket labels must not be empty".to_string(),
            });
        }

        if let Some(boundaries) = &self.boundaries {
            if boundaries.len() != self.labels.len() {
                return Err(AppError::Configuration {
                    message: format!(
                        "{} boundaries given for {} labels; counts must be equal",
                        boundaries.len(),
                        self.labels.len()
                    ),
                });
            }
            if boundaries.windows(2).any(|w| w[0] >= w[1]) {
                return Err(AppError::Configuration {
                    message: "boundaries must be strictly increasing".to_string(),
                });
            }
            if self.use_quantiles
                && boundaries.iter().any(|&b| !(0.0..=1.0).contains(&b))
            {
                return Err(AppError::Configuration {
                    message: "quantile boundaries must lie within [0, 1]".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Compute the k+1 bucket edges for the observed values
    fn edges(&self, observed: &mut Vec<f64>) -> Vec<f64> {
        let k = self.labels.len();
        observed.sort_by(|a, b| a.partial_cmp(b).expect("non-finite values filtered"));

        match (&self.boundaries, self.use_quantiles) {
            (Some(probs), true) => {
                let mut edges: Vec<f64> =
                    probs.iter().map(|&p| quantile(observed, p)).collect();
                edges.push(quantile(observed, 1.0));
                edges
            }
            (Some(values), false) => {
                // Explicit value edges leave the top bucket unbounded
                let mut edges = values.clone();
                edges.push(f64::INFINITY);
                edges
            }
            (None, true) => (0..=k)
                .map(|j| quantile(observed, j as f64 / k as f64))
                .collect(),
            (None, false) => {
                let min = observed[0];
                let max = observed[observed.len() - 1];
                let width = (max - min) / k as f64;
                (0..=k).map(|j| min + width * j as f64).collect()
            }
        }
    }
}

/// Linear-interpolated quantile of a sorted slice
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Assign a bucket label to each cell of `column`.
///
/// A value on a bucket's upper edge goes to the lower bucket; the lowest
/// bucket includes the minimum. Null, non-numeric, and out-of-range cells
/// get [`OUT_OF_RANGE_LABEL`].
pub fn bucketize(frame: &Frame, column: &str, spec: &BucketSpec) -> Result<Vec<Value>> {
    spec.validate()?;

    let numeric = frame.numeric_column(column)?;
    let mut observed: Vec<f64> = numeric
        .iter()
        .filter_map(|v| *v)
        .filter(|v| v.is_finite())
        .collect();
    if observed.is_empty() {
        return Err(AppError::EmptyColumn {
            column: column.to_string(),
        });
    }

    let edges = spec.edges(&mut observed);

    Ok(numeric
        .iter()
        .map(|cell| {
            let label = match cell {
                Some(v) if v.is_finite() => assign(*v, &edges)
                    .map(|i| spec.labels[i].as_str())
                    .unwrap_or(OUT_OF_RANGE_LABEL),
                _ => OUT_OF_RANGE_LABEL,
            };
            Value::Str(label.to_string())
        })
        .collect())
}

/// Find the bucket index for `v` given k+1 edges, ties to the lower bucket
fn assign(v: f64, edges: &[f64]) -> Option<usize> {
    if v < edges[0] {
        return None;
    }
    if v == edges[0] {
        return Some(0);
    }
    (0..edges.len() - 1).find(|&i| v <= edges[i + 1])
}

/// Derive a bucket column from `source` onto a copy of the frame
pub fn add_bucket_column(
    frame: &Frame,
    source: &str,
    target: &str,
    spec: &BucketSpec,
) -> Result<Frame> {
    let labels = bucketize(frame, source, spec)?;
    frame.with_column(target, labels)
}

/// Derive `MagBin` from the `Rank` popularity score
pub fn add_mag_bin(frame: &Frame, spec: &BucketSpec) -> Result<Frame> {
    add_bucket_column(frame, RANK_COLUMN, "MagBin", spec)
}

/// Derive `CitationBin` from `CitationCount`
pub fn add_citation_bin(frame: &Frame, spec: &BucketSpec) -> Result<Frame> {
    add_bucket_column(frame, CITATION_COUNT_COLUMN, "CitationBin", spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_frame(values: Vec<Value>) -> Frame {
        Frame::from_columns(vec![("Rank".into(), values)]).unwrap()
    }

    #[test]
    fn test_boundary_label_count_mismatch_fails_before_processing() {
        let spec = BucketSpec {
            use_quantiles: false,
            boundaries: Some(vec![0.0, 10.0, 20.0, 30.0]),
            labels: vec!["low".into(), "mid".into(), "high".into()],
        };
        let err = spec.validate().unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));

        // The same failure surfaces from bucketize without touching rows
        let frame = rank_frame(vec![Value::Int(5)]);
        let err = bucketize(&frame, "Rank", &spec).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }

    #[test]
    fn test_quantile_buckets_balance_uniform_data() {
        let values: Vec<Value> = (0..100).map(|v| Value::Int(v)).collect();
        let frame = rank_frame(values);
        let labels = bucketize(&frame, "Rank", &BucketSpec::default()).unwrap();

        let mut counts = std::collections::HashMap::new();
        for label in &labels {
            *counts.entry(label.as_str().unwrap().to_string()).or_insert(0usize) += 1;
        }
        for label in default_labels() {
            let count = counts[&label];
            assert!(
                (24..=26).contains(&count),
                "bucket {} holds {} rows",
                label,
                count
            );
        }
    }

    #[test]
    fn test_quantile_buckets_balance_random_uniform_data() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let values: Vec<Value> = (0..201)
            .map(|_| Value::Float(rng.gen_range(0.0..1.0)))
            .collect();
        let frame = rank_frame(values);
        let labels = bucketize(&frame, "Rank", &BucketSpec::default()).unwrap();

        let mut counts = std::collections::HashMap::new();
        for label in &labels {
            *counts.entry(label.as_str().unwrap().to_string()).or_insert(0usize) += 1;
        }
        // 201 rows over 4 equal-count buckets: 50 or 51 per bucket
        for label in default_labels() {
            let count = counts[&label];
            assert!((50..=51).contains(&count), "bucket {} holds {}", label, count);
        }
    }

    #[test]
    fn test_fixed_width_tie_goes_to_lower_bucket() {
        // Edges land on 0, 5, 10; the value 5 sits on an upper edge
        let frame = rank_frame(vec![
            Value::Int(0),
            Value::Int(5),
            Value::Int(10),
        ]);
        let spec = BucketSpec {
            use_quantiles: false,
            boundaries: None,
            labels: vec!["lo".into(), "hi".into()],
        };
        let labels = bucketize(&frame, "Rank", &spec).unwrap();
        assert_eq!(labels[0], Value::Str("lo".into()));
        assert_eq!(labels[1], Value::Str("lo".into()));
        assert_eq!(labels[2], Value::Str("hi".into()));
    }

    #[test]
    fn test_explicit_value_edges_unbounded_top_and_out_of_range_sentinel() {
        let frame = rank_frame(vec![
            Value::Float(-1.0),
            Value::Float(3.0),
            Value::Float(1000.0),
            Value::Null,
        ]);
        let spec = BucketSpec {
            use_quantiles: false,
            boundaries: Some(vec![0.0, 10.0]),
            labels: vec!["lo".into(), "hi".into()],
        };
        let labels = bucketize(&frame, "Rank", &spec).unwrap();
        assert_eq!(labels[0], Value::Str(OUT_OF_RANGE_LABEL.into()));
        assert_eq!(labels[1], Value::Str("lo".into()));
        assert_eq!(labels[2], Value::Str("hi".into()));
        assert_eq!(labels[3], Value::Str(OUT_OF_RANGE_LABEL.into()));
    }

    #[test]
    fn test_empty_numeric_column_fails() {
        let frame = rank_frame(vec![Value::Null, Value::Str("n/a".into())]);
        let err = bucketize(&frame, "Rank", &BucketSpec::default()).unwrap_err();
        assert!(matches!(err, AppError::EmptyColumn { .. }));
    }

    #[test]
    fn test_mag_and_citation_bins_target_their_columns() {
        let frame = Frame::from_columns(vec![
            ("Rank".into(), (0..20).map(Value::Int).collect()),
            ("CitationCount".into(), (0..20).rev().map(Value::Int).collect()),
        ])
        .unwrap();

        let derived = add_mag_bin(&frame, &BucketSpec::default()).unwrap();
        let derived = add_citation_bin(&derived, &BucketSpec::default()).unwrap();

        assert!(derived.has_column("MagBin"));
        assert!(derived.has_column("CitationBin"));
        // Row 0 has the lowest rank but the highest citation count
        assert_eq!(derived.value("MagBin", 0).unwrap(), &Value::Str("low".into()));
        assert_eq!(
            derived.value("CitationBin", 0).unwrap(),
            &Value::Str("high".into())
        );
    }

    #[test]
    fn test_quantile_probability_boundaries() {
        let values: Vec<Value> = (0..100).map(Value::Int).collect();
        let frame = rank_frame(values);
        let spec = BucketSpec {
            use_quantiles: true,
            boundaries: Some(vec![0.0, 0.5]),
            labels: vec!["bottom".into(), "top".into()],
        };
        let labels = bucketize(&frame, "Rank", &spec).unwrap();
        let bottom = labels
            .iter()
            .filter(|l| l.as_str() == Some("bottom"))
            .count();
        assert_eq!(bottom, 50);
    }
}
