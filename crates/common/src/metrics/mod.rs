//! Metrics and observability utilities
//!
//! Prometheus metrics for dataset loading and feature derivation, with
//! standardized naming conventions. Every derivation is individually timed
//! into a per-feature histogram.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all MagScope metrics
pub const METRICS_PREFIX: &str = "magscope";

/// Histogram buckets for derivation latency (in seconds).
/// One-hot expansion on large datasets dominates the upper buckets.
pub const DERIVATION_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
    30.00,  // 30s
    120.0,  // 2m
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Loading metrics
    describe_counter!(
        format!("{}_datasets_loaded_total", METRICS_PREFIX),
        Unit::Count,
        "Total dataset load operations"
    );

    describe_counter!(
        format!("{}_records_parsed_total", METRICS_PREFIX),
        Unit::Count,
        "Total JSONL records parsed"
    );

    describe_histogram!(
        format!("{}_load_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Dataset load latency in seconds"
    );

    // Derivation metrics
    describe_counter!(
        format!("{}_derivations_total", METRICS_PREFIX),
        Unit::Count,
        "Total feature derivations"
    );

    describe_histogram!(
        format!("{}_derivation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Feature derivation latency in seconds"
    );

    // Session metrics
    describe_gauge!(
        format!("{}_sessions_active", METRICS_PREFIX),
        Unit::Count,
        "Currently held dataset sessions"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to time a single feature derivation
pub struct DerivationTimer {
    start: Instant,
    feature: String,
}

impl DerivationTimer {
    /// Start timing a derivation
    pub fn start(feature: &str) -> Self {
        Self {
            start: Instant::now(),
            feature: feature.to_string(),
        }
    }

    /// Record derivation completion
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed().as_secs_f64();
        let status = if success { "success" } else { "error" };

        counter!(
            format!("{}_derivations_total", METRICS_PREFIX),
            "feature" => self.feature.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_derivation_duration_seconds", METRICS_PREFIX),
            "feature" => self.feature
        )
        .record(duration);
    }
}

/// Helper to record dataset load metrics
pub fn record_load(duration_secs: f64, records: usize, dataset: &str) {
    counter!(
        format!("{}_datasets_loaded_total", METRICS_PREFIX),
        "dataset" => dataset.to_string()
    )
    .increment(1);

    counter!(
        format!("{}_records_parsed_total", METRICS_PREFIX),
        "dataset" => dataset.to_string()
    )
    .increment(records as u64);

    histogram!(
        format!("{}_load_duration_seconds", METRICS_PREFIX),
        "dataset" => dataset.to_string()
    )
    .record(duration_secs);
}

/// Helper to record the number of live sessions
pub fn record_sessions(count: usize) {
    gauge!(format!("{}_sessions_active", METRICS_PREFIX)).set(count as f64);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in DERIVATION_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_derivation_timer() {
        let timer = DerivationTimer::start("mag_bin");
        std::thread::sleep(std::time::Duration::from_millis(5));
        timer.finish(true);
        // Just verify it runs without panic
    }
}
