//! Feature derivation handlers
//!
//! Applies requested derivations to a session's frame in order. Results are
//! memoized per session, keyed by the input frame's content hash plus the
//! derivation parameters, so repeated UI interactions do not recompute. A
//! failing derivation aborts the whole request and leaves the session frame
//! untouched.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;
use magscope_common::{
    cache::MemoCache,
    errors::{AppError, Result},
    frame::Frame,
    metrics::DerivationTimer,
    stats::AuthorStatsMap,
    AppConfig,
};
use magscope_featurize as featurize;
use magscope_featurize::BucketSpec;

/// One requested derivation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum FeatureRequest {
    /// Detect the abstract language into `Language`
    Language,
    /// Binary author prominence flag; threshold falls back to the configured
    /// default
    AuthorProminence { threshold: Option<i64> },
    /// Bucket the `Rank` popularity score into `MagBin`
    MagBin { spec: Option<BucketSpec> },
    /// Bucket `CitationCount` into `CitationBin`
    CitationBin { spec: Option<BucketSpec> },
    /// Dense rank of author citation sums into `AuthorRank`
    AuthorRank,
    /// Dense rank of grouped citation sums into `<column>Rank`
    GroupRank { column: String },
    /// Expand author identifier columns into indicator columns
    OneHotAuthors,
}

impl FeatureRequest {
    fn name(&self) -> &'static str {
        match self {
            FeatureRequest::Language => "language",
            FeatureRequest::AuthorProminence { .. } => "author_prominence",
            FeatureRequest::MagBin { .. } => "mag_bin",
            FeatureRequest::CitationBin { .. } => "citation_bin",
            FeatureRequest::AuthorRank => "author_rank",
            FeatureRequest::GroupRank { .. } => "group_rank",
            FeatureRequest::OneHotAuthors => "one_hot_authors",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeriveRequest {
    pub features: Vec<FeatureRequest>,

    /// Rows of the derived frame echoed back for preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    10
}

#[derive(Serialize)]
pub struct DeriveResponse {
    pub id: Uuid,
    pub rows: usize,
    pub columns: Vec<String>,
    pub preview: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Default bucket spec carrying the configured labels
fn configured_spec(config: &AppConfig) -> BucketSpec {
    BucketSpec {
        labels: config.features.bin_labels.clone(),
        ..BucketSpec::default()
    }
}

fn apply(
    frame: &Frame,
    feature: &FeatureRequest,
    stats: &AuthorStatsMap,
    config: &AppConfig,
) -> Result<Frame> {
    match feature {
        FeatureRequest::Language => featurize::add_language(frame),
        FeatureRequest::AuthorProminence { threshold } => featurize::add_author_prominence(
            frame,
            stats,
            threshold.unwrap_or(config.features.prominence_threshold),
        ),
        FeatureRequest::MagBin { spec } => featurize::add_mag_bin(
            frame,
            spec.as_ref().unwrap_or(&configured_spec(config)),
        ),
        FeatureRequest::CitationBin { spec } => featurize::add_citation_bin(
            frame,
            spec.as_ref().unwrap_or(&configured_spec(config)),
        ),
        FeatureRequest::AuthorRank => featurize::add_author_rank(frame, stats),
        FeatureRequest::GroupRank { column } => featurize::add_group_rank(frame, column),
        FeatureRequest::OneHotAuthors => Ok(featurize::one_hot_encode_authors(frame)),
    }
}

/// Derive the requested features onto the session frame
pub async fn derive_features(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DeriveRequest>,
) -> Result<Json<DeriveResponse>> {
    if request.features.is_empty() {
        return Err(AppError::Validation {
            message: "at least one feature must be requested".to_string(),
            field: Some("features".to_string()),
        });
    }

    // Snapshot the session so derivation runs without holding the lock
    let (mut frame, cache) = {
        let sessions = state.sessions.read().await;
        let session = sessions
            .get(&id)
            .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;
        (session.frame.clone(), session.cache.clone())
    };

    for feature in &request.features {
        let key = MemoCache::key(&frame, feature.name(), feature);
        if let Some(hit) = cache.get(&key).await {
            frame = hit;
            continue;
        }

        let timer = DerivationTimer::start(feature.name());
        let derived = apply(&frame, feature, &state.author_stats, &state.config);
        timer.finish(derived.is_ok());

        let derived = Arc::new(derived?);
        cache.insert(key, derived.clone()).await;
        frame = derived;
    }

    let response = DeriveResponse {
        id,
        rows: frame.len(),
        columns: frame.names().to_vec(),
        preview: frame.to_records(0, request.preview_rows),
    };

    // Publish the derived frame back to the session for the rows endpoint
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;
    session.frame = frame;

    tracing::info!(
        session_id = %id,
        features = request.features.len(),
        columns = response.columns.len(),
        "Derived features"
    );

    Ok(Json(response))
}
