//! Dataset session handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{AppState, Session};
use magscope_common::{
    cache::MemoCache,
    errors::{AppError, Result},
    metrics::record_sessions,
};
use magscope_featurize::CodecTable;
use magscope_ingest::{load_dataset, DatasetEntry, LoadOptions};

/// Request to load a catalog dataset into a new session
#[derive(Debug, Deserialize, Validate)]
pub struct LoadDatasetRequest {
    /// Catalog entry name (`sample`, `250k`, `full`)
    pub dataset: String,

    /// Maximum number of records to parse; falls back to the configured
    /// default
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}

/// Shape summary returned for a session
#[derive(Serialize)]
pub struct DatasetSummary {
    pub id: Uuid,
    pub dataset: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub datasets: Vec<DatasetEntry>,
}

#[derive(Debug, Deserialize)]
pub struct RowsQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page_size")]
    pub limit: usize,
}

fn default_page_size() -> usize {
    50
}

#[derive(Serialize)]
pub struct RowsResponse {
    pub offset: usize,
    pub total: usize,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

fn session_limit_error(max_sessions: usize) -> AppError {
    AppError::Validation {
        message: format!(
            "session limit of {} reached; drop a dataset first",
            max_sessions
        ),
        field: None,
    }
}

fn summary(id: Uuid, session: &Session) -> DatasetSummary {
    DatasetSummary {
        id,
        dataset: session.dataset.clone(),
        rows: session.frame.len(),
        columns: session.frame.names().to_vec(),
    }
}

/// List the selectable datasets
pub async fn list_datasets(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        datasets: state.catalog.entries().to_vec(),
    })
}

/// Load a dataset and open a session for it
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<LoadDatasetRequest>,
) -> Result<(StatusCode, Json<DatasetSummary>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    {
        // Fast-fail before paying for the load; re-checked at insert time
        let sessions = state.sessions.read().await;
        if sessions.len() >= state.config.dataset.max_sessions {
            return Err(session_limit_error(state.config.dataset.max_sessions));
        }
    }

    let path = state.catalog.resolve(&request.dataset)?;
    let options = LoadOptions {
        limit: request.limit.unwrap_or(state.config.dataset.default_row_limit),
        progress_every: state.config.dataset.progress_every,
    };

    let dataset = request.dataset.clone();
    let frame = tokio::task::spawn_blocking(move || {
        load_dataset(&path, &options, |fraction| {
            tracing::debug!(
                dataset = %dataset,
                percent = (fraction * 100.0) as u32,
                "Parsing dataset"
            );
        })
    })
    .await
    .map_err(|e| AppError::Internal {
        message: format!("dataset load task failed: {}", e),
    })??;

    let id = Uuid::new_v4();
    let session = Session {
        dataset: request.dataset.clone(),
        frame: Arc::new(frame),
        codec: CodecTable::new(),
        cache: Arc::new(MemoCache::new(state.config.features.cache_entries)),
    };
    let response = summary(id, &session);

    let mut sessions = state.sessions.write().await;
    // The early check ran under a read lock; a concurrent create may have
    // taken the last slot since
    if sessions.len() >= state.config.dataset.max_sessions {
        return Err(session_limit_error(state.config.dataset.max_sessions));
    }
    sessions.insert(id, session);
    record_sessions(sessions.len());

    tracing::info!(
        session_id = %id,
        dataset = %request.dataset,
        rows = response.rows,
        "Dataset session opened"
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a session's shape summary
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DatasetSummary>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;
    Ok(Json(summary(id, session)))
}

/// Page through a session's rows for table rendering
pub async fn get_rows(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RowsQuery>,
) -> Result<Json<RowsResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;

    Ok(Json(RowsResponse {
        offset: query.offset,
        total: session.frame.len(),
        rows: session.frame.to_records(query.offset, query.limit),
    }))
}

/// Drop a session
pub async fn drop_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let mut sessions = state.sessions.write().await;
    sessions
        .remove(&id)
        .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;
    record_sessions(sessions.len());

    tracing::info!(session_id = %id, "Dataset session dropped");
    Ok(StatusCode::NO_CONTENT)
}
