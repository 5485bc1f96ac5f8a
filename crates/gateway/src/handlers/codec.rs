//! Categorical codec handlers
//!
//! Encode and decode run against the session's frame with the session's own
//! codec table, so fitted mappings never leak across datasets. Decode of a
//! column that was never fit in this session passes through; decode of a code
//! that was never fit fails.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use magscope_common::errors::{AppError, Result};
use magscope_featurize::{decode, encode};

#[derive(Debug, Deserialize, Validate)]
pub struct CodecRequest {
    /// Columns to encode or decode
    #[validate(length(min = 1))]
    pub columns: Vec<String>,
}

#[derive(Serialize)]
pub struct CodecResponse {
    pub id: Uuid,
    pub rows: usize,
    /// Columns with a fitted mapping in this session after the call
    pub fitted_columns: Vec<String>,
    pub preview: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Encode the listed categorical columns on the session frame
pub async fn encode_columns(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CodecRequest>,
) -> Result<Json<CodecResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("columns".to_string()),
    })?;

    // Encode writes the codec table, so the session stays locked throughout
    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;

    let encoded = encode(&session.frame, &request.columns, &mut session.codec)?;
    session.frame = Arc::new(encoded);

    tracing::info!(
        session_id = %id,
        columns = request.columns.len(),
        rows = session.frame.len(),
        "Encoded categorical columns"
    );

    Ok(Json(CodecResponse {
        id,
        rows: session.frame.len(),
        fitted_columns: session.codec.keys().cloned().collect(),
        preview: session.frame.to_records(0, 10),
    }))
}

/// Decode previously encoded columns on the session frame
pub async fn decode_columns(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CodecRequest>,
) -> Result<Json<CodecResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("columns".to_string()),
    })?;

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .get_mut(&id)
        .ok_or_else(|| AppError::DatasetNotFound { id: id.to_string() })?;

    let decoded = decode(&session.frame, &request.columns, &session.codec)?;
    session.frame = Arc::new(decoded);

    Ok(Json(CodecResponse {
        id,
        rows: session.frame.len(),
        fitted_columns: session.codec.keys().cloned().collect(),
        preview: session.frame.to_records(0, 10),
    }))
}
