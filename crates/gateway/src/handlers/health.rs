//! Health check handlers

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub data_dir: CheckResult,
    pub author_stats: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: magscope_common::VERSION.to_string(),
    })
}

/// Readiness probe - checks the dataset directory and reference data
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let data_dir = state.catalog.data_dir();
    let dir_check = if data_dir.is_dir() {
        CheckResult {
            status: "up".to_string(),
            error: None,
        }
    } else {
        CheckResult {
            status: "down".to_string(),
            error: Some(format!("{} is not a directory", data_dir.display())),
        }
    };

    let stats_check = if state.author_stats.is_empty() {
        CheckResult {
            status: "degraded".to_string(),
            error: Some("author statistics not loaded; author features will fail".to_string()),
        }
    } else {
        CheckResult {
            status: "up".to_string(),
            error: None,
        }
    };

    let all_healthy = dir_check.status == "up" && stats_check.status == "up";

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            data_dir: dir_check,
            author_stats: stats_check,
        },
    })
}
