//! MagScope API Gateway
//!
//! Backend for the paper-exploration dashboard UI. Handles:
//! - Dataset catalog listing and session loading
//! - Feature derivation requests with per-session memoization
//! - Session-scoped categorical encode/decode
//! - Observability (logging, metrics, tracing)

mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use magscope_common::{
    cache::MemoCache,
    config::AppConfig,
    frame::Frame,
    metrics,
    stats::AuthorStatsMap,
};
use magscope_featurize::CodecTable;
use magscope_ingest::{load_author_stats, DatasetCatalog};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::RwLock;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use uuid::Uuid;

/// One loaded dataset with its session-scoped derivation state
pub struct Session {
    /// Catalog name the session was loaded from
    pub dataset: String,
    /// Current frame; derivations replace it with their output
    pub frame: Arc<Frame>,
    /// Fitted categorical codecs, scoped to this session only
    pub codec: CodecTable,
    /// Memoized derivation results
    pub cache: Arc<MemoCache>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<DatasetCatalog>,
    pub author_stats: Arc<AuthorStatsMap>,
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let fmt = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.observability.log_level.clone().into()),
        )
        .with_target(true);
    if config.observability.json_logging {
        fmt.json().init();
    } else {
        fmt.init();
    }

    info!("Starting MagScope API Gateway v{}", magscope_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::from((
                [0, 0, 0, 0],
                config.observability.metrics_port,
            )))
            .install()?;
        info!(port = config.observability.metrics_port, "Metrics exporter listening");
    }

    // Load reference data
    let author_stats = match &config.dataset.author_stats_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            tokio::task::spawn_blocking(move || load_author_stats(&path)).await??
        }
        None => {
            warn!("No author statistics configured; author features will fail");
            AuthorStatsMap::new()
        }
    };

    let catalog = DatasetCatalog::new(config.dataset.data_dir.clone());
    info!(data_dir = %catalog.data_dir().display(), "Dataset catalog ready");

    // Create app state
    let state = AppState {
        config: Arc::new(config.clone()),
        catalog: Arc::new(catalog),
        author_stats: Arc::new(author_stats),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration (the dashboard UI is served from elsewhere)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Dataset catalog and sessions
        .route("/datasets", get(handlers::datasets::list_datasets))
        .route("/datasets", post(handlers::datasets::create_session))
        .route("/datasets/{id}", get(handlers::datasets::get_session))
        .route("/datasets/{id}", delete(handlers::datasets::drop_session))
        .route("/datasets/{id}/rows", get(handlers::datasets::get_rows))

        // Feature derivation
        .route("/datasets/{id}/features", post(handlers::features::derive_features))

        // Categorical codec
        .route("/datasets/{id}/encode", post(handlers::codec::encode_columns))
        .route("/datasets/{id}/decode", post(handlers::codec::decode_columns));

    // Compose the app
    Router::new()
        // Health endpoints outside the versioned prefix
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            config: Arc::new(AppConfig::default()),
            catalog: Arc::new(DatasetCatalog::new(".")),
            author_stats: Arc::new(AuthorStatsMap::new()),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_listing() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/datasets")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_session_rejected_at_capacity() {
        let mut config = AppConfig::default();
        config.dataset.max_sessions = 1;
        let state = AppState {
            config: Arc::new(config),
            catalog: Arc::new(DatasetCatalog::new(".")),
            author_stats: Arc::new(AuthorStatsMap::new()),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        };
        state.sessions.write().await.insert(
            Uuid::new_v4(),
            Session {
                dataset: "sample".to_string(),
                frame: Arc::new(Frame::new()),
                codec: CodecTable::new(),
                cache: Arc::new(MemoCache::new(4)),
            },
        );

        let app = create_router(state);
        let body = serde_json::json!({ "dataset": "sample" }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/datasets")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = create_router(test_state());
        let uri = format!("/v1/datasets/{}", Uuid::new_v4());
        let response = app
            .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
