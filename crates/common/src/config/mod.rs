//! Configuration management for MagScope services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Dataset loading configuration
    pub dataset: DatasetConfig,

    /// Feature derivation configuration
    pub features: FeatureConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatasetConfig {
    /// Directory the catalog entries are resolved against.
    /// Override with APP__DATASET__DATA_DIR for mounted-disk deployments.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Path to the externally built author statistics file
    pub author_stats_path: Option<String>,

    /// Default maximum number of records parsed per load
    #[serde(default = "default_row_limit")]
    pub default_row_limit: usize,

    /// Progress is reported every this many parsed records
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,

    /// Maximum number of concurrently held dataset sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    /// Threshold for the binary author prominence feature
    #[serde(default = "default_prominence_threshold")]
    pub prominence_threshold: i64,

    /// Ordered low-to-high labels used by the bucketizer by default
    #[serde(default = "default_bin_labels")]
    pub bin_labels: Vec<String>,

    /// Memoized derivation results kept per session
    #[serde(default = "default_cache_entries")]
    pub cache_entries: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_data_dir() -> String { "./".to_string() }
fn default_row_limit() -> usize { 1000 }
fn default_progress_every() -> usize { 50 }
fn default_max_sessions() -> usize { 8 }
fn default_prominence_threshold() -> i64 { 50 }
fn default_bin_labels() -> Vec<String> {
    vec![
        "low".to_string(),
        "below-average".to_string(),
        "above-average".to_string(),
        "high".to_string(),
    ]
}
fn default_cache_entries() -> usize { 32 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 0 }
fn default_service_name() -> String { "magscope".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("dataset.data_dir", "./")?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__DATASET__DATA_DIR=/mnt/data
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
            dataset: DatasetConfig {
                data_dir: default_data_dir(),
                author_stats_path: None,
                default_row_limit: default_row_limit(),
                progress_every: default_progress_every(),
                max_sessions: default_max_sessions(),
            },
            features: FeatureConfig {
                prominence_threshold: default_prominence_threshold(),
                bin_labels: default_bin_labels(),
                cache_entries: default_cache_entries(),
            },
            observability: ObservabilityConfig {
                log_level: default_log_level(),
                json_logging: default_json_logging(),
                metrics_port: default_metrics_port(),
                service_name: default_service_name(),
            },
        }
    }
}
