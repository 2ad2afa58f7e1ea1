use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Scoring artifact configuration
    pub model: ModelConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: RETAIL_PREDICTOR_)
            .add_source(
                config::Environment::with_prefix("RETAIL_PREDICTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(AppError::from)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Artifact path; relative paths resolve against `base_dir`
    #[serde(default = "default_model_path")]
    pub path: PathBuf,

    /// Deployment root (defaults to the working directory)
    pub base_dir: Option<PathBuf>,
}

impl ModelConfig {
    /// Absolute location of the scoring artifact
    ///
    /// Relative paths resolve against `base_dir` when set, otherwise against
    /// the nearest ancestor of the executable's directory that holds the
    /// artifact. The working directory plays no part.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        if self.path.is_absolute() {
            return Ok(self.path.clone());
        }

        if let Some(dir) = &self.base_dir {
            return Ok(dir.join(&self.path));
        }

        let current_exe = std::env::current_exe().map_err(|e| {
            AppError::Configuration(format!("Could not locate executable: {}", e))
        })?;
        let exe_dir = current_exe.parent().ok_or_else(|| {
            AppError::Configuration("Could not find executable directory".to_string())
        })?;

        Ok(resolve_from(exe_dir, &self.path))
    }
}

/// `relative` under the nearest ancestor of `start` containing it, else under `start`
fn resolve_from(start: &Path, relative: &Path) -> PathBuf {
    start
        .ancestors()
        .map(|dir| dir.join(relative))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| start.join(relative))
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            base_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name reported in startup logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model/final_model_pipeline.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "retail-predictor".to_string()
}

fn default_true() -> bool {
    true
}
