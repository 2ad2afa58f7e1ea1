use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Request body failed schema or type checks
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        status: StatusCode,
    },

    /// Scoring artifact could not be read or is inconsistent
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    /// Scoring artifact failed while producing a probability
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Configuration could not be loaded or resolved
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { status, .. } => *status,
            AppError::ArtifactLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::ArtifactLoad(_) => "ARTIFACT_LOAD_ERROR",
            AppError::Scoring(_) => "SCORING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Offending request field, when known
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if status.is_client_error() {
            tracing::warn!(
                error_code = error_code,
                status_code = status.as_u16(),
                field = self.field(),
                message = %message,
                "Request rejected"
            );
        } else {
            tracing::error!(
                error_code = error_code,
                status_code = status.as_u16(),
                message = %message,
                "Request error"
            );
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "status": status.as_u16(),
                "field": self.field(),
            }
        }));

        (status, body).into_response()
    }
}

static FIELD_IN_BACKTICKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:missing|unknown) field `([^`]+)`").expect("valid field regex")
});

static FIELD_PATH_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"target type: ([A-Za-z_][A-Za-z0-9_]*): ").expect("valid path regex")
});

/// Pull the offending field name out of a serde/axum rejection message
pub fn field_from_message(message: &str) -> Option<String> {
    FIELD_IN_BACKTICKS
        .captures(message)
        .or_else(|| FIELD_PATH_PREFIX.captures(message))
        .map(|caps| caps[1].to_string())
}

/// Conversion from axum's JSON extractor rejection
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        AppError::Validation {
            field: field_from_message(&message),
            status: rejection.status(),
            message,
        }
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
