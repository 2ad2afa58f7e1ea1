use crate::models::FEATURE_ORDER;
use thiserror::Error;

/// Errors surfaced by the prediction client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection failure, timeout or non-success status
    #[error("API request failed: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// Service answered successfully but without the expected field
    #[error("Unexpected response: {0}")]
    ResponseShape(String),

    /// Upload could not be parsed
    #[error("Error processing file: {0}")]
    FileFormat(String),

    /// Upload lacks one or more required columns
    #[error("CSV must contain columns: {}", FEATURE_ORDER.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Input rejected before any request was made
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Failure while scoring a specific batch row (1-based)
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<ClientError>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// True when the service could not be reached or refused the request
    pub fn is_transport(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::Row { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// HTTP status attached to a transport failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Transport { status, .. } => *status,
            ClientError::Row { source, .. } => source.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("could not connect: {}", err)
        } else {
            err.to_string()
        };

        ClientError::Transport {
            message,
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

impl From<csv::Error> for ClientError {
    fn from(err: csv::Error) -> Self {
        ClientError::FileFormat(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
