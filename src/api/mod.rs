pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::ScoringArtifact;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
///
/// Holds the scoring artifact loaded at startup. The artifact is never
/// replaced for the lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    pub artifact: Arc<dyn ScoringArtifact>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(artifact: Arc<dyn ScoringArtifact>) -> Self {
        Self {
            artifact,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
