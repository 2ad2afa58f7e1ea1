//! Shared fixtures for integration tests
//!
//! Provides a deterministic stub artifact that records how often it was
//! invoked, plus helpers for building and serving the router.

#![allow(dead_code)]

use ndarray::{array, Array2};
use retail_predictor::{
    api::{build_router, AppState},
    ml::{ArtifactMetadata, ScoringArtifact},
    models::FEATURE_ORDER,
    Result,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Canonical request body used across the suite
pub const CANONICAL_BODY: &str =
    r#"{"Recency":10,"Frequency":5,"Monetary":200,"AvgUnitPrice":20,"AvgBasketValue":50}"#;

/// Artifact returning the same probability for every input
pub struct FixedArtifact {
    probability: f64,
    calls: AtomicUsize,
    metadata: ArtifactMetadata,
}

impl FixedArtifact {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            calls: AtomicUsize::new(0),
            metadata: ArtifactMetadata {
                name: "fixed-stub".to_string(),
                version: "test".to_string(),
                features: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScoringArtifact for FixedArtifact {
    fn predict_proba(&self, _features: &Array2<f64>) -> Result<Array2<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(array![[1.0 - self.probability, self.probability]])
    }

    fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }
}

/// Router backed by `artifact`
pub fn router_with(artifact: Arc<FixedArtifact>) -> axum::Router {
    build_router(AppState::new(artifact))
}

/// Serve `artifact` on an ephemeral local port
pub async fn spawn_server(artifact: Arc<FixedArtifact>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router_with(artifact);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}
