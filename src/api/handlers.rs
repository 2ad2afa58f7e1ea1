use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::{PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS, VALIDATION_ERRORS_TOTAL};
use crate::ml::score;
use crate::models::{FeatureVector, PredictionResponse, StatusResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

/// Service title, reported by the root endpoint log line and the CLI
pub const API_TITLE: &str = "High Value Customer Prediction API";

/// Static liveness marker
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse::new("Online Retail API running"))
}

/// Health check endpoint
///
/// Reports healthy whenever the process is serving; the artifact is not probed.
pub async fn health_check() -> Json<StatusResponse> {
    Json(StatusResponse::new("healthy"))
}

/// Score one customer
pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let Json(features) = payload.map_err(|rejection| {
        let err = AppError::from(rejection);
        VALIDATION_ERRORS_TOTAL
            .with_label_values(&[err.field().unwrap_or("body")])
            .inc();
        err
    })?;

    let timer = PREDICTION_DURATION_SECONDS.start_timer();
    let result = score(state.artifact.as_ref(), &features)?;
    timer.observe_duration();

    PREDICTIONS_TOTAL
        .with_label_values(&[result.segment.as_metric_label()])
        .inc();

    tracing::debug!(
        probability = result.probability,
        segment = %result.segment,
        "Prediction served"
    );

    Ok(Json(PredictionResponse::from(result)))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
