//! Prometheus metrics for the prediction service.
//!
//! Exposes request counters, prediction outcomes and scoring latency through
//! a process-wide registry rendered at `GET /metrics`.
//!
//! # Example
//! ```no_run
//! use retail_predictor::metrics::{self, PREDICTIONS_TOTAL};
//!
//! metrics::init_metrics().unwrap();
//! PREDICTIONS_TOTAL.with_label_values(&["high_value"]).inc();
//! ```

mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{CounterVec, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "retail_predictor";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Predictions served, by derived segment
    ///
    /// Labels: segment (high_value, low_value)
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of predictions served")
            .namespace(NAMESPACE),
        &["segment"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Time spent inside the scoring artifact
    pub static ref PREDICTION_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "prediction_duration_seconds",
            "Scoring artifact invocation duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01])
    ).expect("Failed to create PREDICTION_DURATION_SECONDS metric");

    /// Requests rejected by schema validation
    ///
    /// Labels: field (or "body" when no field could be identified)
    pub static ref VALIDATION_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("validation_errors_total", "Total number of rejected prediction requests")
            .namespace(NAMESPACE),
        &["field"]
    ).expect("Failed to create VALIDATION_ERRORS_TOTAL metric");

    /// Build and artifact information
    ///
    /// Labels: version, artifact, artifact_version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build and scoring artifact information")
            .namespace(NAMESPACE),
        &["version", "artifact", "artifact_version"]
    ).expect("Failed to create BUILD_INFO metric");
}

static REGISTERED: OnceCell<()> = OnceCell::new();

fn register_all() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(VALIDATION_ERRORS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Register all collectors with the global registry
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    REGISTERED.get_or_try_init(register_all).map(|_| ())
}

/// Record which scoring artifact this process serves
pub fn set_build_info(artifact: &str, artifact_version: &str) {
    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION"), artifact, artifact_version])
        .set(1.0);
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
