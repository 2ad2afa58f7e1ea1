//! Client side of the prediction service: HTTP wrapper, CSV batch handling
//! and terminal rendering used by the `retail-predictor-cli` binary.
pub mod api;
pub mod batch;
pub mod error;
pub mod output;

pub use api::{ApiClient, Predictor, DEFAULT_PREDICT_URL, DEFAULT_TIMEOUT};
pub use batch::{run_batch, BatchRecord, DEFAULT_EXPORT_FILE, LABEL_COLUMN, PROBABILITY_COLUMN};
pub use error::ClientError;
