//! High value customer prediction for online retail.
//!
//! The library backs two binaries:
//! - `retail-predictor`: an axum service scoring customers with a fitted
//!   pipeline loaded once at startup.
//! - `retail-predictor-cli`: a client for single and CSV batch predictions.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;

pub use error::{AppError, Result};
