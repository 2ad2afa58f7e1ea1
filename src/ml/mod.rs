//! Scoring artifact abstraction and the fitted pipeline loaded at startup.
//!
//! The service treats the artifact as an opaque function from a
//! [`FeatureVector`](crate::models::FeatureVector) to the probability of the
//! high value class.
pub mod artifact;

pub use artifact::{
    score, ArtifactMetadata, LogisticPipeline, ScoringArtifact, StandardScaler, HIGH_VALUE_CLASS,
};
