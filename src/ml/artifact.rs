use crate::error::{AppError, Result};
use crate::models::{FeatureVector, PredictionResult, FEATURE_ORDER};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Index of the "high value" class in `predict_proba` output
pub const HIGH_VALUE_CLASS: usize = 1;

/// Trait for fitted scoring artifacts
///
/// Implementations are immutable once constructed and shared read-only
/// across requests.
pub trait ScoringArtifact: Send + Sync {
    /// Class probabilities, one row per sample and one column per class
    /// (`[low value, high value]`). Input columns follow [`FEATURE_ORDER`].
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Descriptive metadata
    fn metadata(&self) -> &ArtifactMetadata;
}

/// Score one feature vector against an artifact
pub fn score(artifact: &dyn ScoringArtifact, features: &FeatureVector) -> Result<PredictionResult> {
    let row = Array2::from_shape_vec((1, FEATURE_ORDER.len()), features.to_ordered().to_vec())
        .map_err(|e| AppError::Scoring(format!("Failed to build input row: {}", e)))?;

    let proba = artifact.predict_proba(&row)?;
    let probability = proba
        .get((0, HIGH_VALUE_CLASS))
        .copied()
        .ok_or_else(|| {
            AppError::Scoring(format!(
                "Artifact returned shape {:?}, expected (1, 2)",
                proba.shape()
            ))
        })?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(AppError::Scoring(format!(
            "Artifact returned out-of-range probability {}",
            probability
        )));
    }

    Ok(PredictionResult::new(probability))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub name: String,
    pub version: String,
    /// Feature names in fitted column order
    pub features: Vec<String>,
}

/// Standardization step fitted alongside the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mean = ArrayView1::from(&self.mean[..]).insert_axis(Axis(0));
        let scale = ArrayView1::from(&self.scale[..]).insert_axis(Axis(0));
        (features - &mean) / &scale
    }
}

/// Fitted scaler + logistic regression pipeline
///
/// Serialized as JSON:
///
/// ```json
/// {
///   "name": "final_model_pipeline",
///   "version": "1.0",
///   "features": ["Recency", "Frequency", "Monetary", "AvgUnitPrice", "AvgBasketValue"],
///   "scaler": { "mean": [..], "scale": [..] },
///   "coefficients": [..],
///   "intercept": -0.4
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticPipeline {
    #[serde(flatten)]
    metadata: ArtifactMetadata,
    scaler: StandardScaler,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticPipeline {
    pub fn new(
        metadata: ArtifactMetadata,
        scaler: StandardScaler,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self> {
        let pipeline = Self {
            metadata,
            scaler,
            coefficients,
            intercept,
        };
        pipeline.check()?;
        Ok(pipeline)
    }

    /// Load a pipeline from a JSON artifact file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ArtifactLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw).map_err(|e| match e {
            AppError::ArtifactLoad(msg) => {
                AppError::ArtifactLoad(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let pipeline: LogisticPipeline = serde_json::from_str(raw)
            .map_err(|e| AppError::ArtifactLoad(format!("Malformed artifact: {}", e)))?;
        pipeline.check()?;
        Ok(pipeline)
    }

    fn check(&self) -> Result<()> {
        let expected: Vec<&str> = FEATURE_ORDER.to_vec();
        let actual: Vec<&str> = self.metadata.features.iter().map(String::as_str).collect();
        if actual != expected {
            return Err(AppError::ArtifactLoad(format!(
                "Artifact fitted on columns {:?}, expected {:?}",
                actual, expected
            )));
        }

        let n = FEATURE_ORDER.len();
        for (name, len) in [
            ("scaler.mean", self.scaler.mean.len()),
            ("scaler.scale", self.scaler.scale.len()),
            ("coefficients", self.coefficients.len()),
        ] {
            if len != n {
                return Err(AppError::ArtifactLoad(format!(
                    "{} has {} entries, expected {}",
                    name, len, n
                )));
            }
        }

        if self.scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(AppError::ArtifactLoad(
                "scaler.scale must be finite and non-zero".to_string(),
            ));
        }

        let params_finite = self.scaler.mean.iter().all(|v| v.is_finite())
            && self.coefficients.iter().all(|v| v.is_finite())
            && self.intercept.is_finite();
        if !params_finite {
            return Err(AppError::ArtifactLoad(
                "Artifact parameters must be finite".to_string(),
            ));
        }

        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ScoringArtifact for LogisticPipeline {
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.coefficients.len() {
            return Err(AppError::Scoring(format!(
                "Expected {} feature columns, got {}",
                self.coefficients.len(),
                features.ncols()
            )));
        }

        let scaled = self.scaler.transform(features);
        let logits = scaled.dot(&ArrayView1::from(&self.coefficients[..])) + self.intercept;

        let mut proba = Array2::zeros((features.nrows(), 2));
        for (i, z) in logits.iter().enumerate() {
            let p = sigmoid(*z);
            proba[[i, 0]] = 1.0 - p;
            proba[[i, HIGH_VALUE_CLASS]] = p;
        }

        Ok(proba)
    }

    fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn pipeline() -> LogisticPipeline {
        LogisticPipeline::new(
            ArtifactMetadata {
                name: "test".to_string(),
                version: "1.0".to_string(),
                features: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            },
            StandardScaler {
                mean: vec![90.0, 4.0, 1500.0, 3.0, 350.0],
                scale: vec![100.0, 7.0, 5000.0, 4.0, 300.0],
            },
            vec![-1.2, 1.8, 2.1, 0.1, 0.6],
            -0.4,
        )
        .unwrap()
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let proba = pipeline()
            .predict_proba(&array![[10.0, 5.0, 200.0, 20.0, 50.0]])
            .unwrap();
        assert_eq!(proba.shape(), &[1, 2]);
        assert!((proba[[0, 0]] + proba[[0, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_is_deterministic_and_bounded() {
        let artifact = pipeline();
        let features = FeatureVector::new(10.0, 5.0, 200.0, 20.0, 50.0);

        let first = score(&artifact, &features).unwrap();
        let second = score(&artifact, &features).unwrap();

        assert_eq!(first.probability, second.probability);
        assert!((0.0..=1.0).contains(&first.probability));
    }

    #[test]
    fn test_extreme_inputs_stay_bounded() {
        let artifact = pipeline();
        for features in [
            FeatureVector::new(0.0, 0.0, 0.0, 0.0, 0.0),
            FeatureVector::new(0.0, 1e9, 1e12, 1e6, 1e9),
            FeatureVector::new(1e9, 0.0, 0.0, 0.0, 0.0),
        ] {
            let result = score(&artifact, &features).unwrap();
            assert!((0.0..=1.0).contains(&result.probability));
        }
    }

    #[test]
    fn test_frequent_big_spender_scores_high() {
        let artifact = pipeline();
        let loyal = score(&artifact, &FeatureVector::new(2.0, 40.0, 20000.0, 3.0, 500.0)).unwrap();
        let lapsed = score(&artifact, &FeatureVector::new(300.0, 1.0, 15.0, 3.0, 15.0)).unwrap();

        assert!(loyal.is_high_value());
        assert!(!lapsed.is_high_value());
    }

    #[test]
    fn test_rejects_wrong_feature_order() {
        let mut raw = serde_json::to_value(pipeline()).unwrap();
        raw["features"] = serde_json::json!([
            "Frequency", "Recency", "Monetary", "AvgUnitPrice", "AvgBasketValue"
        ]);

        let err = LogisticPipeline::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, AppError::ArtifactLoad(_)));
    }

    #[test]
    fn test_rejects_zero_scale() {
        let mut raw = serde_json::to_value(pipeline()).unwrap();
        raw["scaler"]["scale"] = serde_json::json!([1.0, 0.0, 1.0, 1.0, 1.0]);

        let err = LogisticPipeline::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, AppError::ArtifactLoad(_)));
    }

    #[test]
    fn test_rejects_six_feature_artifact() {
        let mut raw = serde_json::to_value(pipeline()).unwrap();
        raw["features"] = serde_json::json!([
            "Recency", "Frequency", "Monetary", "AvgUnitPrice", "MonetaryValue", "AvgBasketValue"
        ]);

        assert!(LogisticPipeline::from_json(&raw.to_string()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = LogisticPipeline::load("/nonexistent/final_model_pipeline.json").unwrap_err();
        assert!(matches!(err, AppError::ArtifactLoad(_)));
    }
}
