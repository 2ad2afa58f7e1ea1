use crate::client::error::{ClientError, Result};
use crate::models::{FeatureVector, StatusResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

/// Default endpoint scored by the CLI
pub const DEFAULT_PREDICT_URL: &str = "http://localhost:8000/predict";

/// Bound on each prediction call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Field the service reports the probability under
pub const PROBABILITY_FIELD: &str = "high_value_probability";

/// Something that turns a feature vector into a probability
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Score a single customer
    async fn predict_one(&self, features: &FeatureVector) -> Result<f64>;

    /// Score customers one call at a time, stopping at the first failure
    async fn predict(&self, payloads: &[FeatureVector]) -> Result<Vec<f64>> {
        let mut probabilities = Vec::with_capacity(payloads.len());
        for (i, features) in payloads.iter().enumerate() {
            let probability = self.predict_one(features).await.map_err(|e| ClientError::Row {
                row: i + 1,
                source: Box::new(e),
            })?;
            probabilities.push(probability);
        }
        Ok(probabilities)
    }
}

/// HTTP client for the prediction service
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    predict_url: Url,
}

impl ApiClient {
    /// Create a client for `predict_url` with the default timeout
    pub fn new(predict_url: &str) -> Result<Self> {
        Self::with_timeout(predict_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(predict_url: &str, timeout: Duration) -> Result<Self> {
        let predict_url = Url::parse(predict_url).map_err(|e| {
            ClientError::Validation(format!("invalid service URL '{}': {}", predict_url, e))
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            predict_url,
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    /// POST one feature vector and return the reported probability
    pub async fn call_api(&self, features: &FeatureVector) -> Result<f64> {
        tracing::debug!(url = %self.predict_url, ?features, "Calling prediction service");

        let response = self
            .client
            .post(self.predict_url.clone())
            .json(features)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        extract_probability(&body)
    }

    /// GET the service health endpoint next to the prediction route
    pub async fn health(&self) -> Result<StatusResponse> {
        let url = self
            .predict_url
            .join("health")
            .map_err(|e| ClientError::Validation(format!("invalid health URL: {}", e)))?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        serde_json::from_str(&body)
            .map_err(|_| ClientError::ResponseShape(format!("Unexpected Response: {}", body)))
    }
}

#[async_trait]
impl Predictor for ApiClient {
    async fn predict_one(&self, features: &FeatureVector) -> Result<f64> {
        self.call_api(features).await
    }
}

/// Read the probability out of a prediction response body
pub fn extract_probability(body: &str) -> Result<f64> {
    let unexpected = || ClientError::ResponseShape(format!("Unexpected Response: {}", body));

    let value: serde_json::Value = serde_json::from_str(body).map_err(|_| unexpected())?;
    value
        .get(PROBABILITY_FIELD)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(unexpected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_probability() {
        assert_eq!(
            extract_probability(r#"{"high_value_probability": 0.73}"#).unwrap(),
            0.73
        );
    }

    #[test]
    fn test_extract_probability_missing_field() {
        let err = extract_probability(r#"{"HighValueCustomerProbability": 0.73}"#).unwrap_err();
        assert!(matches!(err, ClientError::ResponseShape(_)));
    }

    #[test]
    fn test_extract_probability_not_json() {
        let err = extract_probability("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ClientError::ResponseShape(_)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = ApiClient::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[test]
    fn test_health_url_sits_next_to_predict() {
        let client = ApiClient::new("https://example.com/api/predict").unwrap();
        assert_eq!(
            client.predict_url().join("health").unwrap().as_str(),
            "https://example.com/api/health"
        );
    }
}
