use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Column order the scoring artifact was fitted on
pub const FEATURE_ORDER: [&str; 5] = [
    "Recency",
    "Frequency",
    "Monetary",
    "AvgUnitPrice",
    "AvgBasketValue",
];

/// Probability at or above which a customer is considered high value
pub const HIGH_VALUE_THRESHOLD: f64 = 0.5;

/// RFM-style features describing a single retail customer
///
/// Field names on the wire match [`FEATURE_ORDER`]. Unknown fields are
/// rejected and every field is required.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct FeatureVector {
    /// Days since the customer's last purchase
    #[validate(range(min = 0.0))]
    pub recency: f64,

    /// Number of distinct invoices
    #[validate(range(min = 0.0))]
    pub frequency: f64,

    /// Total spend
    #[validate(range(min = 0.0))]
    pub monetary: f64,

    /// Mean unit price across purchased lines
    #[validate(range(min = 0.0))]
    pub avg_unit_price: f64,

    /// Mean invoice value
    #[validate(range(min = 0.0))]
    pub avg_basket_value: f64,
}

impl FeatureVector {
    pub fn new(
        recency: f64,
        frequency: f64,
        monetary: f64,
        avg_unit_price: f64,
        avg_basket_value: f64,
    ) -> Self {
        Self {
            recency,
            frequency,
            monetary,
            avg_unit_price,
            avg_basket_value,
        }
    }

    /// Values laid out in [`FEATURE_ORDER`]
    pub fn to_ordered(&self) -> [f64; 5] {
        [
            self.recency,
            self.frequency,
            self.monetary,
            self.avg_unit_price,
            self.avg_basket_value,
        ]
    }

    /// Build from values laid out in [`FEATURE_ORDER`]
    pub fn from_ordered(values: [f64; 5]) -> Self {
        let [recency, frequency, monetary, avg_unit_price, avg_basket_value] = values;
        Self::new(recency, frequency, monetary, avg_unit_price, avg_basket_value)
    }
}

impl Default for FeatureVector {
    /// Defaults offered by the single-customer form
    fn default() -> Self {
        Self::new(10.0, 5.0, 200.0, 20.0, 50.0)
    }
}

/// Customer segment derived from a probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSegment {
    HighValue,
    LowValue,
}

impl CustomerSegment {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_VALUE_THRESHOLD {
            CustomerSegment::HighValue
        } else {
            CustomerSegment::LowValue
        }
    }

    /// Short label written to exported tables
    pub fn label(&self) -> &'static str {
        match self {
            CustomerSegment::HighValue => "High Value",
            CustomerSegment::LowValue => "Low Value",
        }
    }

    /// Label shown for a single-customer prediction
    pub fn customer_label(&self) -> &'static str {
        match self {
            CustomerSegment::HighValue => "High Value Customer",
            CustomerSegment::LowValue => "Low Value Customer",
        }
    }

    pub fn as_metric_label(&self) -> &'static str {
        match self {
            CustomerSegment::HighValue => "high_value",
            CustomerSegment::LowValue => "low_value",
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Probability of the high value class plus its derived segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub probability: f64,
    pub segment: CustomerSegment,
}

impl PredictionResult {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            segment: CustomerSegment::from_probability(probability),
        }
    }

    pub fn is_high_value(&self) -> bool {
        self.segment == CustomerSegment::HighValue
    }
}

/// Wire body returned by `POST /predict`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub high_value_probability: f64,
}

impl From<PredictionResult> for PredictionResponse {
    fn from(result: PredictionResult) -> Self {
        Self {
            high_value_probability: result.probability,
        }
    }
}

/// Wire body returned by `GET /` and `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}
