//! Batch scoring integration tests
//!
//! Covers column checks, the all-or-nothing abort, CSV export and a full
//! run through the HTTP client.

use async_trait::async_trait;
use retail_predictor::client::{
    error::Result, run_batch, ApiClient, BatchRecord, ClientError, Predictor, LABEL_COLUMN,
    PROBABILITY_COLUMN,
};
use retail_predictor::models::FeatureVector;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const UPLOAD: &str = "\
CustomerID,Recency,Frequency,Monetary,AvgUnitPrice,AvgBasketValue,Country
12346,325,1,77183.6,1.04,77183.6,United Kingdom
12347,2,7,4310.0,2.64,615.71,Iceland
12348,75,4,1797.24,5.76,449.31,Finland
";

/// Predictor stub keyed on recency, recording every call
struct ScriptedPredictor {
    calls: AtomicUsize,
    seen: Mutex<Vec<FeatureVector>>,
    fail_on_recency: Option<f64>,
}

impl ScriptedPredictor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            fail_on_recency: None,
        }
    }

    fn failing_on(recency: f64) -> Self {
        Self {
            fail_on_recency: Some(recency),
            ..Self::new()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Predictor for ScriptedPredictor {
    async fn predict_one(&self, features: &FeatureVector) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(*features);

        if Some(features.recency) == self.fail_on_recency {
            return Err(ClientError::Transport {
                message: "HTTP status server error (500 Internal Server Error)".to_string(),
                status: Some(500),
            });
        }

        // Recent customers score high
        Ok(if features.recency < 30.0 { 0.8 } else { 0.1 })
    }
}

#[tokio::test]
async fn test_missing_columns_make_no_calls() {
    let predictor = ScriptedPredictor::new();
    let mut table =
        BatchRecord::from_reader("CustomerID,Recency,Frequency\n1,2,3\n".as_bytes()).unwrap();
    let before = table.clone();

    let err = run_batch(&predictor, &mut table).await.unwrap_err();

    match err {
        ClientError::MissingColumns { missing } => {
            assert_eq!(missing, vec!["Monetary", "AvgUnitPrice", "AvgBasketValue"]);
        }
        other => panic!("expected missing columns, got {:?}", other),
    }
    assert_eq!(predictor.calls(), 0);
    assert_eq!(table, before);
}

#[tokio::test]
async fn test_batch_appends_one_prediction_per_row() {
    let predictor = ScriptedPredictor::new();
    let mut table = BatchRecord::from_reader(UPLOAD.as_bytes()).unwrap();

    let results = run_batch(&predictor, &mut table).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(predictor.calls(), 3);
    assert_eq!(table.len(), 3);

    let headers = table.headers();
    assert_eq!(headers.len(), 9);
    assert_eq!(headers[7], PROBABILITY_COLUMN);
    assert_eq!(headers[8], LABEL_COLUMN);

    let labels: Vec<&str> = table.rows().iter().map(|r| r[8].as_str()).collect();
    assert_eq!(labels, vec!["Low Value", "High Value", "Low Value"]);

    // Extra columns are carried through untouched
    assert_eq!(table.rows()[1][6], "Iceland");
}

#[tokio::test]
async fn test_rows_are_scored_in_order() {
    let predictor = ScriptedPredictor::new();
    let mut table = BatchRecord::from_reader(UPLOAD.as_bytes()).unwrap();

    run_batch(&predictor, &mut table).await.unwrap();

    let seen = predictor.seen.lock().unwrap();
    let recencies: Vec<f64> = seen.iter().map(|f| f.recency).collect();
    assert_eq!(recencies, vec![325.0, 2.0, 75.0]);
    assert_eq!(seen[1], FeatureVector::new(2.0, 7.0, 4310.0, 2.64, 615.71));
}

#[tokio::test]
async fn test_failing_row_aborts_batch() {
    let predictor = ScriptedPredictor::failing_on(2.0);
    let mut table = BatchRecord::from_reader(UPLOAD.as_bytes()).unwrap();
    let before = table.clone();

    let err = run_batch(&predictor, &mut table).await.unwrap_err();

    assert!(matches!(err, ClientError::Row { row: 2, .. }));
    assert!(err.is_transport());
    assert_eq!(predictor.calls(), 2);
    assert_eq!(table, before);
}

#[tokio::test]
async fn test_empty_upload_produces_empty_export() {
    let predictor = ScriptedPredictor::new();
    let mut table = BatchRecord::from_reader(
        "Recency,Frequency,Monetary,AvgUnitPrice,AvgBasketValue\n".as_bytes(),
    )
    .unwrap();

    let results = run_batch(&predictor, &mut table).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(predictor.calls(), 0);
    assert_eq!(
        table.to_csv_string().unwrap().trim_end(),
        "Recency,Frequency,Monetary,AvgUnitPrice,AvgBasketValue,HighValueCustomerProbability,PredictedLabel"
    );
}

#[tokio::test]
async fn test_export_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("customers.csv");
    let export = dir.path().join("customer_predictions.csv");
    std::fs::write(&input, UPLOAD).unwrap();

    let predictor = ScriptedPredictor::new();
    let mut table = BatchRecord::from_path(&input).unwrap();
    run_batch(&predictor, &mut table).await.unwrap();
    table.save(&export).unwrap();

    let reloaded = BatchRecord::from_path(&export).unwrap();
    assert_eq!(reloaded, table);
    assert_eq!(reloaded.rows()[0][7], "0.1");
    assert_eq!(reloaded.rows()[1][7], "0.8");
}

#[tokio::test]
async fn test_batch_through_http_client() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/predict")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"high_value_probability": 0.64}"#)
        .expect(3)
        .create_async()
        .await;

    let client = ApiClient::new(&format!("{}/predict", server.url())).unwrap();
    let mut table = BatchRecord::from_reader(UPLOAD.as_bytes()).unwrap();

    let results = run_batch(&client, &mut table).await.unwrap();

    assert!(results.iter().all(|r| r.is_high_value()));
    assert!(table.rows().iter().all(|r| r[7] == "0.64" && r[8] == "High Value"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rescoring_an_export_keeps_one_set_of_prediction_columns() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("customer_predictions.csv");
    let predictor = ScriptedPredictor::new();

    let mut first = BatchRecord::from_reader(UPLOAD.as_bytes()).unwrap();
    run_batch(&predictor, &mut first).await.unwrap();
    first.save(&export).unwrap();

    let mut second = BatchRecord::from_path(&export).unwrap();
    run_batch(&predictor, &mut second).await.unwrap();

    assert_eq!(second.headers(), first.headers());
    assert_eq!(
        second.headers().iter().filter(|h| *h == PROBABILITY_COLUMN).count(),
        1
    );
    assert_eq!(second.rows(), first.rows());
}
