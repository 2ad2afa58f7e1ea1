use crate::client::api::Predictor;
use crate::client::error::{ClientError, Result};
use crate::models::{FeatureVector, PredictionResult, FEATURE_ORDER};
use std::io::{Read, Write};
use std::path::Path;

/// Column appended with the service probability
pub const PROBABILITY_COLUMN: &str = "HighValueCustomerProbability";

/// Column appended with the derived label
pub const LABEL_COLUMN: &str = "PredictedLabel";

/// Default export file name
pub const DEFAULT_EXPORT_FILE: &str = "customer_predictions.csv";

/// Tabular upload, optionally augmented with predictions
///
/// Cells are kept as the original text so that extra columns round-trip
/// unchanged into the export.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BatchRecord {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Parse comma-separated input with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ClientError::FileFormat("file has no header row".to_string()));
        }

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<std::result::Result<Vec<Vec<String>>, csv::Error>>()?;

        Ok(Self { headers, rows })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            ClientError::FileFormat(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows
    pub fn preview(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Required feature columns absent from the header
    pub fn missing_columns(&self) -> Vec<String> {
        FEATURE_ORDER
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Fail unless every required feature column is present
    pub fn check_columns(&self) -> Result<()> {
        let missing = self.missing_columns();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ClientError::MissingColumns { missing })
        }
    }

    /// One feature vector per row, read from the required columns by name
    pub fn feature_vectors(&self) -> Result<Vec<FeatureVector>> {
        self.check_columns()?;

        let mut indices = [0usize; 5];
        for (slot, name) in indices.iter_mut().zip(FEATURE_ORDER) {
            *slot = self
                .column_index(name)
                .ok_or_else(|| ClientError::MissingColumns {
                    missing: vec![name.to_string()],
                })?;
        }

        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| -> Result<FeatureVector> {
                let mut values = [0.0f64; 5];
                for ((value, &col), name) in values.iter_mut().zip(&indices).zip(FEATURE_ORDER) {
                    let cell = row.get(col).map(String::as_str).unwrap_or("");
                    *value = parse_cell(cell.trim()).ok_or_else(|| {
                        ClientError::FileFormat(format!(
                            "row {}: column {} is not a number: '{}'",
                            row_idx + 1,
                            name,
                            cell
                        ))
                    })?;
                }
                Ok(FeatureVector::from_ordered(values))
            })
            .collect()
    }

    /// Write probability and label columns, one value per row
    ///
    /// Columns already present (a re-uploaded export) are overwritten in
    /// place; otherwise they are appended.
    pub fn append_predictions(&mut self, results: &[PredictionResult]) -> Result<()> {
        if results.len() != self.rows.len() {
            return Err(ClientError::Validation(format!(
                "{} predictions for {} rows",
                results.len(),
                self.rows.len()
            )));
        }

        let probability_col = self.column_or_insert(PROBABILITY_COLUMN);
        let label_col = self.column_or_insert(LABEL_COLUMN);
        for (row, result) in self.rows.iter_mut().zip(results) {
            set_cell(row, probability_col, result.probability.to_string());
            set_cell(row, label_col, result.segment.label().to_string());
        }
        Ok(())
    }

    fn column_or_insert(&mut self, name: &str) -> usize {
        self.column_index(name).unwrap_or_else(|| {
            self.headers.push(name.to_string());
            self.headers.len() - 1
        })
    }

    /// Write the table as comma-separated text with a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ClientError::FileFormat(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

fn set_cell(row: &mut Vec<String>, col: usize, value: String) {
    if row.len() <= col {
        row.resize(col + 1, String::new());
    }
    row[col] = value;
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Score every row of `table` and append the results
///
/// Columns are checked before any call is made. Rows are scored one call at
/// a time in order; the first failing row aborts the batch and leaves the
/// table unchanged.
pub async fn run_batch<P>(predictor: &P, table: &mut BatchRecord) -> Result<Vec<PredictionResult>>
where
    P: Predictor + ?Sized,
{
    let payloads = table.feature_vectors()?;

    tracing::info!(rows = payloads.len(), "Running batch prediction");
    let probabilities = predictor.predict(&payloads).await?;

    let results: Vec<PredictionResult> = probabilities
        .into_iter()
        .map(PredictionResult::new)
        .collect();
    table.append_predictions(&results)?;

    Ok(results)
}
