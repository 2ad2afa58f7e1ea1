use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use retail_predictor::api::handlers::API_TITLE;
use retail_predictor::client::{
    self, output, ApiClient, BatchRecord, ClientError, Predictor, DEFAULT_EXPORT_FILE,
    DEFAULT_PREDICT_URL,
};
use retail_predictor::models::{FeatureVector, PredictionResult};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use validator::Validate;

#[derive(Parser)]
#[command(name = "retail-predictor-cli")]
#[command(about = "High Value Customer Prediction CLI", long_about = None)]
struct Cli {
    /// Prediction endpoint of the service
    #[arg(short, long, env = "RETAIL_PREDICTOR_URL", default_value = DEFAULT_PREDICT_URL)]
    url: String,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "10")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict a single customer
    Single {
        /// Prompt for each field, offering the defaults
        #[arg(short, long)]
        interactive: bool,

        /// Recency (days)
        #[arg(long, default_value = "10", allow_negative_numbers = true)]
        recency: f64,

        #[arg(long, default_value = "5", allow_negative_numbers = true)]
        frequency: f64,

        #[arg(long, default_value = "200", allow_negative_numbers = true)]
        monetary: f64,

        /// Average unit price
        #[arg(long, default_value = "20", allow_negative_numbers = true)]
        avg_unit_price: f64,

        /// Average basket value
        #[arg(long, default_value = "50", allow_negative_numbers = true)]
        avg_basket_value: f64,
    },

    /// Score every row of a CSV file
    Batch {
        #[arg(value_name = "CSV_FILE")]
        input: PathBuf,

        /// Where to write the augmented table
        #[arg(short, long, default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,

        /// Rows shown before confirmation
        #[arg(short, long, default_value = "5")]
        preview_rows: usize,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check server health
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retail_predictor=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let api = match ApiClient::with_timeout(&cli.url, Duration::from_secs(cli.timeout_secs)) {
        Ok(api) => api,
        Err(e) => {
            output::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Single {
            interactive,
            recency,
            frequency,
            monetary,
            avg_unit_price,
            avg_basket_value,
        } => {
            let features = if interactive {
                match prompt_features() {
                    Ok(features) => features,
                    Err(e) => {
                        output::error(&format!("Input aborted: {}", e));
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                FeatureVector::new(recency, frequency, monetary, avg_unit_price, avg_basket_value)
            };
            single(&api, features).await
        }

        Commands::Batch {
            input,
            output: export,
            preview_rows,
            yes,
        } => batch(&api, &input, &export, preview_rows, yes).await,

        Commands::Health => health(&api).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Single-customer form with defaults and a non-negative constraint
fn prompt_features() -> dialoguer::Result<FeatureVector> {
    let theme = ColorfulTheme::default();
    let defaults = FeatureVector::default().to_ordered();
    let prompts = [
        "Recency (days)",
        "Frequency",
        "Monetary",
        "Average Unit Price",
        "Average Basket Value",
    ];

    let mut values = [0.0f64; 5];
    for ((value, prompt), default) in values.iter_mut().zip(prompts).zip(defaults) {
        *value = Input::with_theme(&theme)
            .with_prompt(prompt)
            .default(default)
            .validate_with(|v: &f64| {
                if v.is_finite() && *v >= 0.0 {
                    Ok(())
                } else {
                    Err("must be a non-negative number")
                }
            })
            .interact_text()?;
    }

    Ok(FeatureVector::from_ordered(values))
}

async fn single(api: &ApiClient, features: FeatureVector) -> Result<(), ClientError> {
    features.validate()?;

    output::section("Single Customer Prediction");
    let probability = api.call_api(&features).await?;
    let result = PredictionResult::new(probability);

    let [probability_line, label_line] = output::single_result_lines(&result);
    output::success(&probability_line);
    output::note(&label_line);
    println!();
    Ok(())
}

/// Advances a progress bar as each row is scored
struct ProgressPredictor<'a> {
    inner: &'a ApiClient,
    progress: &'a indicatif::ProgressBar,
}

#[async_trait]
impl Predictor for ProgressPredictor<'_> {
    async fn predict_one(&self, features: &FeatureVector) -> client::error::Result<f64> {
        let probability = self.inner.predict_one(features).await?;
        self.progress.inc(1);
        Ok(probability)
    }
}

async fn batch(
    api: &ApiClient,
    input: &Path,
    export: &Path,
    preview_rows: usize,
    yes: bool,
) -> Result<(), ClientError> {
    output::section("Batch Prediction via CSV Upload");

    let mut table = BatchRecord::from_path(input)?;
    output::print_indented(&output::render_preview(&table, preview_rows));
    output::note(&format!("{} rows in {}", table.len(), input.display()));

    table.check_columns()?;

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Run Batch Prediction?")
            .default(true)
            .interact()
            .map_err(|e| ClientError::Io(std::io::Error::other(e.to_string())))?;
        if !confirmed {
            output::note("Batch prediction cancelled.");
            return Ok(());
        }
    }

    let progress = output::spinner("Running predictions...");
    progress.set_length(table.len() as u64);
    let predictor = ProgressPredictor {
        inner: api,
        progress: &progress,
    };

    let outcome = client::run_batch(&predictor, &mut table).await;
    progress.finish_and_clear();
    let results = outcome?;

    output::section("Prediction Results");
    output::print_indented(&output::render_batch(&table));

    table.save(export)?;
    let high_value = results.iter().filter(|r| r.is_high_value()).count();
    output::success(&format!(
        "{} customers scored, {} high value",
        results.len(),
        high_value
    ));
    output::success(&format!("Predictions written to {}", export.display()));
    println!();
    Ok(())
}

async fn health(api: &ApiClient) -> Result<(), ClientError> {
    let status = api.health().await?;
    output::success(&format!("{}: {}", API_TITLE, status.status));
    Ok(())
}
