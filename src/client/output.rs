//! Terminal rendering for the prediction CLI.

use crate::client::batch::BatchRecord;
use crate::models::PredictionResult;
use std::time::Duration;
use tabled::{builder::Builder, settings::Style};

/// Braille spinner frames
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔"];

/// Render headers and rows as a bordered table
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Render the first `n` rows of an upload
pub fn render_preview(table: &BatchRecord, n: usize) -> String {
    render_table(table.headers(), table.preview(n))
}

/// Render a whole table
pub fn render_batch(table: &BatchRecord) -> String {
    render_table(table.headers(), table.rows())
}

/// Lines shown after a single-customer prediction
pub fn single_result_lines(result: &PredictionResult) -> [String; 2] {
    [
        format!("Probability: {:.2}", result.probability),
        format!("Prediction: {}", result.segment.customer_label()),
    ]
}

/// Print a table indented under the current section
pub fn print_indented(block: &str) {
    for line in block.lines() {
        println!("  {}", line);
    }
}

pub fn section(title: &str) {
    println!();
    println!("{}", title);
}

pub fn success(message: &str) {
    println!("  ✔ {}", message);
}

pub fn error(message: &str) {
    eprintln!("  ✘ {}", message);
}

pub fn note(message: &str) {
    println!("  {}", message);
}

/// Spinner shown while predictions run; hidden when stderr is not a terminal
pub fn spinner(message: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .tick_strings(SPINNER_FRAMES)
        .template("  {spinner} {msg} {pos}/{len}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}
