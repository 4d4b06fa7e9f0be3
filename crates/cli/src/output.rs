//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use seoprobe_inspect::{CheckError, Verdict};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// How a judgment ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Precondition,
}

impl Outcome {
    fn marker(&self) -> String {
        match self {
            Outcome::Passed => "✅ passed".green().to_string(),
            Outcome::Failed => "❌ failed".red().to_string(),
            Outcome::Precondition => "⚠️  precondition".yellow().to_string(),
        }
    }
}

/// One evaluated judgment
#[derive(Debug, Clone, Serialize)]
pub struct JudgmentReport {
    pub judgment: String,
    pub target: String,
    pub outcome: Outcome,
    pub detail: String,
    pub checked_at: String,
}

impl JudgmentReport {
    pub fn new(judgment: impl Into<String>, target: impl Into<String>, verdict: Verdict) -> Self {
        let (outcome, detail) = match verdict {
            Ok(()) => (Outcome::Passed, String::new()),
            Err(e) => (classify(&e), describe(&e)),
        };
        Self {
            judgment: judgment.into(),
            target: target.into(),
            outcome,
            detail,
            checked_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn classify(error: &CheckError) -> Outcome {
    if error.is_precondition() {
        Outcome::Precondition
    } else {
        Outcome::Failed
    }
}

/// Error message followed by its causes
fn describe(error: &CheckError) -> String {
    let mut detail = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        detail.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    detail
}

impl TableDisplay for JudgmentReport {
    fn headers() -> Vec<&'static str> {
        vec!["Judgment", "Target", "Outcome", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.judgment.clone(),
            self.target.clone(),
            self.outcome.marker(),
            self.detail.clone(),
        ]
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No judgments were run.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message);
}
