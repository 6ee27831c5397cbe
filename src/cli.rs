//! CLI argument parsing for procflow

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "procflow")]
#[command(version)]
#[command(about = "Reconstruct process flow and flag anomalies in manufacturing event logs", long_about = None)]
pub struct Cli {
    /// JSON file holding an array of activity records
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Analyze only this case (default: all cases)
    #[arg(short = 'C', long = "case", value_name = "CASE_ID")]
    pub case_id: Option<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// TOML file with flow configuration
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Duration (seconds) above which an activity is anomalous
    #[arg(long = "anomaly-threshold", value_name = "SECONDS")]
    pub anomaly_threshold: Option<f64>,

    /// Lower bound of the gap validity window (seconds)
    #[arg(long = "min-gap", value_name = "SECONDS", allow_hyphen_values = true)]
    pub min_gap: Option<f64>,

    /// Upper bound of the gap validity window (seconds)
    #[arg(long = "max-gap", value_name = "SECONDS")]
    pub max_gap: Option<f64>,

    /// Worker threads for multi-case analysis (0 = all cores)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Print case summaries only (CSV: summary table instead of transitions)
    #[arg(short = 's', long = "summary")]
    pub summary_only: bool,

    /// Enable debug tracing on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
