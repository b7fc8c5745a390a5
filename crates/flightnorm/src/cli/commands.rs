//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::ingest::InputFormat;

/// Normalize command arguments.
#[derive(Debug, Args)]
pub struct NormalizeCommand {
    /// Input file with one message per row
    pub input: PathBuf,

    /// Write NDJSON records here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Input layout
    #[arg(short, long, value_enum, default_value = "auto")]
    pub format: InputFormatArg,

    /// Worker threads (overrides batch.workers; 0 = one per CPU)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Emit every record, even when its fingerprint repeats
    #[arg(long)]
    pub keep_duplicates: bool,
}

/// Parse command arguments.
#[derive(Debug, Args)]
pub struct ParseCommand {
    /// Combined (SHR) block
    #[arg(long, allow_hyphen_values = true)]
    pub shr: Option<String>,

    /// Departure (DEP) block
    #[arg(long, allow_hyphen_values = true)]
    pub dep: Option<String>,

    /// Arrival (ARR) block
    #[arg(long, allow_hyphen_values = true)]
    pub arr: Option<String>,

    /// Region label of the reporting center
    #[arg(long)]
    pub region: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Enrich command arguments.
#[derive(Debug, Args)]
pub struct EnrichCommand {
    /// NDJSON file of stored records, each with an `id`
    pub stored: PathBuf,

    /// Write updated records here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Metrics command arguments.
#[derive(Debug, Args)]
pub struct MetricsCommand {
    /// NDJSON file of normalized records
    pub records: PathBuf,

    /// Count flights starting at or after this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Count flights starting at or before this time (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Maximum number of regions (defaults to metrics.top)
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Input layout argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormatArg {
    /// Pick from the file extension
    #[default]
    Auto,
    /// One JSON object per line
    Ndjson,
    /// A JSON array of objects
    Json,
    /// CSV with a header row
    Csv,
}

impl From<InputFormatArg> for InputFormat {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Auto => Self::Auto,
            InputFormatArg::Ndjson => Self::Ndjson,
            InputFormatArg::Json => Self::Json,
            InputFormatArg::Csv => Self::Csv,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
