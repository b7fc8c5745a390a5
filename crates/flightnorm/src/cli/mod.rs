//! Command-line interface for flightnorm.
//!
//! This module provides the CLI structure for the `fnorm` binary.

mod commands;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::error::{Error, Result};

pub use commands::{
    ConfigCommand, EnrichCommand, InputFormatArg, MetricsCommand, NormalizeCommand,
    OutputFormat, ParseCommand,
};

/// fnorm - Normalize flight-plan messages
///
/// Turns free-text SHR/DEP/ARR flight-plan messages into structured flight
/// records with identifiers, times, positions and a deduplication fingerprint.
#[derive(Debug, Parser)]
#[command(name = "fnorm")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize a file of messages into NDJSON records
    Normalize(NormalizeCommand),

    /// Normalize a single message given on the command line
    Parse(ParseCommand),

    /// Re-run normalization over stored records and merge the results
    Enrich(EnrichCommand),

    /// Count flights per region
    Metrics(MetricsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Which end of a window a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEdge {
    /// A bare date means 00:00:00 of that day.
    Start,
    /// A bare date means 23:59:59 of that day.
    End,
}

/// Read a window bound given as RFC 3339 or as a bare `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`Error::InvalidTime`] if the text is neither.
pub fn parse_instant(value: &str, edge: WindowEdge) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    let (hour, minute, second) = match edge {
        WindowEdge::Start => (0, 0, 0),
        WindowEdge::End => (23, 59, 59),
    };
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::InvalidTime {
            value: value.to_string(),
        })
}
