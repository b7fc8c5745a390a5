//! `fnorm` - CLI for flightnorm
//!
//! Normalizes flight-plan message files, re-enriches stored records and
//! reports per-region counts.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fmt::Display;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use flightnorm::batch::{normalize_batch, BatchOptions};
use flightnorm::cli::{
    parse_instant, Cli, Command, ConfigCommand, EnrichCommand, MetricsCommand, NormalizeCommand,
    OutputFormat, ParseCommand, WindowEdge,
};
use flightnorm::enrich::{index_of, reenrich, StoredFlight};
use flightnorm::ingest::{create_output, read_messages, read_ndjson, write_ndjson};
use flightnorm::metrics::{RegionMetrics, RegionQuery};
use flightnorm::{init_logging, Config, FlightMessage, FlightRecord, Normalizer};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config validate` reports errors itself instead of failing on load
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        handle_validate(file.clone().or_else(|| cli.config.clone()));
        return Ok(());
    }

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Normalize(cmd) => handle_normalize(&config, &cmd),
        Command::Parse(cmd) => handle_parse(&config, &cmd),
        Command::Enrich(cmd) => handle_enrich(&config, &cmd),
        Command::Metrics(cmd) => handle_metrics(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_normalize(config: &Config, cmd: &NormalizeCommand) -> Result<()> {
    let ingested = read_messages(&cmd.input, cmd.format.into())?;
    if ingested.skipped > 0 {
        warn!(skipped = ingested.skipped, "Some input rows were malformed");
    }

    let mut options = BatchOptions::from(&config.batch);
    if let Some(workers) = cmd.workers {
        options.workers = workers;
    }
    if cmd.keep_duplicates {
        options.dedupe = false;
    }

    let normalizer = Normalizer::with_config(&config.normalizer);
    let output = normalize_batch(&normalizer, &ingested.rows, options)?;

    let written = write_ndjson(open_output(cmd.output.as_deref())?, &output.records)?;
    let stats = output.stats;
    info!(
        written,
        skipped_rows = ingested.skipped,
        duplicates = stats.duplicates,
        missing_identifier = stats.missing_identifier,
        missing_start_time = stats.missing_start_time,
        missing_start_position = stats.missing_start_position,
        "Normalize complete"
    );
    Ok(())
}

fn handle_parse(config: &Config, cmd: &ParseCommand) -> Result<()> {
    let mut message = FlightMessage::new(cmd.shr.as_deref(), cmd.dep.as_deref(), cmd.arr.as_deref());
    if let Some(region) = &cmd.region {
        message = message.with_region(region.clone());
    }

    let record = Normalizer::with_config(&config.normalizer).normalize(&message);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        OutputFormat::Plain | OutputFormat::Table => print_record(&record),
    }
    Ok(())
}

fn print_record(record: &FlightRecord) {
    println!("Identifier:    {}", or_dash(record.identifier.as_ref()));
    println!("Vehicle type:  {}", or_dash(record.vehicle_type.as_ref()));
    println!("Start time:    {}", or_dash(record.start_time.as_ref()));
    println!("End time:      {}", or_dash(record.end_time.as_ref()));
    println!("Duration (s):  {}", or_dash(record.duration_seconds.as_ref()));
    println!("Time token:    {}", or_dash(record.time_token.as_ref()));
    println!("Start:         {}", or_dash(record.start().as_ref()));
    println!("End:           {}", or_dash(record.end().as_ref()));
    println!("Region:        {}", or_dash(record.region()));
    println!("Fingerprint:   {}", record.fingerprint);
}

fn or_dash<T: Display + ?Sized>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn handle_enrich(config: &Config, cmd: &EnrichCommand) -> Result<()> {
    let loaded = read_ndjson::<StoredFlight>(&cmd.stored)?;
    let mut stored = loaded.rows;
    let mut index = index_of(&stored);
    let normalizer = Normalizer::with_config(&config.normalizer);

    let (mut changed, mut conflicts) = (0_usize, 0_usize);
    for flight in &mut stored {
        let before = flight.record.fingerprint.clone();
        let outcome = reenrich(&normalizer, flight, &index);
        if outcome.is_changed() {
            changed += 1;
        }
        if outcome.fingerprint_conflict {
            conflicts += 1;
        }
        if flight.record.fingerprint != before {
            if index.get(&before) == Some(&flight.id) {
                index.remove(&before);
            }
            index.insert(flight.record.fingerprint.clone(), flight.id);
        }
    }

    write_ndjson(open_output(cmd.output.as_deref())?, &stored)?;
    info!(
        records = stored.len(),
        changed,
        fingerprint_conflicts = conflicts,
        skipped_rows = loaded.skipped,
        "Enrich complete"
    );
    Ok(())
}

fn handle_metrics(config: &Config, cmd: &MetricsCommand) -> Result<()> {
    let query = RegionQuery {
        from: cmd
            .from
            .as_deref()
            .map(|v| parse_instant(v, WindowEdge::Start))
            .transpose()?,
        to: cmd
            .to
            .as_deref()
            .map(|v| parse_instant(v, WindowEdge::End))
            .transpose()?,
        top: cmd.top,
    };

    let loaded = read_ndjson::<FlightRecord>(&cmd.records)?;
    let mut metrics = RegionMetrics::new(loaded.rows, &config.metrics);
    let rows = metrics.top_regions(&query);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => {
            for row in &rows {
                println!("{}\t{}", row.region, row.count);
            }
        }
        OutputFormat::Table => {
            let width = rows
                .iter()
                .map(|r| r.region.chars().count())
                .max()
                .unwrap_or(0)
                .max("Region".len());
            println!("{:<width$}  {:>7}", "Region", "Flights");
            println!("{}  {}", "-".repeat(width), "-".repeat(7));
            for row in &rows {
                println!("{:<width$}  {:>7}", row.region, row.count);
            }
            println!();
            println!("{} records in snapshot", metrics.record_count());
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Normalizer]");
                println!(
                    "  Vehicle keywords:   {}",
                    config.normalizer.vehicle_keywords.join(", ")
                );
                println!(
                    "  Noise identifiers:  {}",
                    config.normalizer.noise_identifiers.join(", ")
                );
                println!();
                println!("[Batch]");
                println!("  Workers:            {}", config.batch.workers);
                println!("  Dedupe:             {}", config.batch.dedupe);
                println!();
                println!("[Metrics]");
                println!("  Cache TTL (s):      {}", config.metrics.cache_ttl_secs);
                println!("  Cache entries:      {}", config.metrics.cache_max_entries);
                println!("  Top regions:        {}", config.metrics.top);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => handle_validate(file),
    }
    Ok(())
}

fn handle_validate(file: Option<std::path::PathBuf>) {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    match Config::load_from(Some(path)) {
        Ok(_) => println!("Configuration is valid."),
        Err(e) => println!("Configuration error: {e}"),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}
