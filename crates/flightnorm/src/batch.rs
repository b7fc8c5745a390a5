//! Bulk normalization with fingerprint deduplication.
//!
//! Messages are normalized in parallel; the normalizer holds no mutable
//! state, so workers share it by reference. Deduplication runs afterwards in
//! input order, so the first occurrence of a fingerprint is the one kept and
//! the output order follows the input order.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BatchConfig;
use crate::error::Result;
use crate::message::FlightMessage;
use crate::normalizer::Normalizer;
use crate::record::FlightRecord;

/// Options for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Worker threads; 0 uses the global rayon pool.
    pub workers: usize,
    /// Drop records whose fingerprint was already emitted.
    pub dedupe: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            dedupe: true,
        }
    }
}

impl From<&BatchConfig> for BatchOptions {
    fn from(config: &BatchConfig) -> Self {
        Self {
            workers: config.workers,
            dedupe: config.dedupe,
        }
    }
}

/// Counters for a batch run. The `missing_*` counters cover emitted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Messages received.
    pub total: usize,
    /// Records emitted.
    pub emitted: usize,
    /// Records dropped as duplicates.
    pub duplicates: usize,
    /// Emitted records without an identifier.
    pub missing_identifier: usize,
    /// Emitted records without a start time.
    pub missing_start_time: usize,
    /// Emitted records without a start position.
    pub missing_start_position: usize,
}

impl BatchStats {
    fn count(&mut self, record: &FlightRecord) {
        self.emitted += 1;
        if record.identifier.is_none() {
            self.missing_identifier += 1;
        }
        if record.start_time.is_none() {
            self.missing_start_time += 1;
        }
        if record.start().is_none() {
            self.missing_start_position += 1;
        }
    }
}

/// Records and counters from a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Emitted records, in input order.
    pub records: Vec<FlightRecord>,
    /// Run counters.
    pub stats: BatchStats,
}

/// Set of fingerprints already accepted.
///
/// `insert` is insert-or-ignore: resubmitting a known fingerprint is a no-op.
#[derive(Debug, Clone, Default)]
pub struct FingerprintSet {
    seen: HashSet<String>,
}

impl FingerprintSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a record. Returns `false` if its fingerprint was already seen.
    pub fn insert(&mut self, record: &FlightRecord) -> bool {
        if self.seen.contains(&record.fingerprint) {
            debug!(
                "Skipping duplicate record with fingerprint {}",
                short(&record.fingerprint)
            );
            return false;
        }
        self.seen.insert(record.fingerprint.clone())
    }

    /// Check whether a fingerprint was already seen.
    #[must_use]
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Number of distinct fingerprints seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check whether nothing has been accepted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Normalize a batch of messages.
///
/// # Errors
///
/// Returns an error only if a dedicated worker pool was requested and could not
/// be built.
pub fn normalize_batch(
    normalizer: &Normalizer,
    messages: &[FlightMessage],
    options: BatchOptions,
) -> Result<BatchOutput> {
    let normalized = if options.workers > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()?;
        pool.install(|| normalize_all(normalizer, messages))
    } else {
        normalize_all(normalizer, messages)
    };

    let mut output = BatchOutput {
        records: Vec::with_capacity(normalized.len()),
        stats: BatchStats {
            total: messages.len(),
            ..BatchStats::default()
        },
    };
    let mut seen = FingerprintSet::new();

    for record in normalized {
        if options.dedupe && !seen.insert(&record) {
            output.stats.duplicates += 1;
            continue;
        }
        output.stats.count(&record);
        output.records.push(record);
    }

    info!(
        total = output.stats.total,
        emitted = output.stats.emitted,
        duplicates = output.stats.duplicates,
        "Normalized batch"
    );
    Ok(output)
}

fn normalize_all(normalizer: &Normalizer, messages: &[FlightMessage]) -> Vec<FlightRecord> {
    messages
        .par_iter()
        .map(|message| normalizer.normalize(message))
        .collect()
}

fn short(fingerprint: &str) -> &str {
    fingerprint.get(..16).unwrap_or(fingerprint)
}
