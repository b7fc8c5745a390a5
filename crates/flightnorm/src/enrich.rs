//! Re-enrichment of stored records.
//!
//! Re-runs the normalizer over the raw payload kept on a stored record and
//! folds the fresh result into it. New values only ever add information: a
//! field that comes back null leaves the stored value alone.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fingerprint::fingerprint;
use crate::normalizer::{duration_between, Normalizer};
use crate::record::FlightRecord;

/// Looks up which stored record owns a fingerprint.
pub trait FingerprintIndex {
    /// Return the id of the record holding `fingerprint`, if any.
    fn owner_of(&self, fingerprint: &str) -> Option<i64>;
}

impl FingerprintIndex for HashMap<String, i64> {
    fn owner_of(&self, fingerprint: &str) -> Option<i64> {
        self.get(fingerprint).copied()
    }
}

/// A record together with its storage id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFlight {
    /// Storage id.
    pub id: i64,
    /// The record as stored.
    #[serde(flatten)]
    pub record: FlightRecord,
}

/// Build an index over a set of stored flights.
#[must_use]
pub fn index_of(stored: &[StoredFlight]) -> HashMap<String, i64> {
    stored
        .iter()
        .map(|s| (s.record.fingerprint.clone(), s.id))
        .collect()
}

/// What a re-enrichment changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichOutcome {
    /// Names of the fields whose value changed.
    pub updated: Vec<&'static str>,
    /// The recomputed fingerprint belongs to another record and was not applied.
    pub fingerprint_conflict: bool,
}

impl EnrichOutcome {
    /// Check whether anything changed.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

/// Re-normalize a stored record in place.
pub fn reenrich<I>(normalizer: &Normalizer, stored: &mut StoredFlight, index: &I) -> EnrichOutcome
where
    I: FingerprintIndex + ?Sized,
{
    let fresh = normalizer.normalize(&stored.record.raw_payload);
    let mut outcome = EnrichOutcome::default();
    merge(&mut stored.record, &fresh, &mut outcome.updated);

    let candidate = fingerprint(
        stored.record.identifier.as_deref(),
        stored.record.start_time,
        stored.record.start_lat,
        stored.record.start_lon,
    );
    if candidate != stored.record.fingerprint {
        match index.owner_of(&candidate) {
            Some(owner) if owner != stored.id => {
                debug!(id = stored.id, owner, "Recomputed fingerprint already taken");
                outcome.fingerprint_conflict = true;
            }
            _ => {
                stored.record.fingerprint = candidate;
                outcome.updated.push("fingerprint");
            }
        }
    }

    outcome
}

/// Fold `fresh` into `target`, recording which fields changed.
fn merge(target: &mut FlightRecord, fresh: &FlightRecord, updated: &mut Vec<&'static str>) {
    if let Some(start) = fresh.start() {
        if target.start() != Some(start) {
            target.set_start(Some(start));
            updated.push("start_position");
        }
    }
    if let Some(end) = fresh.end() {
        if target.end() != Some(end) {
            target.set_end(Some(end));
            updated.push("end_position");
        }
    }

    overwrite(&mut target.start_time, fresh.start_time, "start_time", updated);
    overwrite(&mut target.end_time, fresh.end_time, "end_time", updated);
    overwrite(
        &mut target.time_token,
        fresh.time_token.clone(),
        "time_token",
        updated,
    );

    fill(
        &mut target.identifier,
        fresh.identifier.clone(),
        "identifier",
        updated,
    );
    fill(
        &mut target.vehicle_type,
        fresh.vehicle_type.clone(),
        "vehicle_type",
        updated,
    );

    let duration = duration_between(target.start_time, target.end_time);
    if duration != target.duration_seconds {
        target.duration_seconds = duration;
        updated.push("duration_seconds");
    }
}

/// Replace with a non-null new value.
fn overwrite<T: PartialEq>(
    slot: &mut Option<T>,
    value: Option<T>,
    name: &'static str,
    updated: &mut Vec<&'static str>,
) {
    if value.is_some() && *slot != value {
        *slot = value;
        updated.push(name);
    }
}

/// Set only when nothing was stored.
fn fill<T>(
    slot: &mut Option<T>,
    value: Option<T>,
    name: &'static str,
    updated: &mut Vec<&'static str>,
) {
    if slot.is_none() && value.is_some() {
        *slot = value;
        updated.push(name);
    }
}
