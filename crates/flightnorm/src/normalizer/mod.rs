//! Flight-plan message normalization.
//!
//! The [`Normalizer`] turns one [`FlightMessage`] into one [`FlightRecord`].
//! It never fails: any field that cannot be recovered from the text comes out
//! as `None` and the rest of the record is still filled in.
//!
//! The submodules hold the individual extractors. Each is a total function
//! from text to `Option`, so they can also be used on their own.

pub mod coordinate;
pub mod identifier;
pub mod locator;
pub mod temporal;
pub mod vehicle;

use std::sync::LazyLock;

use tracing::trace;

pub use coordinate::{parse_coordinate, Coordinate};
pub use identifier::{extract_identifier, IdentifierRules};
pub use locator::{locate, Positions};
pub use temporal::{
    combine, duration_between, extract_date, extract_marked_time, extract_time, TimeMarker,
};
pub use vehicle::VehicleRules;

use crate::config::NormalizerConfig;
use crate::fingerprint::fingerprint;
use crate::message::FlightMessage;
use crate::record::FlightRecord;

static DEFAULT_NORMALIZER: LazyLock<Normalizer> = LazyLock::new(Normalizer::new);

/// Normalize one message with the default rules.
#[must_use]
pub fn normalize(message: &FlightMessage) -> FlightRecord {
    DEFAULT_NORMALIZER.normalize(message)
}

/// Composes the extractors into a complete record.
///
/// Holds only immutable rule tables, so one instance can be shared across
/// worker threads by reference.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    identifiers: IdentifierRules,
    vehicles: VehicleRules,
}

impl Normalizer {
    /// Create a normalizer with the default rule tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer from configuration.
    #[must_use]
    pub fn with_config(config: &NormalizerConfig) -> Self {
        Self {
            identifiers: IdentifierRules::new(&config.noise_identifiers),
            vehicles: VehicleRules::new(&config.vehicle_keywords),
        }
    }

    /// Normalize one message.
    #[must_use]
    pub fn normalize(&self, message: &FlightMessage) -> FlightRecord {
        let (shr, dep, arr) = (message.shr(), message.dep(), message.arr());

        let identifier = first_hit([dep, shr, arr], |text| self.identifiers.extract(text));
        let positions = locate(shr, dep, arr);

        let date = first_hit([shr, dep, arr], extract_date);
        let start_token = dep
            .and_then(extract_time)
            .or_else(|| shr.and_then(extract_time));
        let end_token = arr
            .and_then(extract_time)
            .or_else(|| shr.and_then(|text| extract_marked_time(text, TimeMarker::Arrival)));

        let start_time = combine(date.as_deref(), start_token.as_deref());
        let end_time = combine(date.as_deref(), end_token.as_deref());
        let duration_seconds = duration_between(start_time, end_time);

        let vehicle_type = self.vehicles.detect(&[shr, dep, arr]);

        trace!(
            identifier = ?identifier,
            date = ?date,
            start = ?start_token,
            end = ?end_token,
            vehicle = ?vehicle_type,
            "Extracted fields"
        );

        let mut record = FlightRecord {
            identifier,
            vehicle_type,
            start_time,
            end_time,
            duration_seconds,
            start_lat: None,
            start_lon: None,
            end_lat: None,
            end_lon: None,
            time_token: start_token,
            raw_payload: message.clone(),
            fingerprint: String::new(),
        };
        record.set_start(positions.start);
        record.set_end(positions.end);

        let mut record = record.sanitized();
        record.fingerprint = fingerprint(
            record.identifier.as_deref(),
            record.start_time,
            record.start_lat,
            record.start_lon,
        );
        record
    }
}

/// Run `extract` over the blocks in order and keep the first hit.
fn first_hit<T, F>(blocks: [Option<&str>; 3], extract: F) -> Option<T>
where
    F: Fn(&str) -> Option<T>,
{
    blocks.into_iter().flatten().find_map(extract)
}
