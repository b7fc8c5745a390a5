//! Deduplication fingerprints.
//!
//! A fingerprint is the BLAKE3 hash of the identifier, start time and start
//! position joined with `|`. Two records that agree on those four values are
//! the same flight event, whatever else differs between them.

use chrono::{DateTime, SecondsFormat, Utc};

/// Separator placed between the hashed fields.
pub const FIELD_DELIMITER: char = '|';

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 64;

/// Compute the fingerprint of a flight event.
///
/// Missing values (and non-finite numbers) contribute an empty string, never a
/// placeholder word. The start time is rendered as `YYYY-MM-DDTHH:MM:SSZ`.
#[must_use]
pub fn fingerprint(
    identifier: Option<&str>,
    start_time: Option<DateTime<Utc>>,
    start_lat: Option<f64>,
    start_lon: Option<f64>,
) -> String {
    let time = start_time
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default();

    let material = format!(
        "{id}{d}{time}{d}{lat}{d}{lon}",
        id = identifier.unwrap_or_default(),
        d = FIELD_DELIMITER,
        lat = number(start_lat),
        lon = number(start_lon),
    );

    blake3::hash(material.as_bytes()).to_hex().to_string()
}

fn number(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.to_string())
        .unwrap_or_default()
}
