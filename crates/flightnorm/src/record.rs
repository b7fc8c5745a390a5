//! Output record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::FlightMessage;
use crate::normalizer::Coordinate;

/// A normalized flight record.
///
/// Every field except `fingerprint` and `raw_payload` may be null when the
/// source text did not offer it. Positions are always complete pairs and no
/// number is ever non-finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Best-guess flight, aircraft or mission id.
    pub identifier: Option<String>,

    /// Detected vehicle type code.
    pub vehicle_type: Option<String>,

    /// Start instant, second precision.
    pub start_time: Option<DateTime<Utc>>,

    /// End instant, second precision.
    pub end_time: Option<DateTime<Utc>>,

    /// Seconds from start to end, only when both are known and end >= start.
    pub duration_seconds: Option<u64>,

    /// Start latitude in decimal degrees.
    pub start_lat: Option<f64>,

    /// Start longitude in decimal degrees.
    pub start_lon: Option<f64>,

    /// End latitude in decimal degrees.
    pub end_lat: Option<f64>,

    /// End longitude in decimal degrees.
    pub end_lon: Option<f64>,

    /// Start clock time as `HH:MM`, kept even when the date is unknown.
    pub time_token: Option<String>,

    /// Verbatim copy of the source message.
    pub raw_payload: FlightMessage,

    /// Deduplication key, see [`crate::fingerprint`].
    pub fingerprint: String,
}

impl FlightRecord {
    /// The start position, if known.
    #[must_use]
    pub fn start(&self) -> Option<Coordinate> {
        Coordinate::from_pair(self.start_lat, self.start_lon)
    }

    /// The end position, if known.
    #[must_use]
    pub fn end(&self) -> Option<Coordinate> {
        Coordinate::from_pair(self.end_lat, self.end_lon)
    }

    /// Set the start position from an optional coordinate.
    pub fn set_start(&mut self, position: Option<Coordinate>) {
        self.start_lat = position.map(|c| c.lat);
        self.start_lon = position.map(|c| c.lon);
    }

    /// Set the end position from an optional coordinate.
    pub fn set_end(&mut self, position: Option<Coordinate>) {
        self.end_lat = position.map(|c| c.lat);
        self.end_lon = position.map(|c| c.lon);
    }

    /// The region label carried by the source message.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.raw_payload.region()
    }

    /// Drop non-finite numbers and half-present positions.
    ///
    /// A pair where either value is missing, non-finite or out of range is
    /// cleared as a whole.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let start = self.start();
        let end = self.end();
        self.set_start(start);
        self.set_end(end);
        self
    }
}
