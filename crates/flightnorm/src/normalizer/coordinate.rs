//! Compact coordinate decoding.
//!
//! Flight-plan messages encode positions as fixed-width digit runs followed by
//! hemisphere letters, with no separators between the fields:
//!
//! - minutes form: `5957N02905E` (degrees + minutes, then `N|S`; degrees +
//!   minutes, then `E|W`)
//! - seconds form: `440846N0430829E` (`DDMMSS` + `N|S`, `DDDMMSS` + `E|W`)
//!
//! Messages mix both encodings without any format flag, so both grammars are
//! tried on every token.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Loose coordinate shape used to find candidates inside free text.
///
/// Candidates still go through [`parse_coordinate`], which applies the strict
/// grammars and range checks.
pub(crate) const COORDINATE_SHAPE: &str = r"[0-9]{4,6}[NS]\s?[0-9]{4,7}[EW]";

static SECONDS_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2})([0-9]{2})([0-9]{2})([NS])([0-9]{3})([0-9]{2})([0-9]{2})([EW])$")
        .expect("valid seconds-form regex")
});

static MINUTES_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]{2,3})([0-9]{2})([NS])([0-9]{2,3})([0-9]{2})([EW])$")
        .expect("valid minutes-form regex")
});

/// Decimal places kept after conversion.
const PRECISION: f64 = 1e8;

/// A decoded position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in `[-90, 90]`, positive north.
    pub lat: f64,
    /// Longitude in `[-180, 180]`, positive east.
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate from decimal degrees.
    ///
    /// Returns `None` for non-finite or out-of-range values. Both components
    /// are rounded to 8 decimal places so that equal tokens always produce
    /// bit-identical values.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self {
            lat: round(lat),
            lon: round(lon),
        })
    }

    /// Build a coordinate from an optional pair, as stored in a record.
    #[must_use]
    pub fn from_pair(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        Self::new(lat?, lon?)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lon)
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(c: Coordinate) -> Self {
        (c.lat, c.lon)
    }
}

/// Parse a compact coordinate token such as `5957N02905E`.
///
/// Characters outside `[0-9NSEW]` are dropped first (case-insensitively), so
/// `"5957N 02905E"` and `"5957n02905e"` decode the same way. The seconds form
/// is tried before the minutes form.
///
/// Returns `None` when neither grammar matches, when a minute or second field
/// is 60 or more, or when the result is out of range. Never panics.
#[must_use]
pub fn parse_coordinate(token: &str) -> Option<Coordinate> {
    let compact: String = token
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_digit() || matches!(c, 'N' | 'S' | 'E' | 'W'))
        .collect();

    if compact.is_empty() {
        return None;
    }

    decode_seconds_form(&compact).or_else(|| decode_minutes_form(&compact))
}

fn decode_seconds_form(compact: &str) -> Option<Coordinate> {
    let caps = SECONDS_FORM.captures(compact)?;
    let lat = degrees(
        field(&caps, 1)?,
        field(&caps, 2)?,
        field(&caps, 3)?,
        &caps[4] == "S",
    )?;
    let lon = degrees(
        field(&caps, 5)?,
        field(&caps, 6)?,
        field(&caps, 7)?,
        &caps[8] == "W",
    )?;
    Coordinate::new(lat, lon)
}

fn decode_minutes_form(compact: &str) -> Option<Coordinate> {
    let caps = MINUTES_FORM.captures(compact)?;
    let lat = degrees(field(&caps, 1)?, field(&caps, 2)?, 0, &caps[3] == "S")?;
    let lon = degrees(field(&caps, 4)?, field(&caps, 5)?, 0, &caps[6] == "W")?;
    Coordinate::new(lat, lon)
}

fn field(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)?.as_str().parse().ok()
}

fn degrees(deg: u32, min: u32, sec: u32, negative: bool) -> Option<f64> {
    if min >= 60 || sec >= 60 {
        return None;
    }
    let value = f64::from(deg) + f64::from(min) / 60.0 + f64::from(sec) / 3600.0;
    Some(if negative { -value } else { value })
}

fn round(value: f64) -> f64 {
    (value * PRECISION).round() / PRECISION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_parse_minutes_form() {
        let c = parse_coordinate("5957N02905E").unwrap();
        assert_close(c.lat, 59.0 + 57.0 / 60.0);
        assert_close(c.lon, 29.0 + 5.0 / 60.0);
    }

    #[test]
    fn test_parse_seconds_form() {
        let c = parse_coordinate("440846N0430829E").unwrap();
        assert_close(c.lat, 44.0 + 8.0 / 60.0 + 46.0 / 3600.0);
        assert_close(c.lon, 43.0 + 8.0 / 60.0 + 29.0 / 3600.0);
    }

    #[test]
    fn test_parse_southern_western_hemispheres() {
        let c = parse_coordinate("3352S07040W").unwrap();
        assert_close(c.lat, -(33.0 + 52.0 / 60.0));
        assert_close(c.lon, -(70.0 + 40.0 / 60.0));

        let c = parse_coordinate("335210S0704015W").unwrap();
        assert!(c.lat < 0.0);
        assert!(c.lon < 0.0);
    }

    #[test]
    fn test_parse_ignores_separators_and_case() {
        let expected = parse_coordinate("5957N02905E").unwrap();
        assert_eq!(parse_coordinate("5957n 02905e"), Some(expected));
        assert_eq!(parse_coordinate(" 5957N/02905E "), Some(expected));
    }

    #[test]
    fn test_parse_two_digit_longitude_degrees() {
        let c = parse_coordinate("5152N8600E").unwrap();
        assert_close(c.lat, 51.0 + 52.0 / 60.0);
        assert_close(c.lon, 86.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_coordinate("not a coordinate"), None);
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("12345"), None);
        assert_eq!(parse_coordinate("5957N"), None);
        assert_eq!(parse_coordinate("5957E02905N"), None);
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        // latitude 95
        assert_eq!(parse_coordinate("9500N02905E"), None);
        // longitude 185
        assert_eq!(parse_coordinate("5957N18500E"), None);
        // minute field 75
        assert_eq!(parse_coordinate("5975N02905E"), None);
        // second field 61
        assert_eq!(parse_coordinate("440861N0430829E"), None);
    }

    #[test]
    fn test_parse_boundaries() {
        let c = parse_coordinate("9000N18000E").unwrap();
        assert_close(c.lat, 90.0);
        assert_close(c.lon, 180.0);
    }

    #[test]
    fn test_values_are_rounded_to_eight_places() {
        let c = parse_coordinate("5957N02905E").unwrap();
        assert_eq!(c.lon, 29.083_333_33);
    }

    #[test]
    fn test_minutes_form_round_trip() {
        for lat_deg in [0_u32, 7, 45, 59, 89] {
            for lat_min in [0_u32, 1, 30, 59] {
                for lon_deg in [0_u32, 29, 100, 179] {
                    for lon_min in [0_u32, 5, 59] {
                        let token = format!("{lat_deg:02}{lat_min:02}N{lon_deg:03}{lon_min:02}E");
                        let c = parse_coordinate(&token).unwrap();

                        let lat_minutes = (c.lat - f64::from(lat_deg)) * 60.0;
                        let lon_minutes = (c.lon - f64::from(lon_deg)) * 60.0;
                        assert_close(lat_minutes, f64::from(lat_min));
                        assert_close(lon_minutes, f64::from(lon_min));
                        assert_eq!(c.lat.trunc() as u32, lat_deg, "token {token}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_coordinate_new_rejects_non_finite() {
        assert_eq!(Coordinate::new(f64::NAN, 10.0), None);
        assert_eq!(Coordinate::new(10.0, f64::INFINITY), None);
    }

    #[test]
    fn test_coordinate_from_pair_requires_both() {
        assert!(Coordinate::from_pair(Some(10.0), Some(20.0)).is_some());
        assert!(Coordinate::from_pair(Some(10.0), None).is_none());
        assert!(Coordinate::from_pair(None, Some(20.0)).is_none());
    }

    #[test]
    fn test_coordinate_into_tuple() {
        let c = parse_coordinate("5957N02905E").unwrap();
        let (lat, lon): (f64, f64) = c.into();
        assert_close(lat, 59.95);
        assert_close(lon, 29.083_333);
    }

    #[test]
    fn test_coordinate_display() {
        let c = Coordinate::new(59.95, 29.5).unwrap();
        assert_eq!(c.to_string(), "59.950000, 29.500000");
    }
}
