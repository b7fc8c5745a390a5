//! Input message type.
//!
//! A [`FlightMessage`] is one source row: the SHR (combined), DEP (departure)
//! and ARR (arrival) text blocks plus the region label of the reporting
//! center. Upstream row readers hand rows over as loosely typed maps, so
//! [`FlightMessage::from_row`] does the key matching and null handling.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header names accepted for the region label, lower-cased.
const REGION_KEYS: &[&str] = &["center", "region", "центр ес орвд"];

/// One flight-plan message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightMessage {
    /// Combined (SHR) block.
    #[serde(rename = "SHR", alias = "shr", default)]
    pub shr: Option<String>,

    /// Departure (DEP) block.
    #[serde(rename = "DEP", alias = "dep", default)]
    pub dep: Option<String>,

    /// Arrival (ARR) block.
    #[serde(rename = "ARR", alias = "arr", default)]
    pub arr: Option<String>,

    /// Region label of the reporting center.
    #[serde(rename = "center", alias = "region", default)]
    pub region: Option<String>,
}

impl FlightMessage {
    /// Create a message from the three text blocks.
    #[must_use]
    pub fn new(shr: Option<&str>, dep: Option<&str>, arr: Option<&str>) -> Self {
        Self {
            shr: shr.map(str::to_string),
            dep: dep.map(str::to_string),
            arr: arr.map(str::to_string),
            region: None,
        }
    }

    /// Set the region label.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Build a message from a loosely typed row.
    ///
    /// Keys are matched case-insensitively (`SHR`, `Shr`, `shr` are the same
    /// column). The region label is read from `center`, `region`, or the
    /// original Russian header. Absent, blank, `NaN` and infinite cells become
    /// `None`; when several keys map to the same field the first non-null
    /// value wins.
    #[must_use]
    pub fn from_row(row: &Map<String, Value>) -> Self {
        let mut message = Self::default();
        for (key, value) in row {
            let key = key.trim().to_lowercase();
            let slot = match key.as_str() {
                "shr" => &mut message.shr,
                "dep" => &mut message.dep,
                "arr" => &mut message.arr,
                k if REGION_KEYS.contains(&k) => &mut message.region,
                _ => continue,
            };
            if slot.is_none() {
                *slot = cell_text(value);
            }
        }
        message
    }

    /// The combined (SHR) block.
    #[must_use]
    pub fn shr(&self) -> Option<&str> {
        self.shr.as_deref()
    }

    /// The departure (DEP) block.
    #[must_use]
    pub fn dep(&self) -> Option<&str> {
        self.dep.as_deref()
    }

    /// The arrival (ARR) block.
    #[must_use]
    pub fn arr(&self) -> Option<&str> {
        self.arr.as_deref()
    }

    /// The region label.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Check whether none of the three text blocks is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shr.is_none() && self.dep.is_none() && self.arr.is_none()
    }
}

/// Convert one cell to text, treating blanks and non-finite numbers as null.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || is_non_finite_literal(trimmed) {
                None
            } else {
                Some(s.clone())
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Some(n.to_string()),
            _ => None,
        },
        other => Some(other.to_string()),
    }
}

fn is_non_finite_literal(text: &str) -> bool {
    matches!(
        text.to_ascii_lowercase().as_str(),
        "nan" | "+nan" | "-nan" | "inf" | "+inf" | "-inf" | "infinity" | "+infinity" | "-infinity"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_from_row_standard_keys() {
        let message = FlightMessage::from_row(&row(json!({
            "SHR": "(SHR-ZZZZZ)",
            "DEP": "-ATD 0705",
            "ARR": "-ATA 1636",
            "center": "Санкт-Петербургский",
        })));
        assert_eq!(message.shr(), Some("(SHR-ZZZZZ)"));
        assert_eq!(message.dep(), Some("-ATD 0705"));
        assert_eq!(message.arr(), Some("-ATA 1636"));
        assert_eq!(message.region(), Some("Санкт-Петербургский"));
    }

    #[test]
    fn test_from_row_keys_are_case_insensitive() {
        let message = FlightMessage::from_row(&row(json!({
            "Shr": "a",
            "dep": "b",
            " ARR ": "c",
            "REGION": "Moscow",
        })));
        assert_eq!(message.shr(), Some("a"));
        assert_eq!(message.dep(), Some("b"));
        assert_eq!(message.arr(), Some("c"));
        assert_eq!(message.region(), Some("Moscow"));
    }

    #[test]
    fn test_from_row_russian_region_header() {
        let message = FlightMessage::from_row(&row(json!({
            "Центр ЕС ОрВД": "Новосибирский",
        })));
        assert_eq!(message.region(), Some("Новосибирский"));
    }

    #[test]
    fn test_from_row_null_and_non_finite() {
        let message = FlightMessage::from_row(&row(json!({
            "SHR": null,
            "DEP": "NaN",
            "ARR": "   ",
            "center": "-inf",
        })));
        assert!(message.is_empty());
        assert_eq!(message.region(), None);
    }

    #[test]
    fn test_from_row_first_non_null_wins() {
        let message = FlightMessage::from_row(&row(json!({
            "SHR": null,
            "shr": "second",
        })));
        assert_eq!(message.shr(), Some("second"));
    }

    #[test]
    fn test_from_row_numbers_become_text() {
        let message = FlightMessage::from_row(&row(json!({
            "SHR": 12345,
            "DEP": 1.5,
        })));
        assert_eq!(message.shr(), Some("12345"));
        assert_eq!(message.dep(), Some("1.5"));
    }

    #[test]
    fn test_from_row_ignores_unknown_keys() {
        let message = FlightMessage::from_row(&row(json!({
            "id": 7,
            "notes": "x",
        })));
        assert_eq!(message, FlightMessage::default());
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let message = FlightMessage::from_row(&row(json!({ "SHR": "  -DOF/250101\n" })));
        assert_eq!(message.shr(), Some("  -DOF/250101\n"));
    }

    #[test]
    fn test_new_and_with_region() {
        let message = FlightMessage::new(Some("s"), None, Some("a")).with_region("R");
        assert_eq!(message.shr(), Some("s"));
        assert_eq!(message.dep(), None);
        assert_eq!(message.arr(), Some("a"));
        assert_eq!(message.region(), Some("R"));
        assert!(!message.is_empty());
    }

    #[test]
    fn test_serialization_uses_source_keys() {
        let message = FlightMessage::new(Some("s"), None, None).with_region("R");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["SHR"], "s");
        assert_eq!(json["DEP"], Value::Null);
        assert_eq!(json["center"], "R");

        let back: FlightMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, message);
    }
}
