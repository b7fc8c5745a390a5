//! Date and time extraction.
//!
//! Dates come from the `DOF` (date of flight) marker as `DDMMYY`. Clock times
//! come from `ATD` / `ATA` markers as 3 or 4 digits (`705` is 07:05, `1636` is
//! 16:36). Two-digit years are always read as `2000 + yy`.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

static DOF_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDOF[/\s]?([0-9]{6})\b").expect("valid DOF marker regex")
});

static ATD_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bATD[\s:/-]*([0-9]{3,4})\b").expect("valid ATD marker regex")
});

static ATA_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bATA[\s:/-]*([0-9]{3,4})\b").expect("valid ATA marker regex")
});

static BARE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{3,4})\b").expect("valid bare time regex"));

/// Which marker a clock time is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMarker {
    /// `ATD`, actual time of departure.
    Departure,
    /// `ATA`, actual time of arrival.
    Arrival,
}

impl TimeMarker {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Departure => &*ATD_MARKER,
            Self::Arrival => &*ATA_MARKER,
        }
    }
}

/// Extract the flight date as `DDMMYY` from a `DOF` marker.
#[must_use]
pub fn extract_date(text: &str) -> Option<String> {
    DOF_MARKER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract a clock time as `HH:MM`.
///
/// Tries the `ATD` marker, then `ATA`, then any standalone 3-4 digit run. A
/// candidate with hour >= 24 or minute >= 60 is skipped.
#[must_use]
pub fn extract_time(text: &str) -> Option<String> {
    extract_marked_time(text, TimeMarker::Departure)
        .or_else(|| extract_marked_time(text, TimeMarker::Arrival))
        .or_else(|| first_valid_time(&BARE_TIME, text))
}

/// Extract a clock time from one marker only, without the bare-digit fallback.
#[must_use]
pub fn extract_marked_time(text: &str, marker: TimeMarker) -> Option<String> {
    first_valid_time(marker.regex(), text)
}

fn first_valid_time(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_clock_digits(m.as_str()))
        .map(|(hour, minute)| format!("{hour:02}:{minute:02}"))
}

/// Read `HMM` or `HHMM` into hour and minute.
fn parse_clock_digits(digits: &str) -> Option<(u32, u32)> {
    let split = match digits.len() {
        3 => 1,
        4 => 2,
        _ => return None,
    };
    let hour: u32 = digits.get(..split)?.parse().ok()?;
    let minute: u32 = digits.get(split..)?.parse().ok()?;
    valid_clock(hour, minute)
}

/// Read `HH:MM` back into hour and minute.
fn parse_clock_text(time: &str) -> Option<(u32, u32)> {
    let (hour, minute) = time.trim().split_once(':')?;
    valid_clock(hour.parse().ok()?, minute.parse().ok()?)
}

fn valid_clock(hour: u32, minute: u32) -> Option<(u32, u32)> {
    (hour < 24 && minute < 60).then_some((hour, minute))
}

/// Combine a `DDMMYY` date and an optional `HH:MM` time into a UTC instant.
///
/// A missing or unreadable time means midnight. Returns `None` when the date is
/// missing, is not exactly six digits, or names an impossible calendar day.
#[must_use]
pub fn combine(date: Option<&str>, time: Option<&str>) -> Option<DateTime<Utc>> {
    let digits: String = date?.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 6 {
        return None;
    }

    let day: u32 = digits[0..2].parse().ok()?;
    let month: u32 = digits[2..4].parse().ok()?;
    let year = 2000 + digits[4..6].parse::<i32>().ok()?;
    let (hour, minute) = time.and_then(parse_clock_text).unwrap_or((0, 0));

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, 0)
        .map(|naive| naive.and_utc())
}

/// Seconds from `start` to `end`, or `None` if either is missing or `end`
/// precedes `start`.
#[must_use]
pub fn duration_between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<u64> {
    let seconds = (end? - start?).num_seconds();
    u64::try_from(seconds).ok()
}
