//! Start and end position selection.
//!
//! Messages repeat positions under different markers, or with no marker at
//! all. Selection order:
//!
//! 1. `ADEPZ` in DEP, then SHR, for the start; `ADARRZ` in ARR, then SHR, for
//!    the end.
//! 2. Any coordinate-shaped token in DEP, ARR, SHR, in order of appearance:
//!    the first distinct positions fill whichever side is still missing.
//! 3. If only one side was found, the other side copies it.

use std::sync::LazyLock;

use regex::Regex;

use super::coordinate::{parse_coordinate, Coordinate, COORDINATE_SHAPE};

static DEPARTURE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bADEPZ[\s/:]*({COORDINATE_SHAPE})"))
        .expect("valid ADEPZ marker regex")
});

static ARRIVAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\bADARRZ[\s/:]*({COORDINATE_SHAPE})"))
        .expect("valid ADARRZ marker regex")
});

static ANY_COORDINATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){COORDINATE_SHAPE}")).expect("valid coordinate regex")
});

/// Start and end positions of a flight, each possibly unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Positions {
    /// Departure position.
    pub start: Option<Coordinate>,
    /// Arrival position.
    pub end: Option<Coordinate>,
}

/// Pick start and end positions from the three message blocks.
#[must_use]
pub fn locate(shr: Option<&str>, dep: Option<&str>, arr: Option<&str>) -> Positions {
    let mut start = marked(dep, &DEPARTURE_MARKER).or_else(|| marked(shr, &DEPARTURE_MARKER));
    let mut end = marked(arr, &ARRIVAL_MARKER).or_else(|| marked(shr, &ARRIVAL_MARKER));

    if start.is_none() || end.is_none() {
        let candidates = distinct_candidates([dep, arr, shr]);
        match (start, end) {
            (None, None) => {
                start = candidates.first().copied();
                end = candidates.get(1).copied();
            }
            (None, Some(known)) => start = first_other(&candidates, known),
            (Some(known), None) => end = first_other(&candidates, known),
            (Some(_), Some(_)) => {}
        }
    }

    // a lone position stands in for both ends
    match (start, end) {
        (Some(only), None) => end = Some(only),
        (None, Some(only)) => start = Some(only),
        _ => {}
    }

    Positions { start, end }
}

fn marked(text: Option<&str>, marker: &Regex) -> Option<Coordinate> {
    marker
        .captures_iter(text?)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_coordinate(m.as_str()))
}

fn distinct_candidates<const N: usize>(blocks: [Option<&str>; N]) -> Vec<Coordinate> {
    let mut found: Vec<Coordinate> = Vec::new();
    for text in blocks.into_iter().flatten() {
        for m in ANY_COORDINATE.find_iter(text) {
            if let Some(coordinate) = parse_coordinate(m.as_str()) {
                if !found.contains(&coordinate) {
                    found.push(coordinate);
                }
            }
        }
    }
    found
}

fn first_other(candidates: &[Coordinate], known: Coordinate) -> Option<Coordinate> {
    candidates.iter().copied().find(|c| *c != known)
}
