//! Vehicle type detection.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Category keywords recognised when no `TYP/` marker is present.
pub const DEFAULT_VEHICLE_KEYWORDS: &[&str] = &["BLA", "AER", "SHAR"];

static TYPE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bTYP/([A-Z0-9_-]+)").expect("valid TYP marker regex"));

/// Detects the vehicle type from a `TYP/<code>` marker or a category keyword.
#[derive(Debug, Clone)]
pub struct VehicleRules {
    keywords: Vec<(String, Regex)>,
}

impl Default for VehicleRules {
    fn default() -> Self {
        Self::new(DEFAULT_VEHICLE_KEYWORDS.iter().copied())
    }
}

impl VehicleRules {
    /// Create rules matching the given keywords as whole words, in order.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_uppercase())
            .filter(|k| !k.is_empty())
            .filter_map(|k| match Regex::new(&format!(r"\b{}\b", regex::escape(&k))) {
                Ok(r) => Some((k, r)),
                Err(e) => {
                    warn!(keyword = %k, error = %e, "Invalid vehicle keyword");
                    None
                }
            })
            .collect();
        Self { keywords }
    }

    /// Detect the vehicle type, checking each block in turn.
    ///
    /// Within a block the `TYP/` marker is checked before the keywords.
    #[must_use]
    pub fn detect(&self, blocks: &[Option<&str>]) -> Option<String> {
        blocks
            .iter()
            .flatten()
            .find_map(|text| self.detect_in(&text.to_uppercase()))
    }

    fn detect_in(&self, upper: &str) -> Option<String> {
        if let Some(code) = TYPE_MARKER.captures(upper).and_then(|caps| caps.get(1)) {
            return Some(code.as_str().to_string());
        }
        self.keywords
            .iter()
            .find(|(_, regex)| regex.is_match(upper))
            .map(|(keyword, _)| keyword.clone())
    }
}
