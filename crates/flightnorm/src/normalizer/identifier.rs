//! Flight identifier extraction.
//!
//! Messages carry the flight, aircraft or mission id in free text with
//! inconsistent markers. Extraction is an ordered list of rules over the
//! upper-cased text; the first rule that yields a usable token wins:
//!
//! 1. `REG/` (or `REG` and whitespace): the registration up to the next comma,
//!    slash or space.
//! 2. `SID/` followed by digits.
//! 3. The first registration-shaped token: 1-3 letters, optional hyphen, 2-6
//!    digits, up to 3 trailing alphanumerics (`RA-12345`, `FL999`). A marker
//!    glued to its value (`ATD0705`, `DOF250101`) does not count.
//! 4. The first alphanumeric token of 2-20 characters with at least one
//!    letter that is not a structural keyword or message marker.
//!
//! This is a best-effort heuristic, not a grammar.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::coordinate::parse_coordinate;

/// Structural keywords that are never identifiers.
pub const STRUCTURAL_KEYWORDS: &[&str] = &[
    "TITLE", "IDEP", "IARR", "ADEP", "ARR", "DEP", "PAP", "RMK", "SHR", "DOF", "DEST", "SID",
];

/// Registration-shaped tokens known to be speed/level noise.
pub const DEFAULT_NOISE_TOKENS: &[&str] = &["M0000", "K0300"];

/// Message marker words. Never identifiers, alone or glued to digits.
const MARKER_WORDS: &[&str] = &[
    "ATD", "ATA", "ADEPZ", "ADARR", "ADARRZ", "ADES", "ADESZ", "REG", "TYP", "OPR", "STS", "EET",
    "ORGN", "ZONA", "ZZZZ", "ZZZZZ",
];

static REG_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bREG[/\s]+([\p{L}\p{N}_-]+)").expect("valid REG marker regex")
});

static SID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bSID/([0-9]+)\b").expect("valid SID marker regex"));

static REGISTRATION_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{1,3}-?[0-9]{2,6}[A-Z0-9]{0,3})\b").expect("valid registration regex")
});

static PLAIN_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z0-9]{2,20}\b").expect("valid token regex"));

static DEFAULT_RULES: LazyLock<IdentifierRules> = LazyLock::new(IdentifierRules::default);

/// Extract the flight identifier from one message block using the default rules.
///
/// Returns `None` when no rule produces a token.
#[must_use]
pub fn extract_identifier(text: &str) -> Option<String> {
    DEFAULT_RULES.extract(text)
}

/// Identifier rules with a configurable noise-token list.
#[derive(Debug, Clone)]
pub struct IdentifierRules {
    noise: HashSet<String>,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_TOKENS.iter().copied())
    }
}

impl IdentifierRules {
    /// Create rules that additionally reject the given noise tokens.
    pub fn new<I, S>(noise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            noise: noise
                .into_iter()
                .map(|token| token.as_ref().trim().to_uppercase())
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }

    /// Apply the rules to one block of text.
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<String> {
        let upper = text.to_uppercase();
        registration_marker(&upper)
            .or_else(|| sid_marker(&upper))
            .or_else(|| self.registration_shape(&upper))
            .or_else(|| self.first_plain_token(&upper))
    }

    fn registration_shape(&self, upper: &str) -> Option<String> {
        REGISTRATION_SHAPE
            .find_iter(upper)
            .map(|m| m.as_str())
            .find(|token| {
                !is_structural(token) && !is_glued_marker(token) && !self.is_noise(token)
            })
            .map(str::to_string)
    }

    fn first_plain_token(&self, upper: &str) -> Option<String> {
        PLAIN_TOKEN
            .find_iter(upper)
            .map(|m| m.as_str())
            .find(|token| {
                token.chars().any(|c| c.is_ascii_alphabetic())
                    && !is_structural(token)
                    && !MARKER_WORDS.contains(token)
                    && !is_glued_marker(token)
                    && !self.is_noise(token)
                    && parse_coordinate(token).is_none()
            })
            .map(str::to_string)
    }

    fn is_noise(&self, token: &str) -> bool {
        self.noise.contains(token)
    }
}

fn registration_marker(upper: &str) -> Option<String> {
    let caps = REG_MARKER.captures(upper)?;
    let value = caps.get(1)?.as_str();
    if value.is_empty() || is_structural(value) {
        return None;
    }
    Some(value.to_string())
}

fn sid_marker(upper: &str) -> Option<String> {
    SID_MARKER
        .captures(upper)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_structural(token: &str) -> bool {
    STRUCTURAL_KEYWORDS.contains(&token)
}

/// A keyword or marker word followed directly by digits, e.g. `ATD0705`.
fn is_glued_marker(token: &str) -> bool {
    let split = token
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(token.len());
    let (word, rest) = token.split_at(split);
    !rest.is_empty()
        && rest.chars().all(|c| c.is_ascii_digit())
        && (is_structural(word) || MARKER_WORDS.contains(&word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reg_takes_first_comma_segment() {
        let text = "DOF/250101 OPR/X REG/FL123,FL124 SID/777777";
        assert_eq!(extract_identifier(text).as_deref(), Some("FL123"));
    }

    #[test]
    fn test_reg_with_space_separator() {
        assert_eq!(
            extract_identifier("-REG RA-0456 STS/SAR").as_deref(),
            Some("RA-0456")
        );
    }

    #[test]
    fn test_reg_stops_at_slash_and_paren() {
        assert_eq!(extract_identifier("REG/0267T/X").as_deref(), Some("0267T"));
        assert_eq!(extract_identifier("(SHR REG/AB12)").as_deref(), Some("AB12"));
    }

    #[test]
    fn test_reg_is_case_insensitive() {
        assert_eq!(extract_identifier("reg/fl777").as_deref(), Some("FL777"));
    }

    #[test]
    fn test_reg_blacklisted_value_falls_through_to_sid() {
        assert_eq!(
            extract_identifier("REG/DEP SID/7772187998").as_deref(),
            Some("7772187998")
        );
    }

    #[test]
    fn test_reg_requires_separator() {
        // REGION is not a REG marker
        assert_eq!(extract_identifier("REGION FL555").as_deref(), Some("FL555"));
    }

    #[test]
    fn test_sid_marker_beats_registration_shape() {
        assert_eq!(
            extract_identifier("RA-12345 SID/7772187998").as_deref(),
            Some("7772187998")
        );
    }

    #[test]
    fn test_reg_beats_sid() {
        assert_eq!(
            extract_identifier("SID/7772187998 REG/RF37012").as_deref(),
            Some("RF37012")
        );
    }

    #[test]
    fn test_registration_shape() {
        assert_eq!(
            extract_identifier("-TITLE IDEP RA-76543 ").as_deref(),
            Some("RA-76543")
        );
        assert_eq!(extract_identifier("OPR/X RF3701").as_deref(), Some("RF3701"));
    }

    #[test]
    fn test_registration_shape_skips_noise() {
        assert_eq!(
            extract_identifier("-M0000/M0005 K0300 RF1234").as_deref(),
            Some("M0005")
        );
        assert_eq!(extract_identifier("M0000 RF1234").as_deref(), Some("RF1234"));
    }

    #[test]
    fn test_custom_noise_tokens() {
        let rules = IdentifierRules::new(["M0000", "m0005"]);
        assert_eq!(
            rules.extract("-M0000/M0005 RF1234").as_deref(),
            Some("RF1234")
        );
    }

    #[test]
    fn test_fallback_first_plain_token() {
        assert_eq!(
            extract_identifier("-TITLE IDEP -ADEP ZZZZ BRAVO").as_deref(),
            Some("BRAVO")
        );
    }

    #[test]
    fn test_fallback_skips_markers_times_and_coordinates() {
        assert_eq!(extract_identifier("-ATD 0705 -ADEPZ 5957N02905E"), None);
        assert_eq!(extract_identifier("-ATA 1636 -ADARRZ 5957N02905E"), None);
    }

    #[test]
    fn test_fallback_skips_long_tokens() {
        assert_eq!(
            extract_identifier("ABCDEFGHIJKLMNOPQRSTUVWXYZ").as_deref(),
            None
        );
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert_eq!(extract_identifier(""), None);
        assert_eq!(extract_identifier("   \n "), None);
        assert_eq!(extract_identifier("-- // ,,"), None);
    }

    #[test]
    fn test_structural_keywords_never_returned() {
        for keyword in STRUCTURAL_KEYWORDS {
            assert_eq!(extract_identifier(keyword), None, "keyword {keyword}");
        }
    }

    #[test]
    fn test_glued_marker_is_not_an_identifier() {
        assert_eq!(extract_identifier("-ATD0705 -ADEPZ 5957N02905E"), None);
        assert_eq!(extract_identifier("-ATA1636 -ADARRZ 5957N02905E"), None);
        assert_eq!(extract_identifier("DOF250101"), None);
    }

    #[test]
    fn test_glued_marker_skipped_for_later_registration() {
        assert_eq!(
            extract_identifier("-ATD0705 RA-12345").as_deref(),
            Some("RA-12345")
        );
    }
}
