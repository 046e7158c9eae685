//! # Validated Input Boundary
//!
//! Every raw string a user types passes through this module before it
//! reaches an estimator. Numbers come out finite and bounded; free text
//! comes out stripped of markup and script vectors.
//!
//! Estimators assume this has already run: they range-check numbers
//! against their own domains but never parse or sanitize strings.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::input::{parse_number, sanitize_text};
//!
//! assert_eq!(parse_number(" 250 "), Some(250.0));
//! assert_eq!(parse_number("1e11"), None);
//! assert_eq!(sanitize_text("<b>Rex</b>"), "bRex/b");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{CalcError, CalcResult};

/// Largest magnitude accepted from user input
pub const MAX_ABS_NUMBER: f64 = 1e10;

/// Maximum length of sanitized text, in characters
pub const MAX_TEXT_CHARS: usize = 1000;

static JAVASCRIPT_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("javascript URL pattern is a valid regex"));

static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon[a-z]+\s*=").expect("event handler pattern is a valid regex"));

/// Parse a user-entered number.
///
/// Returns `None` for empty input, unparseable text, NaN/infinity, and
/// anything with magnitude above [`MAX_ABS_NUMBER`].
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: f64 = trimmed.parse().ok()?;
    if !value.is_finite() || value.abs() > MAX_ABS_NUMBER {
        return None;
    }
    Some(value)
}

/// Parse a number and check it against an inclusive range.
///
/// # Errors
///
/// `CalcError::Domain` naming `field` when the text is not a valid number
/// or falls outside `min..=max`.
pub fn parse_in_range(field: &str, raw: &str, min: f64, max: f64) -> CalcResult<f64> {
    let value = parse_number(raw)
        .ok_or_else(|| CalcError::domain(field, raw.trim(), "Not a valid number"))?;
    if value < min || value > max {
        return Err(CalcError::domain(
            field,
            value.to_string(),
            format!("Must be between {} and {}", min, max),
        ));
    }
    Ok(value)
}

/// Strip markup and script vectors from free text.
///
/// Removes angle brackets, `javascript:` URLs and inline `on*=` handler
/// attributes, trims surrounding whitespace, and truncates to
/// [`MAX_TEXT_CHARS`] characters.
pub fn sanitize_text(raw: &str) -> String {
    let mut text: String = raw.chars().filter(|c| *c != '<' && *c != '>').collect();

    text = JAVASCRIPT_URL.replace_all(&text, "").into_owned();
    text = EVENT_HANDLER.replace_all(&text, "").into_owned();

    text.trim().chars().take(MAX_TEXT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_patterns_match() {
        assert!(JAVASCRIPT_URL.is_match("JavaScript :alert(1)"));
        assert!(EVENT_HANDLER.is_match("img onerror = x"));
        assert!(!EVENT_HANDLER.is_match("button one"));
    }

    #[test]
    fn test_parse_number_accepts_plain_values() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  -3.5\n"), Some(-3.5));
        assert_eq!(parse_number("1e10"), Some(1e10));
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("twelve"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("-1.5e10"), None);
    }

    #[test]
    fn test_parse_in_range() {
        assert_eq!(parse_in_range("soil_ph", "6.5", 3.0, 10.0).unwrap(), 6.5);

        let err = parse_in_range("soil_ph", "12", 3.0, 10.0).unwrap_err();
        assert_eq!(err.field(), Some("soil_ph"));

        let err = parse_in_range("area", "abc", 0.0, 10.0).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
    }

    #[test]
    fn test_sanitize_strips_brackets_and_scripts() {
        assert_eq!(sanitize_text("<script>alert(1)</script>"), "scriptalert(1)/script");
        assert_eq!(sanitize_text("JavaScript:alert(1)"), "alert(1)");
        assert_eq!(sanitize_text("img onerror=boom"), "img boom");
        assert_eq!(sanitize_text("  Bella  "), "Bella");
    }

    #[test]
    fn test_sanitize_leaves_ordinary_words() {
        // "one", "only" and "online" are not handler attributes
        assert_eq!(sanitize_text("only one online pet"), "only one online pet");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(MAX_TEXT_CHARS + 50);
        assert_eq!(sanitize_text(&long).chars().count(), MAX_TEXT_CHARS);
    }
}
