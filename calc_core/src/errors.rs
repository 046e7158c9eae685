//! # Error Types
//!
//! Structured error types for calc_core. Every error names the field and
//! value that caused it so a calling UI can point the user at the exact
//! input to fix.
//!
//! None of these errors are transient: the engine performs no I/O, so
//! retrying the same input always fails the same way.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CalcResult};
//!
//! fn validate_area(area_sq_ft: f64) -> CalcResult<()> {
//!     if area_sq_ft <= 0.0 {
//!         return Err(CalcError::domain(
//!             "garden_area_sq_ft",
//!             area_sq_ft.to_string(),
//!             "Area must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for estimation operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A categorical input has no row in its rule table
    #[error("Unknown value for '{field}': '{value}' is not a known category")]
    UnknownCategory { field: String, value: String },

    /// A numeric input is outside its declared domain
    #[error("Invalid value for '{field}': {value} - {reason}")]
    Domain {
        field: String,
        value: String,
        reason: String,
    },

    /// An embedded rule table failed to parse or validate
    #[error("Rule table '{table}' is invalid: {reason}")]
    RuleTable { table: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl CalcError {
    /// Create an UnknownCategory error
    pub fn unknown_category(field: impl Into<String>, value: impl Into<String>) -> Self {
        CalcError::UnknownCategory {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a Domain error
    pub fn domain(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Domain {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a RuleTable error
    pub fn rule_table(table: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::RuleTable {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call could succeed. Always false.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// The input field this error points at, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::UnknownCategory { field, .. } | CalcError::Domain { field, .. } => Some(field),
            CalcError::RuleTable { .. } | CalcError::SerializationError { .. } => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            CalcError::Domain { .. } => "DOMAIN_ERROR",
            CalcError::RuleTable { .. } => "RULE_TABLE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        CalcError::SerializationError {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::unknown_category("species", "dragon");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"UnknownCategory\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::unknown_category("region", "Mars").error_code(), "UNKNOWN_CATEGORY");
        assert_eq!(CalcError::domain("number_of_pets", "0", "At least one pet").error_code(), "DOMAIN_ERROR");
        assert_eq!(CalcError::rule_table("bmi", "empty").error_code(), "RULE_TABLE_ERROR");
    }

    #[test]
    fn test_error_message_names_field_and_value() {
        let msg = CalcError::unknown_category("clinic_tier", "luxury-spa").to_string();
        assert!(msg.contains("clinic_tier"));
        assert!(msg.contains("luxury-spa"));
    }

    #[test]
    fn test_never_retryable() {
        assert!(!CalcError::domain("area", "-1", "negative").is_retryable());
        assert!(!CalcError::unknown_category("area", "moon").is_retryable());
    }

    #[test]
    fn test_field_accessor() {
        assert_eq!(CalcError::domain("soil_ph", "12", "too high").field(), Some("soil_ph"));
        assert_eq!(CalcError::rule_table("crop_rotation", "bad").field(), None);
    }
}
