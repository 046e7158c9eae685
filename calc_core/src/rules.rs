//! # Rule Tables
//!
//! Static reference data for every calculator: base costs, multipliers,
//! fee schedules, plant families and BMI thresholds. The data lives in
//! TOML assets under `calc_core/data/`, embedded at compile time and parsed
//! once on first use.
//!
//! Every categorical input resolves through [`RuleTable::resolve`], which
//! fails with `CalcError::UnknownCategory` rather than falling back to a
//! default row.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::rules;
//!
//! let tables = rules::builtin().unwrap();
//! let tier = tables.spay_neuter.clinic_tiers.resolve("clinic_tier", "private-practice").unwrap();
//! assert_eq!(tier.multiplier, 1.0);
//!
//! assert!(tables.spay_neuter.clinic_tiers.resolve("clinic_tier", "luxury-spa").is_err());
//! ```

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::calculations::bmi::BmiTables;
use crate::calculations::crop_rotation::CropRotationTables;
use crate::calculations::spay_neuter::SpayNeuterTables;
use crate::errors::{CalcError, CalcResult};

const SPAY_NEUTER_TOML: &str = include_str!("../data/spay_neuter.toml");
const CROP_ROTATION_TOML: &str = include_str!("../data/crop_rotation.toml");
const BMI_TOML: &str = include_str!("../data/bmi.toml");

static BUILTIN: Lazy<CalcResult<RuleTables>> = Lazy::new(|| {
    let tables = RuleTables::load();
    match &tables {
        Ok(_) => tracing::info!("rule tables loaded"),
        Err(e) => tracing::error!(error = %e, "rule tables failed to load"),
    }
    tables
});

/// The process-wide rule tables, parsed from the embedded assets on first call.
///
/// # Errors
///
/// `CalcError::RuleTable` if an embedded asset is malformed. The failure is
/// cached, so every call reports the same error.
pub fn builtin() -> CalcResult<&'static RuleTables> {
    BUILTIN.as_ref().map_err(Clone::clone)
}

/// Read-only mapping from a categorical key to a static record.
///
/// Keys are unique by construction (TOML rejects duplicate keys).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable<T> {
    rows: BTreeMap<String, T>,
}

impl<T> RuleTable<T> {
    /// Build a table from key/row pairs
    pub fn from_rows<K: Into<String>>(rows: impl IntoIterator<Item = (K, T)>) -> Self {
        RuleTable {
            rows: rows.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up `key`, reporting `field` in the error if it is absent.
    pub fn resolve(&self, field: &str, key: &str) -> CalcResult<&T> {
        self.rows
            .get(key)
            .ok_or_else(|| CalcError::unknown_category(field, key))
    }

    /// Whether `key` has a row
    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// All keys, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// All rows with their keys, in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row in a multiplicative dimension (clinic tier, region, soil type...).
///
/// `pros` and `cons` are the static text shown next to each alternative in
/// a comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRow {
    /// Display name
    pub name: String,
    /// Factor applied to the base amount
    pub multiplier: f64,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
}

impl DimensionRow {
    /// A row with no comparison text
    pub fn new(name: impl Into<String>, multiplier: f64) -> Self {
        DimensionRow {
            name: name.into(),
            multiplier,
            pros: Vec::new(),
            cons: Vec::new(),
        }
    }
}

/// "N% per extra unit, capped at M%", as fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub per_unit: f64,
    pub cap: f64,
}

impl DiscountRule {
    pub(crate) fn validate(&self, table_name: &str) -> CalcResult<()> {
        validate_non_negative(table_name, "discount per_unit", self.per_unit)?;
        if !(0.0..=1.0).contains(&self.cap) {
            return Err(CalcError::rule_table(
                table_name,
                format!("discount cap must be within 0..=1, got {}", self.cap),
            ));
        }
        Ok(())
    }
}

/// Check every multiplier in a dimension table is finite and positive.
pub(crate) fn validate_dimension(table_name: &str, table: &RuleTable<DimensionRow>) -> CalcResult<()> {
    if table.is_empty() {
        return Err(CalcError::rule_table(table_name, "table has no rows"));
    }
    for (key, row) in table.iter() {
        if !row.multiplier.is_finite() || row.multiplier <= 0.0 {
            return Err(CalcError::rule_table(
                table_name,
                format!("multiplier for '{}' must be positive, got {}", key, row.multiplier),
            ));
        }
    }
    Ok(())
}

/// Check a money or rate value is finite and not negative.
pub(crate) fn validate_non_negative(table_name: &str, what: &str, value: f64) -> CalcResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CalcError::rule_table(
            table_name,
            format!("{} must be non-negative, got {}", what, value),
        ));
    }
    Ok(())
}

/// Parse one TOML asset into its table type.
pub(crate) fn parse_asset<T: DeserializeOwned>(table_name: &str, text: &str) -> CalcResult<T> {
    toml::from_str(text).map_err(|e| CalcError::rule_table(table_name, e.to_string()))
}

/// Every calculator's reference data.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTables {
    pub spay_neuter: SpayNeuterTables,
    pub crop_rotation: CropRotationTables,
    pub bmi: BmiTables,
}

impl RuleTables {
    /// Parse and validate the embedded assets.
    pub fn load() -> CalcResult<Self> {
        Self::from_toml(SPAY_NEUTER_TOML, CROP_ROTATION_TOML, BMI_TOML)
    }

    /// Parse and validate tables from TOML text.
    pub fn from_toml(spay_neuter: &str, crop_rotation: &str, bmi: &str) -> CalcResult<Self> {
        Ok(RuleTables {
            spay_neuter: SpayNeuterTables::from_toml(spay_neuter)?,
            crop_rotation: CropRotationTables::from_toml(crop_rotation)?,
            bmi: BmiTables::from_toml(bmi)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> RuleTable<DimensionRow> {
        RuleTable::from_rows([
            ("budget", DimensionRow::new("Budget", 0.5)),
            ("standard", DimensionRow::new("Standard", 1.0)),
        ])
    }

    #[test]
    fn test_resolve_known_key() {
        let table = tiers();
        assert_eq!(table.resolve("tier", "budget").unwrap().multiplier, 0.5);
    }

    #[test]
    fn test_resolve_unknown_key_names_field() {
        let err = tiers().resolve("tier", "premium").unwrap_err();
        assert_eq!(err, CalcError::unknown_category("tier", "premium"));
    }

    #[test]
    fn test_keys_sorted() {
        let table = tiers();
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["budget", "standard"]);
    }

    #[test]
    fn test_validate_dimension_rejects_zero_multiplier() {
        let table = RuleTable::from_rows([("broken", DimensionRow::new("Broken", 0.0))]);
        assert!(validate_dimension("tiers", &table).is_err());
        assert!(validate_dimension("tiers", &tiers()).is_ok());
    }

    #[test]
    fn test_builtin_tables_load() {
        let tables = builtin().unwrap();
        assert!(!tables.spay_neuter.clinic_tiers.is_empty());
        assert!(!tables.crop_rotation.crops.is_empty());
        assert!(!tables.bmi.categories.is_empty());
    }

    #[test]
    fn test_malformed_asset_is_rule_table_error() {
        let err = RuleTables::from_toml("not = [valid", CROP_ROTATION_TOML, BMI_TOML).unwrap_err();
        assert_eq!(err.error_code(), "RULE_TABLE_ERROR");
    }
}
