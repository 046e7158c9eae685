//! # BMI Calculator
//!
//! Body mass index with category and healthy weight range.
//!
//! ## Formula
//!
//! ```text
//! BMI = weight (kg) / height (m)^2
//! ```
//!
//! Imperial input (lb, in) is converted to metric first. The BMI is
//! reported to one decimal place and classified on that displayed value,
//! so a BMI shown as 25.0 is always "Overweight".
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::bmi::{self, BmiInput};
//! use calc_core::rules;
//!
//! let tables = rules::builtin().unwrap();
//! let result = bmi::calculate(&BmiInput::metric(70.0, 175.0), &tables.bmi).unwrap();
//! assert_eq!(result.bmi, 22.9);
//! assert_eq!(result.category, "normal");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Advice;
use crate::errors::{CalcError, CalcResult};
use crate::rules;
use crate::units::{Centimeters, Inches, Kilograms, Pounds};

pub const MIN_HEIGHT_CM: f64 = 50.0;
pub const MAX_HEIGHT_CM: f64 = 275.0;
pub const MIN_WEIGHT_KG: f64 = 2.0;
pub const MAX_WEIGHT_KG: f64 = 650.0;

const TABLE_NAME: &str = "bmi";

/// One BMI category. `upper` is exclusive; `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiCategory {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub upper: Option<f64>,
    pub healthy: bool,
    pub advice: String,
}

/// Category thresholds, ordered by upper bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiTables {
    pub healthy_min: f64,
    pub healthy_max: f64,
    pub categories: Vec<BmiCategory>,
}

impl BmiTables {
    /// Parse and validate from TOML.
    pub fn from_toml(text: &str) -> CalcResult<Self> {
        let tables: BmiTables = rules::parse_asset(TABLE_NAME, text)?;
        tables.validate()?;
        Ok(tables)
    }

    fn validate(&self) -> CalcResult<()> {
        let Some((last, bounded)) = self.categories.split_last() else {
            return Err(CalcError::rule_table(TABLE_NAME, "no categories defined"));
        };
        if last.upper.is_some() {
            return Err(CalcError::rule_table(TABLE_NAME, "last category must be unbounded"));
        }
        let mut previous = 0.0;
        for category in bounded {
            match category.upper {
                Some(upper) if upper.is_finite() && upper > previous => previous = upper,
                Some(upper) => {
                    return Err(CalcError::rule_table(
                        TABLE_NAME,
                        format!("category '{}' upper bound {} is not increasing", category.key, upper),
                    ))
                }
                None => {
                    return Err(CalcError::rule_table(
                        TABLE_NAME,
                        format!("only the last category may be unbounded, not '{}'", category.key),
                    ))
                }
            }
        }
        if !(self.healthy_min > 0.0 && self.healthy_min < self.healthy_max) {
            return Err(CalcError::rule_table(TABLE_NAME, "healthy range must be positive and ordered"));
        }
        Ok(())
    }

    /// First category whose upper bound `bmi` is below
    pub fn classify(&self, bmi: f64) -> Option<&BmiCategory> {
        self.categories
            .iter()
            .find(|c| c.upper.map_or(true, |upper| bmi < upper))
    }
}

/// Measurement system for weight and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// kg and cm
    #[default]
    Metric,
    /// lb and in
    Imperial,
}

impl UnitSystem {
    pub fn weight_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "kg",
            UnitSystem::Imperial => "lb",
        }
    }
}

/// Weight and height in one unit system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiInput {
    /// kg (metric) or lb (imperial)
    pub weight: f64,
    /// cm (metric) or in (imperial)
    pub height: f64,
    #[serde(default)]
    pub system: UnitSystem,
}

impl BmiInput {
    pub fn metric(weight_kg: f64, height_cm: f64) -> Self {
        BmiInput {
            weight: weight_kg,
            height: height_cm,
            system: UnitSystem::Metric,
        }
    }

    pub fn imperial(weight_lb: f64, height_in: f64) -> Self {
        BmiInput {
            weight: weight_lb,
            height: height_in,
            system: UnitSystem::Imperial,
        }
    }

    fn metric_values(&self) -> (Kilograms, Centimeters) {
        match self.system {
            UnitSystem::Metric => (Kilograms(self.weight), Centimeters(self.height)),
            UnitSystem::Imperial => (Pounds(self.weight).into(), Inches(self.height).into()),
        }
    }

    /// Range-check weight and height after conversion to metric.
    pub fn validate(&self) -> CalcResult<()> {
        let (weight, height) = self.metric_values();
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(CalcError::domain("weight", self.weight.to_string(), "Weight must be positive"));
        }
        if !self.height.is_finite() || self.height <= 0.0 {
            return Err(CalcError::domain("height", self.height.to_string(), "Height must be positive"));
        }
        if !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight.0) {
            return Err(CalcError::domain(
                "weight",
                self.weight.to_string(),
                format!("Weight is outside the plausible range for an adult ({} {})", self.weight, self.system.weight_unit()),
            ));
        }
        if !(MIN_HEIGHT_CM..=MAX_HEIGHT_CM).contains(&height.0) {
            return Err(CalcError::domain(
                "height",
                self.height.to_string(),
                "Height is outside the plausible range for an adult",
            ));
        }
        Ok(())
    }
}

/// Weight range for a healthy BMI at this height, in the input's units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthyRange {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
    /// One decimal place
    pub bmi: f64,
    /// Category key, e.g. "normal"
    pub category: String,
    pub category_name: String,
    pub healthy_range: HealthyRange,
    /// Weight to gain (positive) or lose (negative) to reach the healthy
    /// range, in the input's units; zero when already inside it
    pub weight_change: f64,
    pub advice: Vec<Advice>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute BMI, category and healthy weight range.
///
/// # Errors
///
/// `CalcError::Domain` if weight or height is non-positive or implausible.
pub fn calculate(input: &BmiInput, tables: &BmiTables) -> CalcResult<BmiResult> {
    input.validate()?;
    let (weight, height) = input.metric_values();
    let meters = height.0 / 100.0;
    let bmi = round1(weight.0 / (meters * meters));

    let category = tables
        .classify(bmi)
        .ok_or_else(|| CalcError::rule_table(TABLE_NAME, format!("no category for BMI {}", bmi)))?;

    let to_input_units = |kg: f64| match input.system {
        UnitSystem::Metric => kg,
        UnitSystem::Imperial => Pounds::from(Kilograms(kg)).0,
    };
    let min = round1(to_input_units(tables.healthy_min * meters * meters));
    let max = round1(to_input_units(tables.healthy_max * meters * meters));
    // Follows the category so the two never disagree at a rounded boundary
    let weight_change = if category.healthy {
        0.0
    } else if bmi < tables.healthy_min {
        round1(min - input.weight).max(0.1)
    } else {
        round1(max - input.weight).min(-0.1)
    };

    let mut advice = Vec::new();
    if category.healthy {
        advice.push(Advice::next_step(category.advice.clone()));
    } else {
        advice.push(Advice::warning(category.advice.clone()));
        let unit = input.system.weight_unit();
        if weight_change > 0.0 {
            advice.push(Advice::next_step(format!(
                "Gaining about {:.1} {} would reach the healthy range ({:.1}-{:.1} {}).",
                weight_change, unit, min, max, unit
            )));
        } else if weight_change < 0.0 {
            advice.push(Advice::next_step(format!(
                "Losing about {:.1} {} would reach the healthy range ({:.1}-{:.1} {}).",
                -weight_change, unit, min, max, unit
            )));
        }
    }
    advice.push(Advice::next_step(
        "BMI does not account for muscle mass, age or body shape; waist measurement adds context.",
    ));

    debug!(bmi, category = %category.key, "bmi calculated");

    Ok(BmiResult {
        bmi,
        category: category.key.clone(),
        category_name: category.name.clone(),
        healthy_range: HealthyRange {
            min,
            max,
            unit: input.system.weight_unit().to_string(),
        },
        weight_change,
        advice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AdviceKind;

    fn tables() -> &'static BmiTables {
        &rules::builtin().unwrap().bmi
    }

    #[test]
    fn test_metric_normal() {
        let result = calculate(&BmiInput::metric(70.0, 175.0), tables()).unwrap();
        assert_eq!(result.bmi, 22.9);
        assert_eq!(result.category, "normal");
        assert_eq!(result.weight_change, 0.0);
        assert_eq!(result.healthy_range.unit, "kg");
        assert_eq!(result.healthy_range.min, 56.7);
        assert_eq!(result.healthy_range.max, 76.3);
        assert!(result.advice.iter().all(|a| a.kind == AdviceKind::NextStep));
    }

    #[test]
    fn test_imperial_overweight() {
        let result = calculate(&BmiInput::imperial(200.0, 70.0), tables()).unwrap();
        assert_eq!(result.bmi, 28.7);
        assert_eq!(result.category, "overweight");
        assert_eq!(result.healthy_range.unit, "lb");
        assert!((result.healthy_range.max - 173.5).abs() < 0.11);
        assert!(result.weight_change < 0.0);
        assert_eq!(result.advice[0].kind, AdviceKind::Warning);
    }

    #[test]
    fn test_category_thresholds() {
        let t = tables();
        assert_eq!(t.classify(18.4).unwrap().key, "underweight");
        assert_eq!(t.classify(18.5).unwrap().key, "normal");
        assert_eq!(t.classify(24.9).unwrap().key, "normal");
        assert_eq!(t.classify(25.0).unwrap().key, "overweight");
        assert_eq!(t.classify(30.0).unwrap().key, "obese-1");
        assert_eq!(t.classify(35.0).unwrap().key, "obese-2");
        assert_eq!(t.classify(40.0).unwrap().key, "obese-3");
        assert_eq!(t.classify(75.0).unwrap().key, "obese-3");
    }

    #[test]
    fn test_boundary_overweight_still_gets_a_target() {
        // 24.95 displays as 25.0 while the weight sits on the rounded upper bound
        let result = calculate(&BmiInput::metric(20.21, 90.0), tables()).unwrap();
        assert_eq!(result.bmi, 25.0);
        assert_eq!(result.category, "overweight");
        assert_eq!(result.healthy_range.max, 20.2);
        assert_eq!(result.weight_change, -0.1);
        assert!(result.advice.iter().any(|a| a.message.starts_with("Losing about 0.1 kg")));
    }

    #[test]
    fn test_boundary_normal_has_no_weight_change() {
        let result = calculate(&BmiInput::metric(20.2, 90.0), tables()).unwrap();
        assert_eq!(result.category, "normal");
        assert_eq!(result.weight_change, 0.0);
    }

    #[test]
    fn test_underweight_gain_advice() {
        let result = calculate(&BmiInput::metric(50.0, 180.0), tables()).unwrap();
        assert_eq!(result.category, "underweight");
        assert!(result.weight_change > 0.0);
        assert!(result.advice.iter().any(|a| a.message.starts_with("Gaining about")));
    }

    #[test]
    fn test_domain_errors() {
        let err = calculate(&BmiInput::metric(0.0, 175.0), tables()).unwrap_err();
        assert_eq!(err.field(), Some("weight"));

        let err = calculate(&BmiInput::metric(70.0, -1.0), tables()).unwrap_err();
        assert_eq!(err.field(), Some("height"));

        let err = calculate(&BmiInput::metric(70.0, 400.0), tables()).unwrap_err();
        assert_eq!(err.field(), Some("height"));

        let err = calculate(&BmiInput::imperial(f64::NAN, 70.0), tables()).unwrap_err();
        assert_eq!(err.error_code(), "DOMAIN_ERROR");
    }

    #[test]
    fn test_unordered_categories_rejected() {
        let text = r#"
            healthy_min = 18.5
            healthy_max = 24.9
            [[categories]]
            key = "a"
            name = "A"
            upper = 30.0
            healthy = true
            advice = ""
            [[categories]]
            key = "b"
            name = "B"
            upper = 20.0
            healthy = false
            advice = ""
            [[categories]]
            key = "c"
            name = "C"
            healthy = false
            advice = ""
        "#;
        assert_eq!(BmiTables::from_toml(text).unwrap_err().error_code(), "RULE_TABLE_ERROR");
    }

    #[test]
    fn test_input_defaults_to_metric() {
        let input: BmiInput = serde_json::from_str(r#"{"weight": 70, "height": 175}"#).unwrap();
        assert_eq!(input.system, UnitSystem::Metric);
    }
}
