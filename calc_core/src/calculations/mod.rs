//! # Calculators
//!
//! Each calculator follows the pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable)
//! - `*Tables` - Reference data loaded from the embedded rule tables
//! - `estimate(input, tables)` or `calculate(input, tables)` - Pure function
//!
//! ## Available Calculators
//!
//! - [`spay_neuter`] - Pet spay/neuter cost estimator
//! - [`crop_rotation`] - Garden season budget and bed rotation planner
//! - [`bmi`] - Body mass index and healthy weight range

pub mod bmi;
pub mod crop_rotation;
pub mod spay_neuter;

use serde::{Deserialize, Serialize};

use crate::engine::Estimate;
use crate::errors::CalcResult;
use crate::rules::RuleTables;

pub use bmi::{BmiInput, BmiResult};
pub use crop_rotation::{CropRotationInput, RotationPlan};
pub use spay_neuter::SpayNeuterInput;

/// Any calculator's input, tagged by calculator name.
///
/// ```json
/// { "calculator": "bmi", "weight": 70, "height": 175 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculator", rename_all = "snake_case")]
pub enum CalculatorRequest {
    SpayNeuter(SpayNeuterInput),
    CropRotation(CropRotationInput),
    Bmi(BmiInput),
}

/// Output of [`CalculatorRequest::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum CalculatorResponse {
    Estimate(Estimate),
    Bmi(BmiResult),
}

impl CalculatorRequest {
    /// Calculator name as used in the `calculator` tag
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculatorRequest::SpayNeuter(_) => "spay_neuter",
            CalculatorRequest::CropRotation(_) => "crop_rotation",
            CalculatorRequest::Bmi(_) => "bmi",
        }
    }

    /// Run the matching calculator against `tables`.
    pub fn run(&self, tables: &RuleTables) -> CalcResult<CalculatorResponse> {
        match self {
            CalculatorRequest::SpayNeuter(input) => {
                spay_neuter::estimate(input, &tables.spay_neuter).map(CalculatorResponse::Estimate)
            }
            CalculatorRequest::CropRotation(input) => {
                crop_rotation::estimate(input, &tables.crop_rotation).map(CalculatorResponse::Estimate)
            }
            CalculatorRequest::Bmi(input) => bmi::calculate(input, &tables.bmi).map(CalculatorResponse::Bmi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;

    #[test]
    fn test_request_tag_roundtrip() {
        let json = r#"{"calculator": "bmi", "weight": 70, "height": 175}"#;
        let request: CalculatorRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.calc_type(), "bmi");
        let CalculatorResponse::Bmi(result) = request.run(rules::builtin().unwrap()).unwrap() else {
            panic!("expected a BMI response");
        };
        assert_eq!(result.category, "normal");
    }

    #[test]
    fn test_request_dispatches_estimate() {
        let json = r#"{"calculator": "spay_neuter", "species": "cat", "gender": "male", "weight_tier": "under-10"}"#;
        let request: CalculatorRequest = serde_json::from_str(json).unwrap();
        match request.run(rules::builtin().unwrap()).unwrap() {
            CalculatorResponse::Estimate(est) => assert_eq!(est.calculator, "spay_neuter"),
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_calculator_tag() {
        let json = r#"{"calculator": "mortgage", "principal": 1}"#;
        assert!(serde_json::from_str::<CalculatorRequest>(json).is_err());
    }
}
