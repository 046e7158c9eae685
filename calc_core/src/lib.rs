//! # calc_core - Calculator Estimation Engine
//!
//! `calc_core` powers the Calcverse calculators: table-driven cost
//! estimates with itemized line items, side-by-side comparisons and
//! advice. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Data, not code**: Prices and thresholds live in embedded TOML tables
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::calculations::spay_neuter::{self, SpayNeuterInput};
//! use calc_core::rules;
//!
//! let tables = rules::builtin().unwrap();
//! let mut input = SpayNeuterInput::new("dog", "female", "10-25");
//! input.include_pain_medication = true;
//! input.include_e_collar = true;
//!
//! let estimate = spay_neuter::estimate(&input, &tables.spay_neuter).unwrap();
//! assert_eq!(estimate.total.to_string(), "$482.00");
//!
//! // Serialize to JSON for transmission
//! let json = serde_json::to_string_pretty(&estimate).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - Estimator trait, pricing plans, comparisons
//! - [`calculations`] - Spay/neuter, crop rotation and BMI calculators
//! - [`rules`] - Embedded reference tables
//! - [`input`] - Parsing and sanitizing raw form values
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod engine;
pub mod errors;
pub mod input;
pub mod rules;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{CalculatorRequest, CalculatorResponse};
pub use engine::{Estimate, Estimator};
pub use errors::{CalcError, CalcResult};
pub use rules::RuleTables;
