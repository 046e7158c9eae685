//! # Unit Types
//!
//! Type-safe wrappers for the quantities the calculators deal in: money,
//! garden area, lengths and body mass. They are plain f64 newtypes so
//! JSON stays clean (just numbers).
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{Dollars, Inches, Centimeters, Pounds, Kilograms};
//!
//! let height: Centimeters = Inches(70.0).into();
//! assert!((height.0 - 177.8).abs() < 1e-9);
//!
//! let weight: Kilograms = Pounds(150.0).into();
//! assert!((weight.0 - 68.04).abs() < 0.01);
//!
//! assert_eq!(Dollars(-48.2).to_string(), "-$48.20");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};

/// Round to two decimal places (cents).
///
/// Used exactly once per estimate, on the final total.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Money
// ============================================================================

/// Amount in US dollars. Unrounded; round only for display or totals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dollars(pub f64);

impl Dollars {
    pub const ZERO: Dollars = Dollars(0.0);

    /// Rounded to cents
    pub fn rounded(self) -> Self {
        Dollars(round2(self.0))
    }
}

impl fmt::Display for Dollars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = (self.0.abs() * 100.0).round() as u64;
        let whole = (cents / 100).to_string();
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0.0 && cents > 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, grouped, cents % 100)
    }
}

impl Sum for Dollars {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Dollars(iter.map(|d| d.0).sum())
    }
}

// ============================================================================
// Area and Length
// ============================================================================

/// Area in square feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareFeet(pub f64);

impl SquareFeet {
    /// Number of 100 sq ft blocks, the unit amendment rates are quoted in
    pub fn hundreds(self) -> f64 {
        self.0 / 100.0
    }
}

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

impl From<Inches> for Centimeters {
    fn from(inches: Inches) -> Self {
        Centimeters(inches.0 * 2.54)
    }
}

impl From<Centimeters> for Inches {
    fn from(cm: Centimeters) -> Self {
        Inches(cm.0 / 2.54)
    }
}

// ============================================================================
// Mass
// ============================================================================

/// Mass in pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pounds(pub f64);

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

const KG_PER_LB: f64 = 0.453_592_37;

impl From<Pounds> for Kilograms {
    fn from(lb: Pounds) -> Self {
        Kilograms(lb.0 * KG_PER_LB)
    }
}

impl From<Kilograms> for Pounds {
    fn from(kg: Kilograms) -> Self {
        Pounds(kg.0 / KG_PER_LB)
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

impl_arithmetic!(Dollars);
impl_arithmetic!(SquareFeet);
impl_arithmetic!(Inches);
impl_arithmetic!(Centimeters);
impl_arithmetic!(Pounds);
impl_arithmetic!(Kilograms);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(433.8000000001), 433.8);
        assert_eq!(round2(48.199999999), 48.2);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(-48.2), -48.2);
    }

    #[test]
    fn test_dollars_display() {
        assert_eq!(Dollars(482.0).to_string(), "$482.00");
        assert_eq!(Dollars(1234567.891).to_string(), "$1,234,567.89");
        assert_eq!(Dollars(-48.2).to_string(), "-$48.20");
        assert_eq!(Dollars(-0.001).to_string(), "$0.00");
    }

    #[test]
    fn test_dollars_sum() {
        let total: Dollars = vec![Dollars(455.0), Dollars(15.0), Dollars(12.0)].into_iter().sum();
        assert_eq!(total, Dollars(482.0));
    }

    #[test]
    fn test_conversions() {
        let kg: Kilograms = Pounds(100.0).into();
        assert!((kg.0 - 45.359237).abs() < 1e-9);
        let back: Pounds = kg.into();
        assert!((back.0 - 100.0).abs() < 1e-9);

        let inches: Inches = Centimeters(254.0).into();
        assert!((inches.0 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hundreds() {
        assert_eq!(SquareFeet(250.0).hundreds(), 2.5);
    }

    #[test]
    fn test_serialization() {
        let area = SquareFeet(250.0);
        let json = serde_json::to_string(&area).unwrap();
        assert_eq!(json, "250.0");
    }
}
