//! Declarative pricing plans.
//!
//! An estimator describes *what* contributes to a price; the engine decides
//! the order in which those contributions are applied.
//!
//! ```rust
//! use calc_core::engine::plan::{Charge, PercentDiscount, PricingPlan};
//! use calc_core::units::Dollars;
//!
//! struct Order { rush: bool }
//!
//! let plan: PricingPlan<Order> = PricingPlan::new(Charge::new("Widget", Dollars(100.0), ""))
//!     .with_multiplier("region", "West Coast", 1.25)
//!     .with_fee("Rush handling", Dollars(20.0), "", |o: &Order| o.rush)
//!     .with_add_on(Charge::new("Gift wrap", Dollars(5.0), ""))
//!     .with_discount(PercentDiscount::new("Bulk", 0.05, 2, 0.20));
//! ```

use crate::units::Dollars;

/// A labeled flat amount: the base, an add-on, or a credit.
#[derive(Debug, Clone, PartialEq)]
pub struct Charge {
    pub label: String,
    pub amount: Dollars,
    pub note: String,
}

impl Charge {
    pub fn new(label: impl Into<String>, amount: Dollars, note: impl Into<String>) -> Self {
        Charge {
            label: label.into(),
            amount,
            note: note.into(),
        }
    }
}

/// Multiplicative factor from one categorical dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Multiplier {
    /// Input field the factor came from
    pub dimension: String,
    /// Display name of the selected row
    pub name: String,
    pub factor: f64,
}

/// Fixed fee added when `applies` holds for the input.
pub struct ConditionalFee<I> {
    pub label: String,
    pub amount: Dollars,
    pub note: String,
    pub applies: Box<dyn Fn(&I) -> bool>,
}

/// `rate_per_unit * units`, capped at `cap`.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentDiscount {
    pub label: String,
    pub rate_per_unit: f64,
    pub units: u32,
    pub cap: f64,
}

impl PercentDiscount {
    pub fn new(label: impl Into<String>, rate_per_unit: f64, units: u32, cap: f64) -> Self {
        PercentDiscount {
            label: label.into(),
            rate_per_unit,
            units,
            cap,
        }
    }

    /// Effective rate as a fraction in `0.0..=cap`
    pub fn rate(&self) -> f64 {
        (self.rate_per_unit * f64::from(self.units)).min(self.cap).max(0.0)
    }
}

/// Everything that contributes to one price.
pub struct PricingPlan<I> {
    pub base: Charge,
    /// Applied to the base in this order
    pub multipliers: Vec<Multiplier>,
    /// Evaluated in this order
    pub fees: Vec<ConditionalFee<I>>,
    pub add_ons: Vec<Charge>,
    pub discount: Option<PercentDiscount>,
    pub credit: Option<Charge>,
}

impl<I> PricingPlan<I> {
    pub fn new(base: Charge) -> Self {
        PricingPlan {
            base,
            multipliers: Vec::new(),
            fees: Vec::new(),
            add_ons: Vec::new(),
            discount: None,
            credit: None,
        }
    }

    pub fn with_multiplier(mut self, dimension: impl Into<String>, name: impl Into<String>, factor: f64) -> Self {
        self.multipliers.push(Multiplier {
            dimension: dimension.into(),
            name: name.into(),
            factor,
        });
        self
    }

    pub fn with_fee<F>(mut self, label: impl Into<String>, amount: Dollars, note: impl Into<String>, applies: F) -> Self
    where
        F: Fn(&I) -> bool + 'static,
    {
        self.fees.push(ConditionalFee {
            label: label.into(),
            amount,
            note: note.into(),
            applies: Box::new(applies),
        });
        self
    }

    pub fn with_add_on(mut self, add_on: Charge) -> Self {
        self.add_ons.push(add_on);
        self
    }

    pub fn with_discount(mut self, discount: PercentDiscount) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_credit(mut self, credit: Charge) -> Self {
        self.credit = Some(credit);
        self
    }

    /// Combined product of all multipliers
    pub fn combined_factor(&self) -> f64 {
        self.multipliers.iter().fold(1.0, |acc, m| acc * m.factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_rate_capped() {
        assert_eq!(PercentDiscount::new("d", 0.05, 0, 0.20).rate(), 0.0);
        assert!((PercentDiscount::new("d", 0.05, 2, 0.20).rate() - 0.10).abs() < 1e-12);
        assert_eq!(PercentDiscount::new("d", 0.05, 10, 0.20).rate(), 0.20);
    }

    #[test]
    fn test_combined_factor() {
        let plan: PricingPlan<()> = PricingPlan::new(Charge::new("base", Dollars(10.0), ""))
            .with_multiplier("a", "A", 2.0)
            .with_multiplier("b", "B", 0.5)
            .with_multiplier("c", "C", 1.5);
        assert_eq!(plan.combined_factor(), 1.5);
    }
}
