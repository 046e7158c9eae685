//! # Estimation Engine
//!
//! Turns one validated input plus static rule tables into an itemized
//! [`Estimate`]. Each calculator implements [`Estimator`] to describe its
//! pricing declaratively; the engine owns the order of operations:
//!
//! 1. Base amount from the primary categorical key(s)
//! 2. Multiplicative modifiers, in the estimator's declared order
//! 3. Conditional fees, in declaration order, one line item each
//! 4. Requested add-ons, one line item each
//! 5. Percentage discount off the running subtotal (capped)
//! 6. Flat credit, floored so the total never goes below zero
//! 7. Round the total to cents, once
//!
//! Advice is a second, independent pass over the input and never touches
//! the total.
//!
//! Estimation is a pure function: no I/O, no shared mutable state.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::spay_neuter::{SpayNeuter, SpayNeuterInput};
//! use calc_core::engine;
//! use calc_core::rules;
//!
//! let tables = rules::builtin().unwrap();
//! let mut input = SpayNeuterInput::new("dog", "female", "10-25");
//! input.include_pain_medication = true;
//! input.include_e_collar = true;
//!
//! let estimate = engine::estimate::<SpayNeuter>(&input, &tables.spay_neuter).unwrap();
//! assert_eq!(estimate.total.0, 482.0);
//! assert_eq!(estimate.line_items.len(), 3);
//! ```

pub mod compare;
pub mod plan;
pub mod result;

use tracing::{debug, trace, warn};

use crate::errors::CalcResult;
use crate::units::{round2, Dollars};

pub use compare::{compare_all, compare_across, Dimension};
pub use plan::{Charge, ConditionalFee, Multiplier, PercentDiscount, PricingPlan};
pub use result::{
    Advice, AdviceKind, ComparisonRow, ComparisonTable, Estimate, LineItem, LineItemKind, ReferenceFigure,
};

/// A calculator built on the estimation engine.
///
/// Implementors are unit structs; every method is a pure function of the
/// input and the tables.
pub trait Estimator {
    /// Input record, cloned once per comparison row
    type Input: Clone;
    /// Rule tables this estimator reads
    type Tables;

    /// Short identifier, e.g. "spay_neuter"
    const NAME: &'static str;

    /// Dimensions compared across every row on each estimate
    const DEFAULT_COMPARISONS: &'static [&'static str] = &[];

    /// Range-check numeric fields.
    fn validate(input: &Self::Input) -> CalcResult<()>;

    /// Resolve categorical fields and describe the price.
    fn plan(input: &Self::Input, tables: &Self::Tables) -> CalcResult<PricingPlan<Self::Input>>;

    /// Recommendations and warnings. Order within a kind is preserved.
    fn advise(input: &Self::Input, tables: &Self::Tables) -> Vec<Advice>;

    /// Look up a comparable dimension by input field name.
    fn dimension<'t>(tables: &'t Self::Tables, key: &str) -> CalcResult<Dimension<'t, Self::Input>>;

    /// Benchmark figures shown beside the estimate.
    fn references(_input: &Self::Input, _tables: &Self::Tables) -> CalcResult<Vec<ReferenceFigure>> {
        Ok(Vec::new())
    }
}

/// Line items and rounded total for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Priced {
    pub line_items: Vec<LineItem>,
    pub total: Dollars,
}

/// Estimate one input.
///
/// # Errors
///
/// - `CalcError::Domain` if a numeric field is outside its range
/// - `CalcError::UnknownCategory` if a categorical field has no rule table row
pub fn estimate<E: Estimator>(input: &E::Input, tables: &E::Tables) -> CalcResult<Estimate> {
    let priced = price_input::<E>(input, tables)?;

    let mut comparisons = Vec::with_capacity(E::DEFAULT_COMPARISONS.len());
    for dimension in E::DEFAULT_COMPARISONS {
        comparisons.push(compare_all::<E>(dimension, input, tables)?);
    }

    let references = E::references(input, tables)?;

    let mut advice = E::advise(input, tables);
    advice.sort_by_key(|a| a.kind);

    debug!(
        calculator = E::NAME,
        line_items = priced.line_items.len(),
        total = priced.total.0,
        "estimate complete"
    );

    Ok(Estimate {
        calculator: E::NAME.to_string(),
        total: priced.total,
        line_items: priced.line_items,
        comparisons,
        references,
        advice,
    })
}

/// Validate, plan and price without comparisons or advice.
pub(crate) fn price_input<E: Estimator>(input: &E::Input, tables: &E::Tables) -> CalcResult<Priced> {
    E::validate(input)?;
    let plan = E::plan(input, tables)?;
    Ok(price(&plan, input))
}

/// Apply a pricing plan to an input.
pub fn price<I>(plan: &PricingPlan<I>, input: &I) -> Priced {
    let mut line_items = Vec::new();

    let mut base = plan.base.amount;
    for m in &plan.multipliers {
        base = base * m.factor;
    }
    line_items.push(LineItem::new(
        LineItemKind::Base,
        plan.base.label.clone(),
        base,
        base_note(plan),
    ));
    let mut running = base;

    for fee in &plan.fees {
        if (fee.applies)(input) {
            trace!(fee = %fee.label, amount = fee.amount.0, "conditional fee applies");
            running = running + fee.amount;
            line_items.push(LineItem::new(
                LineItemKind::ConditionalFee,
                fee.label.clone(),
                fee.amount,
                fee.note.clone(),
            ));
        }
    }

    for add_on in &plan.add_ons {
        running = running + add_on.amount;
        line_items.push(LineItem::new(
            LineItemKind::AddOn,
            add_on.label.clone(),
            add_on.amount,
            add_on.note.clone(),
        ));
    }

    if let Some(discount) = &plan.discount {
        let rate = discount.rate();
        if rate > 0.0 {
            let amount = running * rate;
            line_items.push(LineItem::new(
                LineItemKind::Discount,
                discount.label.clone(),
                Dollars(-amount.0),
                format!("{:.0}% off {}", rate * 100.0, running.rounded()),
            ));
            running = running - amount;
        }
    }

    if let Some(credit) = &plan.credit {
        let applied = credit.amount.0.min(running.0).max(0.0);
        if applied < credit.amount.0 {
            warn!(
                credit = credit.amount.0,
                applied,
                "credit exceeds subtotal, total floored at zero"
            );
        }
        if applied > 0.0 {
            line_items.push(LineItem::new(
                LineItemKind::Credit,
                credit.label.clone(),
                Dollars(-applied),
                credit.note.clone(),
            ));
        }
    }

    let sum: Dollars = line_items.iter().map(|item| item.amount).sum();
    Priced {
        line_items,
        total: Dollars(round2(sum.0)),
    }
}

fn base_note<I>(plan: &PricingPlan<I>) -> String {
    if plan.multipliers.is_empty() {
        return plan.base.note.clone();
    }
    let factors: Vec<String> = plan
        .multipliers
        .iter()
        .map(|m| format!("{} x{:.2}", m.name, m.factor))
        .collect();
    let applied = format!("{} base, {}", plan.base.amount.rounded(), factors.join(", "));
    if plan.base.note.is_empty() {
        applied
    } else {
        format!("{}; {}", plan.base.note, applied)
    }
}
