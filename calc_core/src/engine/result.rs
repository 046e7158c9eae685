//! Output types produced by the estimation engine.

use serde::{Deserialize, Serialize};

use crate::units::Dollars;

/// Which pricing stage produced a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineItemKind {
    /// Base amount after all multiplicative modifiers
    Base,
    /// Fee triggered by a condition on the input
    ConditionalFee,
    /// Optional add-on requested by the caller
    AddOn,
    /// Percentage discount off the running subtotal (negative)
    Discount,
    /// Flat credit or reimbursement (negative)
    Credit,
}

/// One row of the itemized breakdown.
///
/// `amount` is stored unrounded; use [`LineItem::display_amount`] for output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: LineItemKind,
    pub label: String,
    pub amount: Dollars,
    pub note: String,
}

impl LineItem {
    pub fn new(kind: LineItemKind, label: impl Into<String>, amount: Dollars, note: impl Into<String>) -> Self {
        LineItem {
            kind,
            label: label.into(),
            amount,
            note: note.into(),
        }
    }

    /// Amount rounded to cents
    pub fn display_amount(&self) -> Dollars {
        self.amount.rounded()
    }
}

/// Category of an advice message. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdviceKind {
    /// Physiological or safety condition
    Warning,
    /// Way to lower the cost
    SavingTip,
    /// What to do next
    NextStep,
}

/// A recommendation or warning derived from the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    pub kind: AdviceKind,
    pub message: String,
}

impl Advice {
    pub fn warning(message: impl Into<String>) -> Self {
        Advice {
            kind: AdviceKind::Warning,
            message: message.into(),
        }
    }

    pub fn saving_tip(message: impl Into<String>) -> Self {
        Advice {
            kind: AdviceKind::SavingTip,
            message: message.into(),
        }
    }

    pub fn next_step(message: impl Into<String>) -> Self {
        Advice {
            kind: AdviceKind::NextStep,
            message: message.into(),
        }
    }
}

/// One alternative in a comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Rule table key of this alternative
    pub value: String,
    /// Display name
    pub name: String,
    /// Total with only this dimension changed
    pub total: Dollars,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    /// Whether this is the value in the caller's input
    pub selected: bool,
}

/// Totals for each alternative of one input dimension, all else held fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// Input field that was varied (e.g. "clinic_tier")
    pub dimension: String,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Row with the lowest total (first one on ties)
    pub fn cheapest(&self) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .fold(None, |best: Option<&ComparisonRow>, row| match best {
                Some(b) if b.total.0 <= row.total.0 => Some(b),
                _ => Some(row),
            })
    }

    /// Row for a given key
    pub fn row(&self, value: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.value == value)
    }

    /// The row matching the caller's input
    pub fn selected(&self) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.selected)
    }
}

/// A benchmark figure shown next to the estimate (e.g. national average).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFigure {
    pub label: String,
    pub amount: Dollars,
    pub note: String,
}

/// Complete output of one estimation call.
///
/// ## JSON Example
///
/// ```json
/// {
///   "calculator": "spay_neuter",
///   "total": 482.0,
///   "line_items": [
///     { "kind": "Base", "label": "Spay - Dog (10-25 lbs)", "amount": 455.0, "note": "..." },
///     { "kind": "AddOn", "label": "Pain medication", "amount": 15.0, "note": "" },
///     { "kind": "AddOn", "label": "E-collar (cone)", "amount": 12.0, "note": "" }
///   ],
///   "comparisons": [],
///   "references": [],
///   "advice": []
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Which estimator produced this
    pub calculator: String,
    /// Final total, rounded to cents
    pub total: Dollars,
    pub line_items: Vec<LineItem>,
    pub comparisons: Vec<ComparisonTable>,
    pub references: Vec<ReferenceFigure>,
    /// Warnings first, then saving tips, then next steps
    pub advice: Vec<Advice>,
}

impl Estimate {
    /// Unrounded sum of every line item
    pub fn line_item_sum(&self) -> Dollars {
        self.line_items.iter().map(|item| item.amount).sum()
    }

    /// Line items produced by one stage
    pub fn items_of(&self, kind: LineItemKind) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(move |item| item.kind == kind)
    }

    /// Sum of the positive charges, before discounts and credits
    pub fn subtotal(&self) -> Dollars {
        self.line_items
            .iter()
            .filter(|item| !matches!(item.kind, LineItemKind::Discount | LineItemKind::Credit))
            .map(|item| item.amount)
            .sum()
    }

    /// Comparison table for a dimension, if one was attached
    pub fn comparison(&self, dimension: &str) -> Option<&ComparisonTable> {
        self.comparisons.iter().find(|c| c.dimension == dimension)
    }

    /// Advice messages of one kind
    pub fn advice_of(&self, kind: AdviceKind) -> impl Iterator<Item = &str> {
        self.advice
            .iter()
            .filter(move |a| a.kind == kind)
            .map(|a| a.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str, total: f64) -> ComparisonRow {
        ComparisonRow {
            value: value.to_string(),
            name: value.to_string(),
            total: Dollars(total),
            pros: vec![],
            cons: vec![],
            selected: value == "b",
        }
    }

    #[test]
    fn test_cheapest_prefers_first_on_tie() {
        let table = ComparisonTable {
            dimension: "tier".to_string(),
            rows: vec![row("a", 300.0), row("b", 120.0), row("c", 120.0)],
        };
        assert_eq!(table.cheapest().unwrap().value, "b");
        assert_eq!(table.selected().unwrap().value, "b");
        assert!(table.row("z").is_none());
    }

    #[test]
    fn test_advice_kind_order() {
        assert!(AdviceKind::Warning < AdviceKind::SavingTip);
        assert!(AdviceKind::SavingTip < AdviceKind::NextStep);
    }

    #[test]
    fn test_display_amount_rounds() {
        let item = LineItem::new(LineItemKind::Discount, "Multi-pet", Dollars(-48.19999999), "");
        assert_eq!(item.display_amount(), Dollars(-48.2));
    }
}
