//! Side-by-side totals across the alternatives of one input dimension.

use tracing::debug;

use super::result::{ComparisonRow, ComparisonTable};
use super::{price_input, Estimator};
use crate::errors::CalcResult;
use crate::rules::{DimensionRow, RuleTable};

/// A categorical input field that can be varied for comparison.
pub struct Dimension<'t, I> {
    /// Input field name (e.g. "clinic_tier")
    pub key: &'static str,
    /// Rule table holding every alternative
    pub rows: &'t RuleTable<DimensionRow>,
    /// Read the field from an input
    pub get: fn(&I) -> &str,
    /// Overwrite the field on an input
    pub set: fn(&mut I, &str),
}

/// Re-price `rest` once per candidate value of `dimension_key`.
///
/// Every other field of `rest` is held fixed. Candidates are priced in the
/// order given.
///
/// # Errors
///
/// - `UnknownCategory { field: "dimension" }` if the estimator has no such dimension
/// - `UnknownCategory { field: dimension_key }` for a candidate missing from the table
/// - Any error pricing a candidate would produce
pub fn compare_across<E: Estimator, S: AsRef<str>>(
    dimension_key: &str,
    candidates: &[S],
    rest: &E::Input,
    tables: &E::Tables,
) -> CalcResult<ComparisonTable> {
    let dimension = E::dimension(tables, dimension_key)?;
    let current = (dimension.get)(rest).to_string();

    let mut rows = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let row = dimension.rows.resolve(dimension.key, candidate)?;

        let mut input = rest.clone();
        (dimension.set)(&mut input, candidate);
        let priced = price_input::<E>(&input, tables)?;

        rows.push(ComparisonRow {
            value: candidate.to_string(),
            name: row.name.clone(),
            total: priced.total,
            pros: row.pros.clone(),
            cons: row.cons.clone(),
            selected: candidate == current,
        });
    }

    debug!(
        calculator = E::NAME,
        dimension = dimension.key,
        rows = rows.len(),
        "comparison complete"
    );

    Ok(ComparisonTable {
        dimension: dimension.key.to_string(),
        rows,
    })
}

/// Compare across every row of the dimension's rule table.
pub fn compare_all<E: Estimator>(
    dimension_key: &str,
    rest: &E::Input,
    tables: &E::Tables,
) -> CalcResult<ComparisonTable> {
    let dimension = E::dimension(tables, dimension_key)?;
    let candidates: Vec<&str> = dimension.rows.keys().collect();
    compare_across::<E, _>(dimension_key, &candidates, rest, tables)
}
