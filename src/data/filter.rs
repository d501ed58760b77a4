use std::collections::{BTreeMap, BTreeSet};

use super::model::{columns, CatalogRow, CatalogTable, CellValue};
use crate::error::InputError;

// ---------------------------------------------------------------------------
// Predicates: what a column value must satisfy
// ---------------------------------------------------------------------------

/// A row-selection condition on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Cell equals the value. Integer and float cells compare numerically.
    Equals(CellValue),
    /// Numeric cell within `[min, max]`.
    Range { min: f64, max: f64 },
    /// Numeric cell strictly greater than zero and finite.
    Positive,
    /// Numeric cell that is finite.
    Finite,
    /// Cell equals one of the listed values, compared like `Equals`.
    OneOf(BTreeSet<CellValue>),
}

impl Predicate {
    /// Whether `value` satisfies the predicate. A row without the cell never does.
    pub fn matches(&self, value: Option<&CellValue>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            Predicate::Equals(expected) => cells_equal(expected, value),
            Predicate::Range { min, max } => value
                .as_f64()
                .is_some_and(|v| v >= *min && v <= *max),
            Predicate::Positive => value.as_f64().is_some_and(|v| v.is_finite() && v > 0.0),
            Predicate::Finite => value.as_f64().is_some_and(f64::is_finite),
            Predicate::OneOf(selected) => selected.iter().any(|s| cells_equal(s, value)),
        }
    }
}

/// Integer and float cells compare as numbers, everything else structurally.
fn cells_equal(a: &CellValue, b: &CellValue) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Per-column predicates, combined with logical AND.
/// An empty map selects every row.
pub type FilterSpec = BTreeMap<String, Predicate>;

/// `Z` within `[min, max]`.
pub fn redshift_range(min: f64, max: f64) -> (String, Predicate) {
    (columns::Z.to_string(), Predicate::Range { min, max })
}

/// `ZWARN == 0`, the redshift fit raised no warning.
pub fn zwarn_ok() -> (String, Predicate) {
    (
        columns::ZWARN.to_string(),
        Predicate::Equals(CellValue::Integer(0)),
    )
}

fn row_passes(row: &CatalogRow, spec: &FilterSpec) -> bool {
    spec.iter()
        .all(|(col, predicate)| predicate.matches(row.value(col).as_ref()))
}

/// Return indices of rows that pass every predicate, in table order.
///
/// Fails before looking at any row if a predicate names a column the
/// table's schema does not have.
pub fn filtered_indices(table: &CatalogTable, spec: &FilterSpec) -> Result<Vec<usize>, InputError> {
    for col in spec.keys() {
        table.require_column(col)?;
    }

    Ok(table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row_passes(row, spec))
        .map(|(i, _)| i)
        .collect())
}

/// Reduce `table` to the rows passing every predicate.
pub fn apply_filters(table: &CatalogTable, spec: &FilterSpec) -> Result<CatalogTable, InputError> {
    if spec.is_empty() {
        return Ok(table.clone());
    }
    let indices = filtered_indices(table, spec)?;
    let rows = indices
        .into_iter()
        .map(|i| table.rows()[i].clone())
        .collect();
    let filtered = table.with_rows(rows);
    log::debug!(
        "filter {} {}: {} of {} rows kept",
        table.tracer(),
        table.region(),
        filtered.len(),
        table.len()
    );
    Ok(filtered)
}
