use std::collections::BTreeMap;

use crate::data::model::{CatalogRow, CatalogTable, TracerType};
use crate::error::InputError;

/// One row of a combined sample, tagged with the tracer it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    pub tracer: TracerType,
    pub row: CatalogRow,
}

/// Equal-sized slices of several tracer catalogs concatenated in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedSample {
    entries: Vec<SampleEntry>,
    per_tracer: usize,
}

impl CombinedSample {
    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    pub fn rows(&self) -> impl Iterator<Item = &CatalogRow> {
        self.entries.iter().map(|e| &e.row)
    }

    /// Rows taken from each input table.
    pub fn per_tracer(&self) -> usize {
        self.per_tracer
    }

    /// Row count per tracer label.
    pub fn counts(&self) -> BTreeMap<TracerType, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.tracer.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn redshifts(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.row.z).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Take the first `total / tables.len()` rows (integer division) from every
/// table and concatenate them. The result holds at most `total` rows.
///
/// A table shorter than its share is an error rather than a silent
/// truncation, so the per-tracer balance in the output is always exact.
pub fn combine_tracers(tables: &[CatalogTable], total: usize) -> Result<CombinedSample, InputError> {
    if tables.is_empty() {
        return Err(InputError::NoTables);
    }
    let per_tracer = total / tables.len();

    for table in tables {
        if table.len() < per_tracer {
            return Err(InputError::Shortfall {
                tracer: format!("{} {}", table.tracer(), table.region()),
                requested: per_tracer,
                available: table.len(),
            });
        }
    }

    let entries: Vec<SampleEntry> = tables
        .iter()
        .flat_map(|t| {
            t.rows()[..per_tracer].iter().map(move |row| SampleEntry {
                tracer: t.tracer().clone(),
                row: row.clone(),
            })
        })
        .collect();

    log::info!(
        "combined {} tracer tables: {} rows each, {} total (requested {total})",
        tables.len(),
        per_tracer,
        entries.len()
    );

    Ok(CombinedSample {
        entries,
        per_tracer,
    })
}
