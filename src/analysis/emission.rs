use std::fmt;

use super::stats::{correlation_summary, CorrelationSummary};
use crate::data::model::CatalogTable;
use crate::error::InputError;

/// Signal-to-noise floor used when none is configured.
pub const DEFAULT_MIN_SNR: f64 = 3.0;

/// Emission lines with a FastSpecFit star-formation-rate estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionLine {
    Halpha,
    Oii3727,
}

impl EmissionLine {
    pub const ALL: [EmissionLine; 2] = [EmissionLine::Halpha, EmissionLine::Oii3727];

    /// Column-name prefix in FastSpecFit tables.
    pub fn key(self) -> &'static str {
        match self {
            EmissionLine::Halpha => "HALPHA",
            EmissionLine::Oii3727 => "OII_3727",
        }
    }

    pub fn flux_column(self) -> String {
        format!("{}_FLUX", self.key())
    }

    pub fn ivar_column(self) -> String {
        format!("{}_FLUX_IVAR", self.key())
    }

    pub fn sfr_column(self) -> &'static str {
        match self {
            EmissionLine::Halpha => "SFR_HALPHA",
            EmissionLine::Oii3727 => "SFR_OII",
        }
    }
}

impl fmt::Display for EmissionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmissionLine::Halpha => f.write_str("Hα"),
            EmissionLine::Oii3727 => f.write_str("[OII]λ3727"),
        }
    }
}

/// Keep rows with a reliable detection of `line`: flux and inverse variance
/// both finite and positive, and `flux * sqrt(ivar) > min_snr`.
pub fn quality_cut(
    table: &CatalogTable,
    line: EmissionLine,
    min_snr: f64,
) -> Result<CatalogTable, InputError> {
    let flux_col = line.flux_column();
    let ivar_col = line.ivar_column();
    table.require_column(&flux_col)?;
    table.require_column(&ivar_col)?;

    let rows = table
        .rows()
        .iter()
        .filter(|row| match (row.numeric(&flux_col), row.numeric(&ivar_col)) {
            (Some(flux), Some(ivar)) => {
                flux.is_finite()
                    && ivar.is_finite()
                    && flux > 0.0
                    && ivar > 0.0
                    && flux * ivar.sqrt() > min_snr
            }
            _ => false,
        })
        .cloned()
        .collect();
    let kept = table.with_rows(rows);

    log::info!(
        "quality sample: {} of {} galaxies with reliable {line} detections (S/N > {min_snr})",
        kept.len(),
        table.len()
    );
    Ok(kept)
}

fn log10_positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| *x > 0.0).map(f64::log10)
}

/// `(log10 SFR, log10 flux)` columns; non-positive or missing values become `None`.
pub fn log_pairs(
    table: &CatalogTable,
    line: EmissionLine,
) -> Result<(Vec<Option<f64>>, Vec<Option<f64>>), InputError> {
    let sfr = table.numeric_column(line.sfr_column())?;
    let flux = table.numeric_column(&line.flux_column())?;
    Ok((
        sfr.into_iter().map(log10_positive).collect(),
        flux.into_iter().map(log10_positive).collect(),
    ))
}

/// Everything the emission-line scatter plot needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionAnalysis {
    pub line: EmissionLine,
    /// log10 SFR of the valid pairs.
    pub log_sfr: Vec<f64>,
    /// log10 line flux of the valid pairs.
    pub log_flux: Vec<f64>,
    pub summary: CorrelationSummary,
}

impl EmissionAnalysis {
    /// Quality cut, log transform, then correlation of log SFR against log flux.
    pub fn run(table: &CatalogTable, line: EmissionLine, min_snr: f64) -> Result<Self, InputError> {
        let clean = quality_cut(table, line, min_snr)?;
        let (sfr, flux) = log_pairs(&clean, line)?;
        let summary = correlation_summary(&sfr, &flux)?;
        let (log_sfr, log_flux) = super::stats::valid_pairs(&sfr, &flux)?;
        log::info!(
            "{line} vs SFR: n = {}, r = {:.3}",
            summary.n,
            summary.coefficient
        );
        Ok(Self {
            line,
            log_sfr,
            log_flux,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CatalogRow, CellValue, Region, TracerType};

    fn row(id: i64, flux: CellValue, ivar: f64, sfr: f64) -> CatalogRow {
        CatalogRow::new(id, 0.0, 0.0, 0.8)
            .with("OII_3727_FLUX", flux)
            .with("OII_3727_FLUX_IVAR", CellValue::Float(ivar))
            .with("SFR_OII", CellValue::Float(sfr))
    }

    fn table() -> CatalogTable {
        let rows = vec![
            row(1, CellValue::Float(10.0), 1.0, 1.0),  // S/N 10
            row(2, CellValue::Float(2.0), 1.0, 2.0),   // S/N 2 → cut
            row(3, CellValue::Float(-5.0), 4.0, 3.0),  // negative flux → cut
            row(4, CellValue::Float(100.0), 0.0, 4.0), // zero ivar → cut
            row(5, CellValue::Null, 1.0, 5.0),         // missing → cut
            row(6, CellValue::Float(1000.0), 0.01, 10.0), // S/N 100
            row(7, CellValue::Float(40.0), 0.25, 0.0),  // S/N 20, SFR 0
        ];
        CatalogTable::new(TracerType::ElgLopNotQso, Region::Ngc, rows).unwrap()
    }

    #[test]
    fn test_quality_cut() {
        let clean = quality_cut(&table(), EmissionLine::Oii3727, DEFAULT_MIN_SNR).unwrap();
        let ids: Vec<i64> = clean.rows().iter().map(|r| r.target_id).collect();
        assert_eq!(ids, vec![1, 6, 7]);
    }

    #[test]
    fn test_quality_cut_missing_columns() {
        assert_eq!(
            quality_cut(&table(), EmissionLine::Halpha, DEFAULT_MIN_SNR),
            Err(InputError::MissingColumn {
                column: "HALPHA_FLUX".into()
            })
        );
    }

    #[test]
    fn test_log_pairs_drop_non_positive() {
        let clean = quality_cut(&table(), EmissionLine::Oii3727, DEFAULT_MIN_SNR).unwrap();
        let (sfr, flux) = log_pairs(&clean, EmissionLine::Oii3727).unwrap();
        assert_eq!(sfr.len(), 3);
        assert!(sfr[0].is_some_and(|v| v.abs() < 1e-12));
        assert!(sfr[1].is_some_and(|v| (v - 1.0).abs() < 1e-12));
        assert_eq!(sfr[2], None);
        assert!(flux[1].is_some_and(|v| (v - 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_run_uses_valid_pairs_only() {
        let analysis = EmissionAnalysis::run(&table(), EmissionLine::Oii3727, DEFAULT_MIN_SNR).unwrap();
        assert_eq!(analysis.summary.n, 2);
        assert_eq!(analysis.log_sfr.len(), 2);
        assert!((analysis.summary.coefficient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_join_reports_too_few_pairs() {
        let galaxies = CatalogTable::new(
            TracerType::ElgLopNotQso,
            Region::Ngc,
            vec![CatalogRow::new(100, 0.0, 0.0, 0.8)],
        )
        .unwrap();
        let joined = crate::data::join::inner_join_on_target_id(&galaxies, &table()).unwrap();
        assert_eq!(
            EmissionAnalysis::run(&joined, EmissionLine::Oii3727, DEFAULT_MIN_SNR),
            Err(InputError::InsufficientSamples {
                required: 2,
                found: 0
            })
        );
    }

    #[test]
    fn test_column_names() {
        assert_eq!(EmissionLine::Halpha.flux_column(), "HALPHA_FLUX");
        assert_eq!(EmissionLine::Oii3727.ivar_column(), "OII_3727_FLUX_IVAR");
        assert_eq!(EmissionLine::Oii3727.sfr_column(), "SFR_OII");
    }
}
