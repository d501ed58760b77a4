//! Paired and single-column summary statistics.

use crate::data::model::CatalogTable;
use crate::error::InputError;

/// Pearson correlation of the valid pairs of two columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSummary {
    /// Pearson r in [-1, 1].
    pub coefficient: f64,
    /// Number of pairs that entered the calculation.
    pub n: usize,
}

/// Pairs where both sides are present and finite.
pub fn valid_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> Result<(Vec<f64>, Vec<f64>), InputError> {
    if x.len() != y.len() {
        return Err(InputError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    Ok(x.iter()
        .zip(y)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip())
}

/// Pearson correlation coefficient between two equal-length columns.
///
/// Pairs with a missing or non-finite value on either side are dropped first.
/// Fewer than two remaining pairs, or a column with no spread, is an error.
pub fn correlation_summary(
    x: &[Option<f64>],
    y: &[Option<f64>],
) -> Result<CorrelationSummary, InputError> {
    let (xs, ys) = valid_pairs(x, y)?;
    let n = xs.len();
    if n < 2 {
        return Err(InputError::InsufficientSamples {
            required: 2,
            found: n,
        });
    }

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in xs.iter().zip(&ys) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 {
        return Err(InputError::DegenerateColumn { column: "x".into() });
    }
    if var_y == 0.0 {
        return Err(InputError::DegenerateColumn { column: "y".into() });
    }

    let coefficient = (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0);
    Ok(CorrelationSummary { coefficient, n })
}

/// [`correlation_summary`] over two named columns of one table.
pub fn correlate_columns(
    table: &CatalogTable,
    x_column: &str,
    y_column: &str,
) -> Result<CorrelationSummary, InputError> {
    let x = table.numeric_column(x_column)?;
    let y = table.numeric_column(y_column)?;
    correlation_summary(&x, &y).map_err(|e| match e {
        InputError::DegenerateColumn { column } if column == "x" => InputError::DegenerateColumn {
            column: x_column.to_string(),
        },
        InputError::DegenerateColumn { .. } => InputError::DegenerateColumn {
            column: y_column.to_string(),
        },
        other => other,
    })
}

/// Redshift distribution summary shown next to the wedge plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedshiftStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl RedshiftStats {
    pub fn from_values(values: &[f64]) -> Result<Self, InputError> {
        let valid: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if valid.is_empty() {
            return Err(InputError::InsufficientSamples {
                required: 1,
                found: 0,
            });
        }
        let n = valid.len() as f64;
        let mean = valid.iter().sum::<f64>() / n;
        let variance = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Self {
            count: valid.len(),
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(v: &[f64]) -> Vec<Option<f64>> {
        v.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_identical_columns() {
        let x = some(&[0.3, 1.2, -4.0, 2.5, 9.1]);
        let s = correlation_summary(&x, &x).unwrap();
        assert!((s.coefficient - 1.0).abs() < 1e-12);
        assert_eq!(s.n, 5);
    }

    #[test]
    fn test_anticorrelated() {
        let x = some(&[1.0, 2.0, 3.0, 4.0]);
        let y = some(&[8.0, 6.0, 4.0, 2.0]);
        let s = correlation_summary(&x, &y).unwrap();
        assert!((s.coefficient + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_and_non_finite_pairs_dropped() {
        let x = vec![Some(1.0), None, Some(3.0), Some(f64::NAN), Some(5.0)];
        let y = vec![Some(2.0), Some(100.0), Some(6.0), Some(1.0), Some(f64::INFINITY)];
        let s = correlation_summary(&x, &y).unwrap();
        assert_eq!(s.n, 2);
        assert!((s.coefficient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            correlation_summary(&some(&[1.0, 2.0]), &some(&[1.0])),
            Err(InputError::LengthMismatch { left: 2, right: 1 })
        );
    }

    #[test]
    fn test_fewer_than_two_pairs() {
        assert_eq!(
            correlation_summary(&some(&[1.0]), &some(&[2.0])),
            Err(InputError::InsufficientSamples {
                required: 2,
                found: 1
            })
        );
        assert_eq!(
            correlation_summary(&[Some(1.0), None], &[None, Some(2.0)]),
            Err(InputError::InsufficientSamples {
                required: 2,
                found: 0
            })
        );
    }

    #[test]
    fn test_constant_column_is_degenerate() {
        let err = correlation_summary(&some(&[1.0, 1.0, 1.0]), &some(&[1.0, 2.0, 3.0])).unwrap_err();
        assert_eq!(err, InputError::DegenerateColumn { column: "x".into() });
    }

    #[test]
    fn test_redshift_stats() {
        let s = RedshiftStats::from_values(&[0.5, 1.5, f64::NAN, 1.0]).unwrap();
        assert_eq!(s.count, 3);
        assert!((s.mean - 1.0).abs() < 1e-12);
        assert!((s.std_dev - (1.0f64 / 6.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 0.5);
        assert_eq!(s.max, 1.5);
        assert!(RedshiftStats::from_values(&[]).is_err());
    }
}
