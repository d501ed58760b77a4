use crate::error::InputError;

/// Largest accepted number of bins per axis.
pub const MAX_BINS: usize = 1024;

/// Rectangular plot extent `[x_min, x_max] × [y_min, y_max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Extent {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// 2-D histogram of point counts, used to draw density scatter plots.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGrid {
    pub extent: Extent,
    pub bins: usize,
    /// Row-major counts, `counts[iy * bins + ix]`.
    counts: Vec<u32>,
}

impl DensityGrid {
    /// Bin paired points into `bins × bins` cells.
    ///
    /// Non-finite points and points outside `extent` are ignored. With no
    /// extent the bounds of the finite points are used (degenerate spans are
    /// widened by 0.5 on each side).
    pub fn build(x: &[f64], y: &[f64], bins: usize, extent: Option<Extent>) -> Result<Self, InputError> {
        if bins == 0 || bins > MAX_BINS {
            return Err(InputError::InvalidBins {
                bins,
                max: MAX_BINS,
            });
        }
        if x.len() != y.len() {
            return Err(InputError::LengthMismatch {
                left: x.len(),
                right: y.len(),
            });
        }
        let finite: Vec<(f64, f64)> = x
            .iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(a, b)| (*a, *b))
            .collect();
        if finite.is_empty() {
            return Err(InputError::InsufficientSamples {
                required: 1,
                found: 0,
            });
        }

        let extent = extent.unwrap_or_else(|| bounds(&finite));
        let mut counts = vec![0u32; bins * bins];
        let dx = (extent.x_max - extent.x_min) / bins as f64;
        let dy = (extent.y_max - extent.y_min) / bins as f64;

        for (px, py) in finite {
            if !extent.contains(px, py) {
                continue;
            }
            // Upper edge belongs to the last bin.
            let ix = (((px - extent.x_min) / dx) as usize).min(bins - 1);
            let iy = (((py - extent.y_min) / dy) as usize).min(bins - 1);
            counts[iy * bins + ix] += 1;
        }

        Ok(Self {
            extent,
            bins,
            counts,
        })
    }

    pub fn count(&self, ix: usize, iy: usize) -> u32 {
        self.counts[iy * self.bins + ix]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Non-empty cells as `(x_lo, y_lo, x_hi, y_hi, count)`.
    pub fn cells(&self) -> impl Iterator<Item = (f64, f64, f64, f64, u32)> + '_ {
        let dx = (self.extent.x_max - self.extent.x_min) / self.bins as f64;
        let dy = (self.extent.y_max - self.extent.y_min) / self.bins as f64;
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(move |(i, &c)| {
                let ix = i % self.bins;
                let iy = i / self.bins;
                let x0 = self.extent.x_min + ix as f64 * dx;
                let y0 = self.extent.y_min + iy as f64 * dy;
                (x0, y0, x0 + dx, y0 + dy, c)
            })
    }
}

fn bounds(points: &[(f64, f64)]) -> Extent {
    let mut e = Extent {
        x_min: f64::INFINITY,
        x_max: f64::NEG_INFINITY,
        y_min: f64::INFINITY,
        y_max: f64::NEG_INFINITY,
    };
    for &(x, y) in points {
        e.x_min = e.x_min.min(x);
        e.x_max = e.x_max.max(x);
        e.y_min = e.y_min.min(y);
        e.y_max = e.y_max.max(y);
    }
    if e.x_max - e.x_min <= 0.0 {
        e.x_min -= 0.5;
        e.x_max += 0.5;
    }
    if e.y_max - e.y_min <= 0.0 {
        e.y_min -= 0.5;
        e.y_max += 0.5;
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_sum_to_points_in_extent() {
        let x = [0.1, 0.2, 0.9, 1.0, 5.0, f64::NAN];
        let y = [0.1, 0.15, 0.9, 1.0, 0.5, 0.5];
        let extent = Extent {
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        };
        let grid = DensityGrid::build(&x, &y, 2, Some(extent)).unwrap();
        assert_eq!(grid.total(), 4);
        assert_eq!(grid.count(0, 0), 2);
        assert_eq!(grid.count(1, 1), 2);
        assert_eq!(grid.max_count(), 2);
        assert_eq!(grid.cells().count(), 2);
    }

    #[test]
    fn test_auto_extent_covers_all_points() {
        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| -2.0 * v).collect();
        let grid = DensityGrid::build(&x, &y, 10, None).unwrap();
        assert_eq!(grid.total(), 100);
        assert_eq!(grid.extent.x_max, 99.0);
        assert_eq!(grid.extent.y_min, -198.0);
    }

    #[test]
    fn test_single_point_gets_widened_extent() {
        let grid = DensityGrid::build(&[1.0], &[2.0], 4, None).unwrap();
        assert_eq!(grid.total(), 1);
        assert_eq!(grid.extent.x_min, 0.5);
    }

    #[test]
    fn test_no_finite_points_is_error() {
        assert_eq!(
            DensityGrid::build(&[f64::NAN], &[1.0], 10, None),
            Err(InputError::InsufficientSamples {
                required: 1,
                found: 0
            })
        );
    }

    #[test]
    fn test_bin_count_out_of_range() {
        for bins in [0, MAX_BINS + 1, usize::MAX] {
            assert_eq!(
                DensityGrid::build(&[1.0], &[1.0], bins, None),
                Err(InputError::InvalidBins {
                    bins,
                    max: MAX_BINS
                })
            );
        }
        assert!(DensityGrid::build(&[1.0], &[1.0], MAX_BINS, None).is_ok());
    }
}
