//! Headless PNG export of the wedge and density figures.

use std::path::Path;

use anyhow::{bail, Context, Result};
use eframe::egui::Color32;
use image::{Rgb, RgbImage};

use crate::analysis::density::DensityGrid;
use crate::color::Gradient;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
/// Fraction of the image left empty around the data.
const MARGIN: f64 = 0.05;

/// Maps data coordinates to pixel coordinates (y up).
struct PixelMap {
    x_min: f64,
    y_min: f64,
    scale_x: f64,
    scale_y: f64,
    size: u32,
}

impl PixelMap {
    fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, size: u32, equal_aspect: bool) -> Self {
        let usable = size as f64 * (1.0 - 2.0 * MARGIN);
        let span_x = (x_max - x_min).max(f64::EPSILON);
        let span_y = (y_max - y_min).max(f64::EPSILON);
        let (mut scale_x, mut scale_y) = (usable / span_x, usable / span_y);
        let (mut x_min, mut y_min) = (x_min, y_min);
        if equal_aspect {
            let s = scale_x.min(scale_y);
            // Centre the shorter axis.
            x_min -= (usable / s - span_x) / 2.0;
            y_min -= (usable / s - span_y) / 2.0;
            scale_x = s;
            scale_y = s;
        }
        Self {
            x_min,
            y_min,
            scale_x,
            scale_y,
            size,
        }
    }

    fn to_pixel(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        let offset = self.size as f64 * MARGIN;
        let px = offset + (x - self.x_min) * self.scale_x;
        let py = self.size as f64 - (offset + (y - self.y_min) * self.scale_y);
        if !px.is_finite() || !py.is_finite() || px < 0.0 || py < 0.0 {
            return None;
        }
        let (px, py) = (px as u32, py as u32);
        (px < self.size && py < self.size).then_some((px, py))
    }
}

fn rgb(c: Color32) -> Rgb<u8> {
    Rgb([c.r(), c.g(), c.b()])
}

/// Draw coloured points on a white square canvas. With `equal_aspect`
/// both axes share one scale, which keeps iso-redshift circles round.
pub fn rasterize_points(points: &[(f64, f64, Color32)], size: u32, equal_aspect: bool) -> Result<RgbImage> {
    if size < 16 {
        bail!("export size {size}px is too small");
    }
    let mut img = RgbImage::from_pixel(size, size, BACKGROUND);
    let finite: Vec<&(f64, f64, Color32)> = points
        .iter()
        .filter(|(x, y, _)| x.is_finite() && y.is_finite())
        .collect();
    if finite.is_empty() {
        return Ok(img);
    }

    let (mut x_min, mut x_max, mut y_min, mut y_max) =
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for (x, y, _) in &finite {
        x_min = x_min.min(*x);
        x_max = x_max.max(*x);
        y_min = y_min.min(*y);
        y_max = y_max.max(*y);
    }
    let map = PixelMap::new(x_min, x_max, y_min, y_max, size, equal_aspect);

    for (x, y, color) in finite {
        if let Some((px, py)) = map.to_pixel(*x, *y) {
            img.put_pixel(px, py, rgb(*color));
        }
    }
    Ok(img)
}

/// Fill every non-empty density cell, coloured by log count.
pub fn rasterize_density(grid: &DensityGrid, gradient: &Gradient, size: u32) -> Result<RgbImage> {
    if size < 16 {
        bail!("export size {size}px is too small");
    }
    let mut img = RgbImage::from_pixel(size, size, BACKGROUND);
    let e = grid.extent;
    let map = PixelMap::new(e.x_min, e.x_max, e.y_min, e.y_max, size, false);
    let log_max = (grid.max_count() as f64).ln_1p();

    for (x0, y0, x1, y1, count) in grid.cells() {
        let color = rgb(gradient.sample_range((count as f64).ln_1p(), 0.0, log_max));
        let (Some((px0, py1)), Some((px1, py0))) = (map.to_pixel(x0, y0), map.to_pixel(x1, y1))
        else {
            continue;
        };
        for py in py0..=py1.min(size - 1) {
            for px in px0..=px1.min(size - 1) {
                img.put_pixel(px, py, color);
            }
        }
    }
    Ok(img)
}

pub fn export_points_png(path: &Path, points: &[(f64, f64, Color32)], size: u32, equal_aspect: bool) -> Result<()> {
    let img = rasterize_points(points, size, equal_aspect)?;
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} points to {}", points.len(), path.display());
    Ok(())
}

pub fn export_density_png(path: &Path, grid: &DensityGrid, gradient: &Gradient, size: u32) -> Result<()> {
    let img = rasterize_density(grid, gradient, size)?;
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported density grid ({} points) to {}", grid.total(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_land_on_canvas() {
        let points = vec![
            (-1.0, 0.0, Color32::RED),
            (1.0, 0.0, Color32::BLUE),
            (0.0, 1.0, Color32::GREEN),
            (f64::NAN, 0.0, Color32::BLACK),
        ];
        let img = rasterize_points(&points, 100, true).unwrap();
        let coloured = img.pixels().filter(|p| **p != BACKGROUND).count();
        assert_eq!(coloured, 3);
    }

    #[test]
    fn test_equal_aspect_keeps_circle_round() {
        // Unit circle: bounding box in pixels must be square.
        let points: Vec<(f64, f64, Color32)> = (0..360)
            .map(|d| {
                let t = (d as f64).to_radians();
                (t.cos(), t.sin(), Color32::BLACK)
            })
            .collect();
        let img = rasterize_points(&points, 200, true).unwrap();
        let (mut x0, mut x1, mut y0, mut y1) = (u32::MAX, 0, u32::MAX, 0);
        for (x, y, p) in img.enumerate_pixels() {
            if *p != BACKGROUND {
                x0 = x0.min(x);
                x1 = x1.max(x);
                y0 = y0.min(y);
                y1 = y1.max(y);
            }
        }
        assert!(((x1 - x0) as i64 - (y1 - y0) as i64).abs() <= 1);
    }

    #[test]
    fn test_density_export_writes_png() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let grid = DensityGrid::build(&x, &y, 10, None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("density.png");
        export_density_png(&path, &grid, &Gradient::density(), 64).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!(back.width(), 64);
    }

    #[test]
    fn test_tiny_canvas_rejected() {
        assert!(rasterize_points(&[], 4, false).is_err());
    }
}
