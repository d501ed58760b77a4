use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::TracerType;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Continuous gradients
// ---------------------------------------------------------------------------

/// A piecewise-linear colour ramp, interpolated in linear RGB.
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<LinSrgb>,
}

impl Gradient {
    fn from_hex(stops: &[u32]) -> Self {
        let stops = stops
            .iter()
            .map(|&hex| {
                let srgb = Srgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8);
                srgb.into_format::<f32>().into_linear()
            })
            .collect();
        Self { stops }
    }

    /// Navy → blue → cyan → green → yellow → orange → red, used for redshift.
    pub fn redshift() -> Self {
        Self::from_hex(&[
            0x000080, 0x0000FF, 0x00FFFF, 0x00FF00, 0xFFFF00, 0xFF8000, 0xFF0000,
        ])
    }

    /// Viridis-like ramp for point density.
    pub fn density() -> Self {
        Self::from_hex(&[0x440154, 0x3B528B, 0x21918C, 0x5EC962, 0xFDE725])
    }

    /// Colour at `t` in `[0, 1]`; out-of-range values are clamped, NaN maps to 0.
    pub fn sample(&self, t: f64) -> Color32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) } as f32;
        let segments = self.stops.len() - 1;
        let pos = t * segments as f32;
        let i = (pos.floor() as usize).min(segments - 1);
        let frac = pos - i as f32;
        let mixed = self.stops[i].mix(self.stops[i + 1], frac);
        let rgb: Srgb = mixed.into_color();
        to_color32(rgb)
    }

    /// Colour of `value` within `[min, max]`.
    pub fn sample_range(&self, value: f64, min: f64, max: f64) -> Color32 {
        let span = max - min;
        if span <= 0.0 || !span.is_finite() {
            return self.sample(0.5);
        }
        self.sample((value - min) / span)
    }
}

// ---------------------------------------------------------------------------
// Tracer colours
// ---------------------------------------------------------------------------

/// Maps tracer labels to distinct colours.
#[derive(Debug, Clone)]
pub struct TracerColors {
    mapping: BTreeMap<TracerType, Color32>,
    default_color: Color32,
}

impl TracerColors {
    pub fn new<'a>(tracers: impl IntoIterator<Item = &'a TracerType>) -> Self {
        let tracers: Vec<&TracerType> = tracers.into_iter().collect();
        let palette = generate_palette(tracers.len());
        let mapping = tracers
            .into_iter()
            .zip(palette)
            .map(|(t, c)| (t.clone(), c))
            .collect();

        TracerColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, tracer: &TracerType) -> Color32 {
        self.mapping
            .get(tracer)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Every mapped tracer with its colour, in tracer order.
    pub fn legend_entries(&self) -> Vec<(&TracerType, Color32)> {
        self.mapping.iter().map(|(t, c)| (t, *c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(p[i], p[j]);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_redshift_gradient_endpoints() {
        let g = Gradient::redshift();
        assert_eq!(g.sample(0.0), Color32::from_rgb(0x00, 0x00, 0x80));
        assert_eq!(g.sample(1.0), Color32::from_rgb(0xFF, 0x00, 0x00));
        assert_eq!(g.sample(7.0), g.sample(1.0));
        assert_eq!(g.sample(f64::NAN), g.sample(0.0));
        assert_eq!(g.sample_range(2.0, 1.0, 1.0), g.sample(0.5));
    }

    #[test]
    fn test_tracer_colors() {
        let tracers = [TracerType::Lrg, TracerType::Qso];
        let colors = TracerColors::new(&tracers);
        assert_ne!(colors.color_for(&TracerType::Lrg), colors.color_for(&TracerType::Qso));
        assert_eq!(colors.color_for(&TracerType::BgsBright), Color32::GRAY);
        let legend = colors.legend_entries();
        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0], (&TracerType::Lrg, colors.color_for(&TracerType::Lrg)));
    }
}
