use eframe::egui::{Color32, Grid, RichText, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Plot, PlotPoints, Points, Polygon};

use desi_viewer::analysis::emission::EmissionLine;

use crate::state::{AppState, WedgeColoring};

/// Redshift colours are quantised into this many point series.
const REDSHIFT_BUCKETS: usize = 32;

// ---------------------------------------------------------------------------
// Wedge plot
// ---------------------------------------------------------------------------

/// Render the galaxy wedge in the central panel.
pub fn wedge_plot(ui: &mut Ui, state: &AppState) {
    if let Some(err) = &state.wedge_error {
        ui.label(RichText::new(err).color(Color32::RED));
        return;
    }
    let Some(wedge) = &state.wedge else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open LSS catalogs to draw the wedge  (File → Open LSS catalogs…)");
        });
        return;
    };

    let s = &wedge.stats;
    ui.label(format!(
        "{} galaxies   z = {:.3} ± {:.3}   range {:.3} – {:.3}",
        s.count, s.mean, s.std_dev, s.min, s.max
    ));

    // One series per colour keeps the plot to a few dozen draw calls.
    let series: Vec<(String, Color32, Vec<[f64; 2]>)> = match state.coloring {
        WedgeColoring::Redshift => {
            let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); REDSHIFT_BUCKETS];
            let span = (s.max - s.min).max(f64::EPSILON);
            for p in &wedge.points {
                let t = ((p.z - s.min) / span).clamp(0.0, 1.0);
                let i = ((t * REDSHIFT_BUCKETS as f64) as usize).min(REDSHIFT_BUCKETS - 1);
                buckets[i].push([p.x, p.y]);
            }
            buckets
                .into_iter()
                .enumerate()
                .filter(|(_, pts)| !pts.is_empty())
                .map(|(i, pts)| {
                    let t = (i as f64 + 0.5) / REDSHIFT_BUCKETS as f64;
                    let z = s.min + t * span;
                    (
                        format!("z ≈ {z:.2}"),
                        state.redshift_gradient.sample(t),
                        pts,
                    )
                })
                .collect()
        }
        WedgeColoring::Tracer => wedge
            .counts
            .keys()
            .map(|tracer| {
                let pts = wedge
                    .points
                    .iter()
                    .zip(&wedge.tracers)
                    .filter(|(_, t)| *t == tracer)
                    .map(|(p, _)| [p.x, p.y])
                    .collect();
                (
                    tracer.to_string(),
                    state.tracer_colors.color_for(tracer),
                    pts,
                )
            })
            .collect(),
    };

    let mut plot = Plot::new("wedge_plot")
        .data_aspect(1.0)
        .x_axis_label("Projected X [redshift × angular]")
        .y_axis_label("Projected Y [redshift × angular]")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    if state.coloring == WedgeColoring::Tracer {
        plot = plot.legend(Legend::default());
    }

    plot.show(ui, |plot_ui| {
        for (name, color, pts) in series {
            let points = Points::new(PlotPoints::from(pts))
                .name(&name)
                .color(color)
                .radius(1.0);
            plot_ui.points(points);
        }
    });
}

// ---------------------------------------------------------------------------
// Emission-line density scatter
// ---------------------------------------------------------------------------

/// Render log SFR vs log line flux as a density grid.
pub fn emission_plot(ui: &mut Ui, state: &AppState, line: EmissionLine) {
    let view = match state.emission.get(&line) {
        Some(Ok(view)) => view,
        Some(Err(err)) => {
            ui.label(RichText::new(err).color(Color32::RED));
            return;
        }
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open FastSpecFit tables  (File → Open FastSpecFit tables…)");
            });
            return;
        }
    };

    let summary = view.analysis.summary;
    ui.label(format!(
        "DESI DR1: {line} emission vs star formation rate   sample: {} galaxies   r = {:.3}",
        summary.n, summary.coefficient
    ));

    let grid = &view.grid;
    let log_max = (grid.max_count() as f64).ln_1p();

    Plot::new(format!("emission_plot_{}", line.key()))
        .x_axis_label("log₁₀(SFR) [M☉ yr⁻¹]")
        .y_axis_label(format!("log₁₀({line} flux)"))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (x0, y0, x1, y1, count) in grid.cells() {
                let color = state
                    .density_gradient
                    .sample_range((count as f64).ln_1p(), 0.0, log_max);
                let cell = Polygon::new(PlotPoints::from(vec![
                    [x0, y0],
                    [x1, y0],
                    [x1, y1],
                    [x0, y1],
                ]))
                .fill_color(color)
                .stroke(Stroke::NONE);
                plot_ui.polygon(cell);
            }
        });
}

// ---------------------------------------------------------------------------
// Summary table
// ---------------------------------------------------------------------------

/// Loaded catalogs and the per-tracer counts of the current wedge sample.
pub fn summary_table(ui: &mut Ui, state: &AppState) {
    ui.heading("Catalogs");
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            for title in ["Tracer", "Region", "Rows", "Enabled", "File"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for cat in &state.catalogs {
                let tracer = cat.table.tracer();
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(
                            RichText::new(tracer.to_string())
                                .color(state.tracer_colors.color_for(tracer)),
                        );
                    });
                    row.col(|ui| {
                        ui.label(cat.table.region().to_string());
                    });
                    row.col(|ui| {
                        ui.label(cat.table.len().to_string());
                    });
                    row.col(|ui| {
                        ui.label(if cat.enabled { "yes" } else { "no" });
                    });
                    row.col(|ui| {
                        ui.label(cat.path.display().to_string());
                    });
                });
            }
        });

    // One row per tracer: its regions share a single quota.
    ui.separator();
    ui.heading("Wedge sample");
    match &state.wedge {
        Some(wedge) => {
            Grid::new("wedge_sample").striped(true).show(ui, |ui: &mut Ui| {
                ui.strong("Tracer");
                ui.strong("Galaxies");
                ui.end_row();
                for (tracer, color) in state.tracer_colors.legend_entries() {
                    let Some(count) = wedge.counts.get(tracer) else {
                        continue;
                    };
                    ui.label(RichText::new(tracer.to_string()).color(color));
                    ui.label(count.to_string());
                    ui.end_row();
                }
            });
        }
        None => {
            ui.label("No wedge sample.");
        }
    }

    ui.separator();
    ui.heading("Emission lines");
    for line in EmissionLine::ALL {
        let text = match state.emission.get(&line) {
            Some(Ok(view)) => format!(
                "{line}: n = {}, r = {:.3}",
                view.analysis.summary.n, view.analysis.summary.coefficient
            ),
            Some(Err(err)) => format!("{line}: {err}"),
            None => format!("{line}: no FastSpecFit table loaded"),
        };
        ui.label(text);
    }
}
