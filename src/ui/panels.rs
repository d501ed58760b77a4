use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Ui};

use desi_viewer::analysis::emission::EmissionLine;
use desi_viewer::analysis::projection::ProjectionKind;

use crate::state::{AppState, View, WedgeColoring};

// ---------------------------------------------------------------------------
// Left side panel – catalogs and pipeline settings
// ---------------------------------------------------------------------------

/// Render the left settings panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Catalogs");
    ui.separator();

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if state.catalogs.is_empty() {
                ui.label("No LSS catalog loaded.");
            }
            for cat in &mut state.catalogs {
                let color = state.tracer_colors.color_for(cat.table.tracer());
                let text = RichText::new(format!(
                    "{} {}  ({})",
                    cat.table.tracer(),
                    cat.table.region(),
                    cat.table.len()
                ))
                .color(color);
                changed |= ui.checkbox(&mut cat.enabled, text).changed();
            }
            match &state.fastspec {
                Some(t) => ui.label(format!("FastSpecFit: {} rows", t.len())),
                None => ui.label("No FastSpecFit table loaded."),
            };
            ui.separator();

            // ---- Quality filter ----
            ui.strong("Quality filter");
            let cfg = &mut state.config;
            ui.horizontal(|ui: &mut Ui| {
                ui.label("z");
                changed |= ui
                    .add(DragValue::new(&mut cfg.z_min).speed(0.01).range(0.0..=cfg.z_max))
                    .changed();
                ui.label("–");
                changed |= ui
                    .add(DragValue::new(&mut cfg.z_max).speed(0.01).range(cfg.z_min..=10.0))
                    .changed();
            });
            changed |= ui
                .checkbox(&mut cfg.require_zwarn_ok, "Require ZWARN = 0")
                .changed();
            ui.separator();

            // ---- Wedge ----
            ui.strong("Wedge");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Total sample");
                changed |= ui
                    .add(DragValue::new(&mut cfg.combined_total).speed(100).range(0..=1_000_000))
                    .changed();
            });
            egui::ComboBox::from_id_salt("projection")
                .selected_text(state.projection.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ProjectionKind::ALL {
                        changed |= ui
                            .selectable_value(&mut state.projection, kind, kind.label())
                            .changed();
                    }
                });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Color by");
                ui.radio_value(&mut state.coloring, WedgeColoring::Redshift, "Redshift");
                ui.radio_value(&mut state.coloring, WedgeColoring::Tracer, "Tracer");
            });
            ui.separator();

            // ---- Emission lines ----
            ui.strong("Emission lines");
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Min S/N");
                changed |= ui
                    .add(DragValue::new(&mut state.config.min_snr).speed(0.1).range(0.0..=100.0))
                    .changed();
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Density bins");
                changed |= ui
                    .add(DragValue::new(&mut state.config.density_bins).range(1..=500))
                    .changed();
            });
        });

    if changed {
        state.recompute();
    }
}

// ---------------------------------------------------------------------------
// View selector
// ---------------------------------------------------------------------------

/// Tabs choosing the figure in the central panel.
pub fn view_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.view, View::Wedge, "Galaxy wedge");
        for line in EmissionLine::ALL {
            ui.selectable_value(&mut state.view, View::Emission(line), format!("{line} vs SFR"));
        }
        ui.selectable_value(&mut state.view, View::Summary, "Summary");
    });
    ui.separator();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open LSS catalogs…").clicked() {
                open_catalogs_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open FastSpecFit tables…").clicked() {
                open_fastspec_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Export figure…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
            if ui.button("Clear").clicked() {
                state.clear();
                ui.close_menu();
            }
        });

        ui.separator();

        let enabled = state.catalogs.iter().filter(|c| c.enabled).count();
        ui.label(format!(
            "{} catalogs loaded, {} in wedge",
            state.catalogs.len(),
            enabled
        ));
        if let Some(w) = &state.wedge {
            ui.label(format!("{} galaxies plotted", w.points.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn dialog(state: &AppState, title: &str) -> rfd::FileDialog {
    let mut d = rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"]);
    if let Some(dir) = &state.config.data_dir {
        d = d.set_directory(dir);
    }
    d
}

pub fn open_catalogs_dialog(state: &mut AppState) {
    let Some(paths) = dialog(state, "Open DESI LSS clustering catalogs").pick_files() else {
        return;
    };
    state.status_message = None;
    for path in paths {
        if let Err(e) = state.add_catalog(&path) {
            log::error!("Failed to load {}: {e:#}", path.display());
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
    state.recompute();
}

pub fn open_fastspec_dialog(state: &mut AppState) {
    let Some(paths) = dialog(state, "Open FastSpecFit tables").pick_files() else {
        return;
    };
    match state.set_fastspec(&paths) {
        Ok(()) => {
            state.status_message = None;
            state.recompute();
        }
        Err(e) => {
            log::error!("Failed to load FastSpecFit tables: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

pub fn export_dialog(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Export figure")
        .add_filter("PNG", &["png"])
        .set_file_name(state.export_file_name())
        .save_file()
    else {
        return;
    };
    match state.export_current(&path) {
        Ok(()) => state.status_message = None,
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
