use eframe::egui;

use desi_viewer::config::ViewerConfig;

use crate::state::{AppState, View};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DesiViewerApp {
    pub state: AppState,
}

impl DesiViewerApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for DesiViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: catalogs and settings ----
        egui::SidePanel::left("settings_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: figures ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::view_tabs(ui, &mut self.state);
            match self.state.view {
                View::Wedge => plot::wedge_plot(ui, &self.state),
                View::Emission(line) => plot::emission_plot(ui, &self.state, line),
                View::Summary => plot::summary_table(ui, &self.state),
            }
        });
    }
}
