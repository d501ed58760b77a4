mod app;
mod state;
mod ui;

use app::DesiViewerApp;
use desi_viewer::config::ViewerConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match ViewerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            std::process::exit(2);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 900.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DESI DR1 Viewer – Galaxy Wedge & Emission Lines",
        options,
        Box::new(move |_cc| Ok(Box::new(DesiViewerApp::new(config)))),
    )
}
