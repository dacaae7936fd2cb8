mod app;
mod color;
mod config;
mod data;
mod error;
mod eval;
mod pages;
mod state;
mod tasks;
mod ui;

use app::WorkbenchApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match AppConfig::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Ignoring configuration: {e:#}");
            AppConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Traffic Workbench",
        options,
        Box::new(|_cc| Ok(Box::new(WorkbenchApp::new(config)))),
    )
}
