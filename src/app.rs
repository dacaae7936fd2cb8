use eframe::egui;

use crate::config::AppConfig;
use crate::state::{AppState, Tab};
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct WorkbenchApp {
    pub state: AppState,
}

impl WorkbenchApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for WorkbenchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Apply finished background work ----
        self.state.poll_tasks();

        // ---- Top panel: page tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: active page ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Preprocess => pages::preprocess_page(ui, &mut self.state),
            Tab::Monitor => pages::monitor_page(ui, &mut self.state),
            Tab::Evaluate => pages::evaluate_page(ui, &mut self.state),
        });

        // ---- Floating windows ----
        panels::pca_prompt(ctx, &mut self.state.preprocess, &mut self.state.notices);
        panels::progress_overlay(ctx, &mut self.state);
        panels::notice_window(ctx, &mut self.state.notices);
    }
}
