use std::path::PathBuf;
use std::time::Duration;

use eframe::egui::{self, Align2, Color32, RichText, Ui};

use crate::data::loader::SUPPORTED_EXTENSIONS;
use crate::data::writer::SAVE_EXTENSIONS;
use crate::pages::preprocess::PreprocessPage;
use crate::state::{AppState, NoticeLevel, Notices, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Page tabs and the shared model status.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        for tab in Tab::ALL {
            if ui.selectable_label(state.tab == tab, tab.title()).clicked() {
                state.tab = tab;
            }
        }

        ui.separator();

        match state.model.get() {
            Some(model) => ui.label(format!(
                "Model: {} ({})",
                model.predictor.name(),
                file_name(&model.path)
            )),
            None => ui.label(RichText::new("No model loaded").weak()),
        };
    });
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Modal windows
// ---------------------------------------------------------------------------

/// Show the oldest pending notice until it is dismissed.
pub fn notice_window(ctx: &egui::Context, notices: &mut Notices) {
    let Some(notice) = notices.front().cloned() else {
        return;
    };
    let (icon, color) = match notice.level {
        NoticeLevel::Info => ("ℹ", Color32::from_rgb(60, 130, 220)),
        NoticeLevel::Warning => ("⚠", Color32::from_rgb(230, 160, 20)),
        NoticeLevel::Error => ("✖", Color32::from_rgb(210, 50, 50)),
    };

    egui::Window::new(&notice.title)
        .id(egui::Id::new("notice_window"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.label(RichText::new(icon).size(22.0).color(color));
                ui.label(&notice.text);
            });
            ui.add_space(6.0);
            if notices.len() > 1 {
                ui.label(RichText::new(format!("{} more message(s)", notices.len() - 1)).weak());
            }
            ui.vertical_centered(|ui: &mut Ui| {
                if ui.button("OK").clicked() {
                    notices.dismiss();
                }
            });
        });
}

/// Spinner with the running task's label and a cancel button.
pub fn progress_overlay(ctx: &egui::Context, state: &mut AppState) {
    let Some((label, elapsed)) = state.busy() else {
        return;
    };

    egui::Window::new("Working")
        .id(egui::Id::new("progress_overlay"))
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .show(ctx, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                ui.add(egui::Spinner::new());
                ui.label(format!("{label}… {elapsed:.1}s"));
                if ui.button("Cancel").clicked() {
                    state.cancel_all();
                }
            });
        });

    // Keep the elapsed time ticking.
    ctx.request_repaint_after(Duration::from_millis(100));
}

/// Component-count prompt for PCA, bounded to the selected column count.
pub fn pca_prompt(ctx: &egui::Context, page: &mut PreprocessPage, notices: &mut Notices) {
    let Some(prompt) = page.pca_prompt.as_mut() else {
        return;
    };

    let mut confirmed = false;
    let mut cancelled = false;
    egui::Window::new("PCA")
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui: &mut Ui| {
            ui.label(format!("Number of components (1-{}):", prompt.width));
            ui.add(egui::DragValue::new(&mut prompt.components).range(1..=prompt.width));
            ui.horizontal(|ui: &mut Ui| {
                confirmed = ui.button("OK").clicked();
                cancelled = ui.button("Cancel").clicked();
            });
        });

    if confirmed {
        notices.report("PCA failed", page.confirm_pca());
    } else if cancelled {
        page.pca_prompt = None;
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_table_dialog(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", SUPPORTED_EXTENSIONS)
        .add_filter("Excel", &["xlsx", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}

pub fn save_table_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save data")
        .add_filter("Excel", &["xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet"])
        .add_filter("Supported files", SAVE_EXTENSIONS)
        .set_file_name("processed.xlsx")
        .save_file()
}

pub fn open_model_dialog() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Load model")
        .add_filter("Model description", &["json"])
        .pick_file()
}
