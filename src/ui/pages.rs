use eframe::egui::{self, RichText, ScrollArea, Ui};

use super::panels::{open_model_dialog, open_table_dialog, save_table_dialog};
use super::plot::{confusion_grid, risk_histogram, roc_plot, tier_pie};
use super::table::{data_grid, risk_grid};
use crate::color::tier_color;
use crate::error::WorkbenchError;
use crate::eval::risk::RiskTier;
use crate::eval::Evaluation;
use crate::pages::preprocess::Operation;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Preprocess
// ---------------------------------------------------------------------------

pub fn preprocess_page(ui: &mut Ui, state: &mut AppState) {
    let ctx = ui.ctx().clone();
    let AppState {
        preprocess: page,
        notices,
        ..
    } = state;

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Open…").clicked() {
            if let Some(path) = open_table_dialog("Open data file") {
                notices.report("Cannot load file", page.start_load(&path, &ctx));
            }
        }
        if ui.button("Save…").clicked() {
            if page.table.is_none() {
                notices.error("Cannot save", WorkbenchError::NoTable.to_string());
            } else if let Some(path) = save_table_dialog() {
                notices.report("Cannot save", page.start_save(&path, &ctx));
            }
        }
    });

    ui.separator();

    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Selection:");
        ui.add(
            egui::TextEdit::singleline(&mut page.selection_input)
                .hint_text("e.g. 0, 2, protocol")
                .desired_width(220.0),
        );
        for op in Operation::ALL {
            if ui.button(op.label()).clicked() {
                if let Some(warnings) = notices.report(op.label(), page.run(op)) {
                    if !warnings.is_empty() {
                        notices.warn("Data cleaning", warnings.join("\n"));
                    }
                }
            }
        }
        if ui.button("PCA…").clicked() {
            notices.report("PCA", page.open_pca_prompt());
        }
    });

    ui.separator();

    let Some(table) = &page.table else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a traffic file to start  (Open…)");
        });
        return;
    };

    let source = page
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    ui.label(format!(
        "{} rows × {} columns  {source}",
        table.n_rows(),
        table.n_cols()
    ));
    ui.add_space(4.0);
    data_grid(ui, table, &mut page.window);
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

pub fn monitor_page(ui: &mut Ui, state: &mut AppState) {
    let ctx = ui.ctx().clone();
    let AppState {
        config,
        model,
        monitor: page,
        notices,
        ..
    } = state;

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load model…").clicked() {
            if let Some(path) = open_model_dialog() {
                notices.report("Cannot load model", model.start_load(&path, &ctx));
            }
        }
        if ui.button("Load traffic…").clicked() {
            if let Some(path) = open_table_dialog("Open traffic data") {
                notices.report("Cannot load traffic", page.start_load(&path, &ctx));
            }
        }
        if ui.button("Analyze").clicked() {
            notices.report("Cannot analyze", page.start_analysis(model, config, &ctx));
        }
    });

    ui.separator();
    log_view(ui, "monitor_log", &page.log);
    ui.separator();

    let Some(counts) = page.report.as_ref().map(|r| r.tier_counts.clone()) else {
        ui.label(RichText::new("Load a model and traffic data, then press Analyze.").weak());
        return;
    };

    let mut toggled = None;
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Show:");
        for tier in RiskTier::ALL {
            let mut shown = page.tier_filter.contains(&tier);
            let count = counts.get(&tier).copied().unwrap_or(0);
            let text = RichText::new(format!("{tier} ({count})")).color(tier_color(tier));
            if ui.checkbox(&mut shown, text).changed() {
                toggled = Some(tier);
            }
        }
    });
    if let Some(tier) = toggled {
        page.toggle_tier(tier);
    }

    let rows = page.visible_rows();
    let (Some(report), Some(table)) = (&page.report, &page.traffic) else {
        return;
    };
    ui.columns(2, |cols| {
        risk_grid(&mut cols[0], table, report, &rows);
        let size = egui::vec2(cols[1].available_width(), cols[1].available_height() / 2.0);
        cols[1].allocate_ui(size, |ui: &mut Ui| {
            risk_histogram(ui, report);
        });
        tier_pie(&mut cols[1], report);
    });
}

// ---------------------------------------------------------------------------
// Evaluate
// ---------------------------------------------------------------------------

pub fn evaluate_page(ui: &mut Ui, state: &mut AppState) {
    let ctx = ui.ctx().clone();
    let AppState {
        config,
        model,
        evaluate: page,
        notices,
        ..
    } = state;

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load model…").clicked() {
            if let Some(path) = open_model_dialog() {
                notices.report("Cannot load model", model.start_load(&path, &ctx));
            }
        }
        if ui.button("Load data…").clicked() {
            if let Some(path) = open_table_dialog("Open evaluation data") {
                notices.report("Cannot load data", page.start_load(&path, &ctx));
            }
        }
        if ui.button("Evaluate").clicked() {
            notices.report("Cannot evaluate", page.start_evaluation(model, config, &ctx));
        }
        ui.label(
            RichText::new(format!("Ground truth column: '{}'", config.target_column)).weak(),
        );
    });

    ui.separator();
    log_view(ui, "evaluate_log", &page.log);
    ui.separator();

    match &page.evaluation {
        None => {
            ui.label(RichText::new("Load a model and data, then press Evaluate.").weak());
        }
        Some(Evaluation::Labeled(result)) => {
            ui.columns(2, |cols| {
                cols[0].heading("Confusion matrix");
                confusion_grid(&mut cols[0], &result.confusion);
                cols[0].add_space(8.0);
                egui::Grid::new("metrics_grid")
                    .striped(true)
                    .show(&mut cols[0], |ui: &mut Ui| {
                        for (name, value) in [
                            ("Accuracy", result.accuracy),
                            ("Precision", result.precision),
                            ("Recall", result.recall),
                            ("F1 score", result.f1),
                        ] {
                            ui.label(name);
                            ui.monospace(format!("{value:.4}"));
                            ui.end_row();
                        }
                        ui.label("AUC");
                        ui.monospace(result.auc_label());
                        ui.end_row();
                    });

                cols[1].heading("ROC curve");
                match (&result.roc, result.auc) {
                    (Some(roc), Some(auc)) => roc_plot(&mut cols[1], roc, auc),
                    _ => {
                        cols[1].label(
                            RichText::new("Undefined: the ground truth holds a single class.").weak(),
                        );
                    }
                }
            });
        }
        Some(Evaluation::Unlabeled(report)) => {
            ui.columns(2, |cols| {
                risk_histogram(&mut cols[0], report);
                tier_pie(&mut cols[1], report);
            });
        }
    }
}

fn log_view(ui: &mut Ui, id: &str, lines: &[String]) {
    ScrollArea::vertical()
        .id_salt(id)
        .max_height(140.0)
        .auto_shrink([false, true])
        .stick_to_bottom(true)
        .show(ui, |ui: &mut Ui| {
            for line in lines {
                ui.monospace(line);
            }
        });
}
