use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::tier_color;
use crate::config::TableWindowConfig;
use crate::data::model::Table;
use crate::eval::risk::RiskReport;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Row window
// ---------------------------------------------------------------------------

/// How many rows of a large table the grid exposes. Starts at
/// `initial_rows` and grows by `step` whenever the last drawn row comes
/// within `margin` of the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWindow {
    len: usize,
    initial: usize,
    step: usize,
    margin: usize,
}

impl RowWindow {
    pub fn new(config: &TableWindowConfig) -> Self {
        Self {
            len: config.initial_rows.max(1),
            initial: config.initial_rows.max(1),
            step: config.step.max(1),
            margin: config.margin,
        }
    }

    /// Rows to render out of `total`.
    pub fn visible(&self, total: usize) -> usize {
        self.len.min(total)
    }

    /// Record the last row index drawn this frame. Returns `true` when the
    /// window grew.
    pub fn observe(&mut self, last_drawn: usize, total: usize) -> bool {
        let visible = self.visible(total);
        if visible >= total || last_drawn + self.margin + 1 < visible {
            return false;
        }
        self.len = (visible + self.step).min(total);
        log::debug!("row window extended to {} of {total}", self.len);
        true
    }

    pub fn reset(&mut self) {
        self.len = self.initial;
    }
}

// ---------------------------------------------------------------------------
// Grids
// ---------------------------------------------------------------------------

/// The full data grid: a row-number column followed by every table column.
pub fn data_grid(ui: &mut Ui, table: &Table, window: &mut RowWindow) {
    if table.is_empty() {
        ui.label(RichText::new("The table is empty.").weak());
        return;
    }

    let total = table.n_rows();
    let visible = window.visible(total);
    let mut last_drawn = 0;

    ui.push_id("data_grid", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(40.0))
            .columns(
                Column::initial(110.0).at_least(40.0).clip(true),
                table.n_cols(),
            )
            .min_scrolled_height(0.0)
            .header(22.0, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong("#");
                });
                for column in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(&column.name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, visible, |mut row| {
                    let r = row.index();
                    last_drawn = last_drawn.max(r);
                    row.col(|ui: &mut Ui| {
                        ui.label(RichText::new(r.to_string()).weak());
                    });
                    for c in 0..table.n_cols() {
                        row.col(|ui: &mut Ui| {
                            if let Some(cell) = table.cell(r, c) {
                                ui.label(cell.to_string());
                            }
                        });
                    }
                });
            });
    });

    if window.observe(last_drawn, total) {
        ui.ctx().request_repaint();
    }
}

/// Grid of scored rows: position, row summary, probability and tier.
pub fn risk_grid(ui: &mut Ui, table: &Table, report: &RiskReport, rows: &[usize]) {
    ui.push_id("risk_grid", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(50.0))
            .column(Column::remainder().at_least(120.0).clip(true))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(70.0))
            .min_scrolled_height(0.0)
            .header(22.0, |mut header| {
                for title in ["Row", "Data", "Probability", "Tier"] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let r = rows[row.index()];
                    let tier = report.tiers[r];
                    row.col(|ui: &mut Ui| {
                        ui.label(r.to_string());
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(table.row_summary(r));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.monospace(format!("{:.4}", report.probabilities[r]));
                    });
                    row.col(|ui: &mut Ui| {
                        ui.label(RichText::new(tier.to_string()).color(tier_color(tier)));
                    });
                });
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> RowWindow {
        RowWindow::new(&TableWindowConfig {
            initial_rows: 10,
            step: 5,
            margin: 2,
        })
    }

    #[test]
    fn test_small_table_shows_everything() {
        let mut w = window();
        assert_eq!(w.visible(4), 4);
        assert!(!w.observe(3, 4));
    }

    #[test]
    fn test_extends_near_bottom() {
        let mut w = window();
        assert_eq!(w.visible(100), 10);
        assert!(!w.observe(5, 100));
        assert!(w.observe(7, 100));
        assert_eq!(w.visible(100), 15);
        assert!(w.observe(14, 100));
        assert_eq!(w.visible(100), 20);
    }

    #[test]
    fn test_never_exceeds_total() {
        let mut w = window();
        assert!(w.observe(9, 12));
        assert_eq!(w.visible(12), 12);
        assert!(!w.observe(11, 12));
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut w = window();
        w.observe(9, 100);
        w.reset();
        assert_eq!(w, window());
    }
}
