use std::f64::consts::TAU;

use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoints, Polygon};

use crate::color::{heat_color, heat_text_color, tier_color};
use crate::eval::metrics::{ConfusionMatrix, RocCurve};
use crate::eval::risk::{RiskReport, RiskTier};

const HISTOGRAM_BINS: usize = 10;

// ---------------------------------------------------------------------------
// ROC curve
// ---------------------------------------------------------------------------

pub fn roc_plot(ui: &mut Ui, roc: &RocCurve, auc: f64) {
    Plot::new("roc_plot")
        .legend(Legend::default())
        .x_axis_label("False positive rate")
        .y_axis_label("True positive rate")
        .data_aspect(1.0)
        .include_x(0.0)
        .include_x(1.0)
        .include_y(0.0)
        .include_y(1.0)
        .allow_drag(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let curve = Line::new(PlotPoints::from(roc.points.clone()))
                .name(format!("ROC (AUC = {auc:.3})"))
                .color(Color32::from_rgb(30, 120, 220))
                .width(2.0);
            plot_ui.line(curve);

            let chance = Line::new(PlotPoints::from(vec![[0.0, 0.0], [1.0, 1.0]]))
                .name("Chance")
                .color(Color32::GRAY)
                .style(LineStyle::dashed_loose());
            plot_ui.line(chance);
        });
}

// ---------------------------------------------------------------------------
// Risk charts
// ---------------------------------------------------------------------------

/// Probability histogram, bars coloured by the tier their centre falls in.
pub fn risk_histogram(ui: &mut Ui, report: &RiskReport) {
    let width = 1.0 / HISTOGRAM_BINS as f64;
    let bars: Vec<Bar> = report
        .histogram(HISTOGRAM_BINS)
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let centre = (i as f64 + 0.5) * width;
            let tier = RiskTier::classify(centre, &report.thresholds);
            Bar::new(centre, count as f64)
                .width(width * 0.95)
                .fill(tier_color(tier))
                .name(format!("{:.1}-{:.1}", i as f64 * width, (i + 1) as f64 * width))
        })
        .collect();

    Plot::new("risk_histogram")
        .x_axis_label("Risk probability")
        .y_axis_label("Samples")
        .include_x(0.0)
        .include_x(1.0)
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("Risk distribution"));
        });
}

/// Arc steps of a full circle, and the most a single convex piece may span.
const PIE_STEPS: f64 = 64.0;
const PIECE_STEPS: usize = 16;

/// Fraction and fill pieces of each non-empty pie slice, in input order.
/// Every piece is a convex fan starting at the centre, since polygons are
/// filled as convex shapes.
pub fn pie_slices(counts: &[(RiskTier, usize)]) -> Vec<(RiskTier, f64, Vec<Vec<[f64; 2]>>)> {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        return Vec::new();
    }

    let mut start = 0.0;
    let mut slices = Vec::new();
    for &(tier, count) in counts {
        if count == 0 {
            continue;
        }
        let fraction = count as f64 / total as f64;
        let sweep = fraction * TAU;
        let steps = (fraction * PIE_STEPS).ceil().max(2.0) as usize;
        let arc: Vec<[f64; 2]> = (0..=steps)
            .map(|s| {
                let angle = start + sweep * s as f64 / steps as f64;
                [angle.cos(), angle.sin()]
            })
            .collect();
        let pieces = (0..steps)
            .step_by(PIECE_STEPS)
            .map(|from| {
                let to = (from + PIECE_STEPS).min(steps);
                let mut piece = vec![[0.0, 0.0]];
                piece.extend_from_slice(&arc[from..=to]);
                piece
            })
            .collect();
        slices.push((tier, fraction, pieces));
        start += sweep;
    }
    slices
}

pub fn tier_pie(ui: &mut Ui, report: &RiskReport) {
    let counts: Vec<(RiskTier, usize)> = RiskTier::ALL
        .iter()
        .map(|&t| (t, report.tier_counts.get(&t).copied().unwrap_or(0)))
        .collect();
    let slices = pie_slices(&counts);

    Plot::new("tier_pie")
        .legend(Legend::default())
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .include_x(-1.2)
        .include_x(1.2)
        .include_y(-1.2)
        .include_y(1.2)
        .show(ui, |plot_ui| {
            for (tier, fraction, pieces) in slices {
                let color = tier_color(tier);
                let name = format!("{tier} ({:.1}%)", fraction * 100.0);
                for piece in pieces {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::from(piece))
                            .name(&name)
                            .fill_color(color.gamma_multiply(0.85))
                            .stroke(egui::Stroke::new(1.0, color)),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Confusion matrix
// ---------------------------------------------------------------------------

/// 2x2 heat grid, rows are ground truth and columns predictions.
pub fn confusion_grid(ui: &mut Ui, confusion: &ConfusionMatrix) {
    let max = confusion.matrix.iter().flatten().copied().max().unwrap_or(0).max(1);
    let labels = ["Normal", "Attack"];

    egui::Grid::new("confusion_grid")
        .spacing([4.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("");
            for label in labels {
                ui.strong(format!("Pred. {label}"));
            }
            ui.end_row();

            for (t, label) in labels.iter().enumerate() {
                ui.strong(format!("True {label}"));
                for p in 0..2 {
                    let count = confusion.matrix[t][p];
                    let fraction = count as f32 / max as f32;
                    let text = RichText::new(count.to_string())
                        .size(18.0)
                        .color(heat_text_color(fraction));
                    egui::Frame::new()
                        .fill(heat_color(fraction))
                        .inner_margin(egui::Margin::symmetric(24, 12))
                        .show(ui, |ui: &mut Ui| {
                            ui.label(text);
                        });
                }
                ui.end_row();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pie_slices_cover_circle() {
        let slices = pie_slices(&[
            (RiskTier::Safe, 6),
            (RiskTier::Warning, 0),
            (RiskTier::HighRisk, 2),
        ]);
        assert_eq!(slices.len(), 2);
        assert_relative_eq!(slices[0].1, 0.75);
        assert_relative_eq!(slices[1].1, 0.25);

        // The 75% slice needs three convex pieces of at most a quarter turn.
        assert_eq!(slices[0].2.len(), 3);
        assert_eq!(slices[1].2.len(), 1);

        // The last slice ends where the first began.
        let last = slices[1].2.last().unwrap().last().unwrap();
        assert_relative_eq!(last[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(last[1], 0.0, epsilon = 1e-9);
        // Every piece fans out from the centre.
        assert!(slices
            .iter()
            .flat_map(|(_, _, pieces)| pieces)
            .all(|p| p[0] == [0.0, 0.0]));
    }

    #[test]
    fn test_empty_pie() {
        assert!(pie_slices(&[(RiskTier::Safe, 0)]).is_empty());
    }
}
