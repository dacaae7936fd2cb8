use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use super::{is_current, submit_table_load, take_load, LoadResult, ModelSlot};
use crate::config::AppConfig;
use crate::data::model::Table;
use crate::error::WorkbenchError;
use crate::eval::monitor_table;
use crate::eval::predictor::PredictError;
use crate::eval::risk::{RiskReport, RiskTier};
use crate::state::Notices;
use crate::tasks::{TaskPoll, TaskSlot};

pub struct MonitorPage {
    pub traffic: Option<Arc<Table>>,
    pub source: Option<PathBuf>,
    pub report: Option<RiskReport>,
    /// Statistics and status lines shown in the page log.
    pub log: Vec<String>,
    /// Tiers shown in the risky-row grid.
    pub tier_filter: BTreeSet<RiskTier>,
    load_task: TaskSlot<LoadResult<Table>>,
    /// Carries the table it scored so a result for replaced traffic is dropped.
    analysis_task: TaskSlot<(Arc<Table>, Result<RiskReport, PredictError>)>,
}

impl Default for MonitorPage {
    fn default() -> Self {
        Self {
            traffic: None,
            source: None,
            report: None,
            log: Vec::new(),
            tier_filter: [RiskTier::Warning, RiskTier::HighRisk].into_iter().collect(),
            load_task: TaskSlot::default(),
            analysis_task: TaskSlot::default(),
        }
    }
}

impl MonitorPage {
    pub fn log(&mut self, line: String) {
        self.log.push(line);
    }

    pub fn start_load(&mut self, path: &Path, ctx: &egui::Context) -> Result<(), WorkbenchError> {
        submit_table_load(&mut self.load_task, path, ctx)
    }

    /// Score the loaded traffic with the shared model in the background.
    pub fn start_analysis(
        &mut self,
        model: &ModelSlot,
        config: &AppConfig,
        ctx: &egui::Context,
    ) -> Result<(), WorkbenchError> {
        let model = model.require()?;
        let traffic = self.traffic.clone().ok_or(WorkbenchError::NoTable)?;
        let config = config.clone();
        self.analysis_task.submit("Analyzing traffic", ctx, move || {
            let result = monitor_table(&traffic, model.predictor.as_ref(), &config);
            (traffic, result)
        })?;
        self.log.push("Analyzing traffic data...".to_string());
        Ok(())
    }

    pub fn poll(&mut self, notices: &mut Notices) {
        if let Some((path, table)) = take_load(self.load_task.poll(), "traffic data", notices) {
            self.log.push(format!(
                "Traffic data {} loaded: {} rows, {} columns.",
                path.display(),
                table.n_rows(),
                table.n_cols()
            ));
            self.traffic = Some(Arc::new(table));
            self.source = Some(path);
            self.report = None;
        }

        match self.analysis_task.poll() {
            TaskPoll::Done((traffic, _)) if !is_current(&self.traffic, &traffic) => {
                log::warn!("discarding analysis of traffic that is no longer loaded");
                self.log
                    .push("Analysis discarded: the traffic data changed.".to_string());
            }
            TaskPoll::Done((_, Ok(report))) => self.set_report(report),
            TaskPoll::Done((_, Err(e))) => {
                log::error!("analysis failed: {e}");
                self.log.push(format!("Analysis failed: {e}"));
                notices.error("Analysis failed", e.to_string());
            }
            TaskPoll::Failed(msg) => notices.error("Analysis failed", msg),
            TaskPoll::Idle | TaskPoll::Running => {}
        }
    }

    fn set_report(&mut self, report: RiskReport) {
        log::info!(
            "risk analysis: {} of {} rows above {}",
            report.risky,
            report.total(),
            report.thresholds.warning
        );
        self.log.push("Analysis complete.".to_string());
        self.log.extend(report.summary_lines());
        self.report = Some(report);
    }

    /// Rows passing the tier filter, in table order.
    pub fn visible_rows(&self) -> Vec<usize> {
        self.report
            .as_ref()
            .map(|r| r.rows_in_tiers(&self.tier_filter))
            .unwrap_or_default()
    }

    pub fn toggle_tier(&mut self, tier: RiskTier) {
        if !self.tier_filter.remove(&tier) {
            self.tier_filter.insert(tier);
        }
    }

    pub fn running(&self) -> Option<(&str, Duration)> {
        self.load_task
            .running()
            .or_else(|| self.analysis_task.running())
    }

    pub fn cancel(&mut self) {
        self.load_task.cancel();
        self.analysis_task.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Cell, Column};
    use crate::eval::predictor::{LoadedModel, ModelSpec};
    use crate::pages::settle;

    fn slot_with_model() -> ModelSlot {
        let predictor = ModelSpec::Threshold {
            feature: "packets".into(),
            cutoff: 100.0,
            scale: 10.0,
        }
        .into_predictor()
        .unwrap();
        let mut slot = ModelSlot::default();
        slot.set(LoadedModel {
            path: PathBuf::from("model.json"),
            predictor,
        });
        slot
    }

    fn traffic() -> Arc<Table> {
        Arc::new(
            Table::from_columns(vec![Column::new(
                "packets",
                vec![
                    Cell::Integer(10),
                    Cell::Integer(104),
                    Cell::Integer(300),
                    Cell::Integer(50),
                ],
            )])
            .unwrap(),
        )
    }

    #[test]
    fn test_analysis_requires_model_then_table() {
        let ctx = egui::Context::default();
        let config = AppConfig::default();
        let mut page = MonitorPage::default();

        let err = page
            .start_analysis(&ModelSlot::default(), &config, &ctx)
            .unwrap_err();
        assert!(matches!(err, WorkbenchError::NoModel));

        let err = page.start_analysis(&slot_with_model(), &config, &ctx).unwrap_err();
        assert!(matches!(err, WorkbenchError::NoTable));

        assert!(page.log.is_empty());
        assert!(page.report.is_none());
        assert!(page.running().is_none());
    }

    #[test]
    fn test_analysis_produces_report_and_log() {
        let ctx = egui::Context::default();
        let mut notices = Notices::default();
        let mut page = MonitorPage::default();
        page.traffic = Some(traffic());
        page.start_analysis(&slot_with_model(), &AppConfig::default(), &ctx)
            .unwrap();

        settle(|| {
            page.poll(&mut notices);
            page.running().is_some()
        });
        assert!(notices.is_empty());

        let report = page.report.as_ref().unwrap();
        assert_eq!(report.total(), 4);
        assert_eq!(report.tiers[1], RiskTier::Warning);
        assert_eq!(report.tiers[2], RiskTier::HighRisk);
        assert_eq!(page.visible_rows(), vec![1, 2]);
        assert!(page.log.iter().any(|l| l == "Total samples: 4"));
    }

    #[test]
    fn test_analysis_of_replaced_traffic_is_discarded() {
        let ctx = egui::Context::default();
        let mut notices = Notices::default();
        let mut page = MonitorPage::default();
        page.traffic = Some(traffic());
        page.start_analysis(&slot_with_model(), &AppConfig::default(), &ctx)
            .unwrap();

        // New traffic lands before the analysis reports.
        page.traffic = Some(traffic());

        settle(|| {
            page.poll(&mut notices);
            page.running().is_some()
        });

        assert!(page.report.is_none());
        assert!(page
            .log
            .iter()
            .any(|l| l == "Analysis discarded: the traffic data changed."));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_tier_filter_toggles() {
        let mut page = MonitorPage::default();
        page.report = Some(RiskReport::new(
            vec![0.1, 0.6, 0.9],
            AppConfig::default().risk,
        ));
        assert_eq!(page.visible_rows(), vec![1, 2]);
        page.toggle_tier(RiskTier::Warning);
        assert_eq!(page.visible_rows(), vec![2]);
        page.toggle_tier(RiskTier::Safe);
        assert_eq!(page.visible_rows(), vec![0, 2]);
    }

    #[test]
    fn test_second_analysis_rejected_while_busy() {
        let ctx = egui::Context::default();
        let mut page = MonitorPage::default();
        page.traffic = Some(traffic());
        let slot = slot_with_model();
        let config = AppConfig::default();
        page.start_analysis(&slot, &config, &ctx).unwrap();
        // The slot stays occupied until polled.
        let err = page.start_analysis(&slot, &config, &ctx).unwrap_err();
        assert!(matches!(err, WorkbenchError::Task(_)));
        assert_eq!(page.log.len(), 1);
        page.cancel();
        assert!(page.running().is_none());
    }
}
