use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use super::{is_current, submit_table_load, take_load, LoadResult, ModelSlot};
use crate::config::AppConfig;
use crate::data::model::Table;
use crate::error::WorkbenchError;
use crate::eval::metrics::EvaluationResult;
use crate::eval::predictor::PredictError;
use crate::eval::{evaluate_table, Evaluation};
use crate::state::Notices;
use crate::tasks::{TaskPoll, TaskSlot};

#[derive(Default)]
pub struct EvaluatePage {
    pub data: Option<Arc<Table>>,
    pub source: Option<PathBuf>,
    pub evaluation: Option<Evaluation>,
    pub log: Vec<String>,
    load_task: TaskSlot<LoadResult<Table>>,
    /// Carries the table it scored so a result for replaced data is dropped.
    eval_task: TaskSlot<(Arc<Table>, Result<Evaluation, PredictError>)>,
}

impl EvaluatePage {
    pub fn log(&mut self, line: String) {
        self.log.push(line);
    }

    pub fn start_load(&mut self, path: &Path, ctx: &egui::Context) -> Result<(), WorkbenchError> {
        submit_table_load(&mut self.load_task, path, ctx)
    }

    pub fn start_evaluation(
        &mut self,
        model: &ModelSlot,
        config: &AppConfig,
        ctx: &egui::Context,
    ) -> Result<(), WorkbenchError> {
        let model = model.require()?;
        let data = self.data.clone().ok_or(WorkbenchError::NoTable)?;
        let config = config.clone();
        self.eval_task.submit("Evaluating model", ctx, move || {
            let result = evaluate_table(&data, model.predictor.as_ref(), &config);
            (data, result)
        })?;
        self.log.push("Evaluating model...".to_string());
        Ok(())
    }

    pub fn poll(&mut self, notices: &mut Notices) {
        if let Some((path, table)) = take_load(self.load_task.poll(), "evaluation data", notices) {
            self.log.push(format!(
                "Evaluation data {} loaded: {} rows, {} columns.",
                path.display(),
                table.n_rows(),
                table.n_cols()
            ));
            self.data = Some(Arc::new(table));
            self.source = Some(path);
            self.evaluation = None;
        }

        match self.eval_task.poll() {
            TaskPoll::Done((data, _)) if !is_current(&self.data, &data) => {
                log::warn!("discarding evaluation of data that is no longer loaded");
                self.log
                    .push("Evaluation discarded: the evaluation data changed.".to_string());
            }
            TaskPoll::Done((_, Ok(evaluation))) => self.set_evaluation(evaluation, notices),
            TaskPoll::Done((_, Err(e))) => {
                log::error!("evaluation failed: {e}");
                self.log.push(format!("Evaluation failed: {e}"));
                notices.error("Evaluation failed", e.to_string());
            }
            TaskPoll::Failed(msg) => notices.error("Evaluation failed", msg),
            TaskPoll::Idle | TaskPoll::Running => {}
        }
    }

    fn set_evaluation(&mut self, evaluation: Evaluation, notices: &mut Notices) {
        match &evaluation {
            Evaluation::Labeled(result) => {
                log::info!(
                    "evaluation: accuracy {:.4}, auc {}",
                    result.accuracy,
                    result.auc_label()
                );
                self.log.extend(metric_lines(result));
                if result.auc.is_none() {
                    notices.warn(
                        "AUC undefined",
                        "The ground truth column holds a single class, so the ROC curve and AUC \
                         cannot be computed.",
                    );
                }
            }
            Evaluation::Unlabeled(report) => {
                self.log
                    .push("No ground truth column; showing risk scores only.".to_string());
                self.log.extend(report.summary_lines());
            }
        }
        self.evaluation = Some(evaluation);
    }

    pub fn labeled(&self) -> Option<&EvaluationResult> {
        match &self.evaluation {
            Some(Evaluation::Labeled(result)) => Some(result),
            _ => None,
        }
    }

    pub fn running(&self) -> Option<(&str, Duration)> {
        self.load_task.running().or_else(|| self.eval_task.running())
    }

    pub fn cancel(&mut self) {
        self.load_task.cancel();
        self.eval_task.cancel();
    }
}

/// Log block for a labeled evaluation.
pub fn metric_lines(result: &EvaluationResult) -> Vec<String> {
    let c = &result.confusion;
    vec![
        "Evaluation results:".to_string(),
        format!("Accuracy: {:.4}", result.accuracy),
        format!("Precision: {:.4}", result.precision),
        format!("Recall: {:.4}", result.recall),
        format!("F1 score: {:.4}", result.f1),
        format!("AUC: {}", result.auc_label()),
        format!(
            "Confusion matrix: TN={} FP={} FN={} TP={}",
            c.true_negatives(),
            c.false_positives(),
            c.false_negatives(),
            c.true_positives()
        ),
    ]
}
