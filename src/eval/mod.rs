//! Scoring tables with a predictor: labeled evaluation and risk monitoring.

pub mod metrics;
pub mod predictor;
pub mod risk;

use crate::config::AppConfig;
use crate::data::model::{Cell, Table};

use metrics::{evaluate, EvaluationResult};
use predictor::{align_features, FeatureMatrix, PredictError, Predictor};
use risk::RiskReport;

/// Outcome of evaluating a model against a table.
#[derive(Debug, Clone)]
pub enum Evaluation {
    /// The table had the target column: metrics against ground truth.
    Labeled(EvaluationResult),
    /// No ground truth: risk scores only.
    Unlabeled(RiskReport),
}

fn features(table: &Table, predictor: &dyn Predictor, target: &str) -> Result<FeatureMatrix, PredictError> {
    let features = align_features(table, predictor, target)?;
    log::debug!(
        "scoring {} rows with {} on features {:?}",
        features.rows.len(),
        predictor.name(),
        features.names
    );
    Ok(features)
}

/// Probabilities clamped to [0, 1], NaN as 0.
fn probabilities(predictor: &dyn Predictor, features: &FeatureMatrix) -> Vec<f64> {
    predictor
        .predict_proba(features)
        .into_iter()
        .map(|p| if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) })
        .collect()
}

/// Positive-class probability for every row, clamped to [0, 1].
pub fn score(table: &Table, predictor: &dyn Predictor, target: &str) -> Result<Vec<f64>, PredictError> {
    let features = features(table, predictor, target)?;
    Ok(probabilities(predictor, &features))
}

/// Read the 0/1 ground-truth column.
pub fn labels(table: &Table, target: &str) -> Result<Vec<bool>, PredictError> {
    let column = table
        .column(target)
        .ok_or_else(|| PredictError::MissingTarget(target.to_string()))?;
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Cell::Bool(b) => Ok(*b),
            Cell::Integer(0) => Ok(false),
            Cell::Integer(1) => Ok(true),
            Cell::Float(f) if *f == 0.0 => Ok(false),
            Cell::Float(f) if *f == 1.0 => Ok(true),
            other => Err(PredictError::InvalidLabel {
                row,
                value: other.to_string(),
            }),
        })
        .collect()
}

/// Metrics when the target column exists, risk report otherwise.
pub fn evaluate_table(
    table: &Table,
    predictor: &dyn Predictor,
    config: &AppConfig,
) -> Result<Evaluation, PredictError> {
    let target = config.target_column.as_str();
    let features = features(table, predictor, target)?;
    let scores = probabilities(predictor, &features);
    if table.column(target).is_some() {
        let truth = labels(table, target)?;
        let predicted = predictor.predict(&features);
        Ok(Evaluation::Labeled(evaluate(&truth, &scores, &predicted)))
    } else {
        log::info!("no '{target}' column; reporting risk scores only");
        Ok(Evaluation::Unlabeled(RiskReport::new(scores, config.risk)))
    }
}

/// Risk scores and tiers for a traffic table.
pub fn monitor_table(
    table: &Table,
    predictor: &dyn Predictor,
    config: &AppConfig,
) -> Result<RiskReport, PredictError> {
    let scores = score(table, predictor, &config.target_column)?;
    Ok(RiskReport::new(scores, config.risk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;
    use predictor::ModelSpec;

    fn model() -> std::sync::Arc<dyn Predictor> {
        ModelSpec::Threshold {
            feature: "packets".into(),
            cutoff: 100.0,
            scale: 10.0,
        }
        .into_predictor()
        .unwrap()
    }

    fn traffic(with_label: bool) -> Table {
        let mut columns = vec![Column::new(
            "packets",
            vec![
                Cell::Integer(10),
                Cell::Integer(250),
                Cell::Integer(90),
                Cell::Integer(400),
            ],
        )];
        if with_label {
            columns.push(Column::new(
                "label",
                vec![
                    Cell::Integer(0),
                    Cell::Integer(1),
                    Cell::Integer(1),
                    Cell::Integer(1),
                ],
            ));
        }
        Table::from_columns(columns).unwrap()
    }

    #[test]
    fn test_labeled_table_yields_metrics() {
        let eval = evaluate_table(&traffic(true), model().as_ref(), &AppConfig::default()).unwrap();
        let Evaluation::Labeled(result) = eval else {
            panic!("expected labeled evaluation");
        };
        assert_eq!(result.confusion.matrix, [[1, 0], [1, 2]]);
        assert_eq!(result.accuracy, 0.75);
        assert_eq!(result.precision, 1.0);
        assert_eq!(result.auc, Some(1.0));
    }

    /// Scores above the default 0.5 but under its own threshold.
    struct StrictModel;

    impl Predictor for StrictModel {
        fn name(&self) -> String {
            "strict".into()
        }

        fn n_features(&self) -> Option<usize> {
            Some(1)
        }

        fn predict_proba(&self, features: &FeatureMatrix) -> Vec<f64> {
            features.rows.iter().map(|r| if r[0] > 100.0 { 0.95 } else { 0.7 }).collect()
        }

        fn threshold(&self) -> f64 {
            0.9
        }
    }

    #[test]
    fn test_hard_predictions_use_model_threshold() {
        let eval = evaluate_table(&traffic(true), &StrictModel, &AppConfig::default()).unwrap();
        let Evaluation::Labeled(result) = eval else {
            panic!("expected labeled evaluation");
        };
        // Rows 10 and 90 score 0.7: negative under a 0.9 threshold.
        assert_eq!(result.confusion.matrix, [[1, 0], [1, 2]]);
        assert_eq!(
            StrictModel.predict(&FeatureMatrix {
                names: vec!["packets".into()],
                rows: vec![vec![10.0], vec![250.0]],
            }),
            vec![false, true]
        );
    }

    #[test]
    fn test_single_class_labels_leave_auc_undefined() {
        let t = Table::from_columns(vec![
            Column::new("packets", vec![Cell::Integer(150), Cell::Integer(20)]),
            Column::new("label", vec![Cell::Integer(1), Cell::Integer(1)]),
        ])
        .unwrap();
        let eval = evaluate_table(&t, model().as_ref(), &AppConfig::default()).unwrap();
        let Evaluation::Labeled(result) = eval else {
            panic!("expected labeled evaluation");
        };
        assert_eq!(result.auc, None);
        assert!(result.roc.is_none());
        assert_eq!(result.recall, 0.5);
    }

    #[test]
    fn test_unlabeled_table_yields_risk() {
        let eval = evaluate_table(&traffic(false), model().as_ref(), &AppConfig::default()).unwrap();
        let Evaluation::Unlabeled(report) = eval else {
            panic!("expected risk report");
        };
        assert_eq!(report.total(), 4);
        assert_eq!(report.risky, 2);
    }

    #[test]
    fn test_bad_label_reported() {
        let t = Table::from_columns(vec![
            Column::new("packets", vec![Cell::Integer(1)]),
            Column::new("label", vec![Cell::Text("attack".into())]),
        ])
        .unwrap();
        assert_eq!(
            evaluate_table(&t, model().as_ref(), &AppConfig::default()).unwrap_err(),
            PredictError::InvalidLabel {
                row: 0,
                value: "attack".into()
            }
        );
    }
}
