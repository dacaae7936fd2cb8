//! Binary classification metrics: confusion matrix, precision/recall/F1, ROC.

use smartcore::metrics;
use smartcore::metrics::Metrics;

/// Confusion matrix for binary evaluation (row = truth, col = prediction,
/// index 1 is the positive class).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub matrix: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[bool], predicted: &[bool]) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    /// Add a prediction.
    pub fn add(&mut self, truth: bool, predicted: bool) {
        self.matrix[usize::from(truth)][usize::from(predicted)] += 1;
    }

    pub fn true_positives(&self) -> usize {
        self.matrix[1][1]
    }

    pub fn false_positives(&self) -> usize {
        self.matrix[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.matrix[1][0]
    }

    pub fn true_negatives(&self) -> usize {
        self.matrix[0][0]
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Rows whose ground truth is positive.
    pub fn positives(&self) -> usize {
        self.true_positives() + self.false_negatives()
    }

    pub fn negatives(&self) -> usize {
        self.true_negatives() + self.false_positives()
    }

    /// Precision of the positive class; 0 when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        let tp = self.true_positives();
        ratio(tp, tp + self.false_positives())
    }

    /// Recall of the positive class; 0 when there are no positives.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives(), self.positives())
    }

    /// F1 of the positive class, `2TP / (2TP + FP + FN)`.
    pub fn f1(&self) -> f64 {
        let tp2 = 2 * self.true_positives();
        ratio(tp2, tp2 + self.false_positives() + self.false_negatives())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// ROC curve as `(false positive rate, true positive rate)` points, from
/// (0, 0) to (1, 1), one point per distinct score.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub points: Vec<[f64; 2]>,
    /// Score threshold reached at each point; the first is `+inf`.
    pub thresholds: Vec<f64>,
}

/// Sweep thresholds over the distinct scores, highest first. `None` when
/// `truth` lacks either class, since one of the rates is then undefined.
pub fn roc_curve(truth: &[bool], scores: &[f64]) -> Option<RocCurve> {
    let positives = truth.iter().filter(|&&t| t).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len().min(truth.len())).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = vec![[0.0, 0.0]];
    let mut thresholds = vec![f64::INFINITY];
    let (mut tp, mut fp) = (0usize, 0usize);

    let mut i = 0;
    while i < order.len() {
        let score = scores[order[i]];
        // Tied scores move together.
        while i < order.len() && scores[order[i]] == score {
            if truth[order[i]] {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push([ratio(fp, negatives), ratio(tp, positives)]);
        thresholds.push(score);
    }

    Some(RocCurve { points, thresholds })
}

/// Everything computed by one labeled evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Absent when the ground truth holds a single class.
    pub roc: Option<RocCurve>,
    pub auc: Option<f64>,
}

impl EvaluationResult {
    /// AUC formatted for logs and the metric grid.
    pub fn auc_label(&self) -> String {
        match self.auc {
            Some(auc) => format!("{auc:.4}"),
            None => "undefined (single class)".to_string(),
        }
    }
}

fn as_labels(values: &[bool]) -> Vec<f64> {
    values.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect()
}

/// Compare hard predictions and positive-class scores against ground truth.
///
/// The binary metrics and ROC AUC come from `smartcore::metrics`, whose
/// binary branch needs both classes in `truth`. With a single class the
/// rates fall back to the confusion counts and the AUC is undefined.
/// Ratios with a zero denominator are reported as 0.
pub fn evaluate(truth: &[bool], scores: &[f64], predicted: &[bool]) -> EvaluationResult {
    let confusion = ConfusionMatrix::from_predictions(truth, predicted);
    let y_true = as_labels(truth);
    let y_pred = as_labels(predicted);

    let accuracy = if truth.is_empty() {
        0.0
    } else {
        metrics::accuracy::Accuracy::new().get_score(&y_true, &y_pred)
    };

    let roc = roc_curve(truth, scores);
    let (precision, recall, f1, auc) = if roc.is_some() {
        let precision = if confusion.true_positives() + confusion.false_positives() == 0 {
            0.0
        } else {
            metrics::precision(&y_true, &y_pred)
        };
        let recall = metrics::recall(&y_true, &y_pred);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            metrics::f1(&y_true, &y_pred, 1.0)
        };
        let y_score = scores.to_vec();
        let auc = metrics::roc_auc_score(&y_true, &y_score);
        (precision, recall, f1, Some(auc))
    } else {
        log::warn!(
            "ground truth holds a single class ({} positive of {}); AUC is undefined",
            confusion.positives(),
            confusion.total()
        );
        (confusion.precision(), confusion.recall(), confusion.f1(), None)
    };

    EvaluationResult {
        confusion,
        accuracy,
        precision,
        recall,
        f1,
        roc,
        auc,
    }
}
