use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("the table has no rows to score")]
    EmptyTable,
    #[error("the model expects features missing from the table: {}", .missing.join(", "))]
    FeatureMismatch { missing: Vec<String> },
    #[error("the model expects {expected} features, the table provides {found}")]
    FeatureCountMismatch { expected: usize, found: usize },
    #[error("feature '{column}' row {row} is not numeric")]
    NonNumericFeature { column: String, row: usize },
    #[error("label column '{0}' not found")]
    MissingTarget(String),
    #[error("row {row}: label '{value}' is not 0/1")]
    InvalidLabel { row: usize, value: String },
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

// ---------------------------------------------------------------------------
// Predictor capability
// ---------------------------------------------------------------------------

/// Numeric feature rows, columns in the order the predictor expects.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// Anything that scores traffic rows as a binary classifier.
pub trait Predictor: Send + Sync {
    /// Display name, e.g. "logistic (4 features)".
    fn name(&self) -> String;

    /// Feature columns the model was trained on, if it knows them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Number of features the model consumes, if fixed.
    fn n_features(&self) -> Option<usize> {
        self.feature_names().map(<[String]>::len)
    }

    /// Probability of the positive (risky) class for each row.
    fn predict_proba(&self, features: &FeatureMatrix) -> Vec<f64>;

    /// Decision threshold for [`Predictor::predict`].
    fn threshold(&self) -> f64 {
        0.5
    }

    /// Hard 0/1 predictions.
    fn predict(&self, features: &FeatureMatrix) -> Vec<bool> {
        let threshold = self.threshold();
        self.predict_proba(features)
            .into_iter()
            .map(|p| p >= threshold)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Linear model with a logistic link.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Vec<f64>,
    bias: f64,
    feature_names: Option<Vec<String>>,
    threshold: f64,
}

impl Predictor for LogisticModel {
    fn name(&self) -> String {
        format!("logistic ({} features)", self.weights.len())
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.weights.len())
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Vec<f64> {
        features
            .rows
            .iter()
            .map(|row| {
                let z: f64 = row.iter().zip(&self.weights).map(|(x, w)| x * w).sum();
                sigmoid(z + self.bias)
            })
            .collect()
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Stand-in model that ignores its input and returns seeded random
/// probabilities. The same seed always yields the same scores.
#[derive(Debug, Clone)]
pub struct RandomStub {
    seed: u64,
    feature_names: Option<Vec<String>>,
}

impl Predictor for RandomStub {
    fn name(&self) -> String {
        format!("random stub (seed {})", self.seed)
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Vec<f64> {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        features.rows.iter().map(|_| rng.random::<f64>()).collect()
    }
}

/// Single-feature cutoff scorer: `sigmoid((x - cutoff) / scale)`.
#[derive(Debug, Clone)]
pub struct ThresholdRule {
    feature: [String; 1],
    cutoff: f64,
    scale: f64,
}

impl Predictor for ThresholdRule {
    fn name(&self) -> String {
        format!("threshold on '{}' at {}", self.feature[0], self.cutoff)
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature)
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Vec<f64> {
        features
            .rows
            .iter()
            .map(|row| sigmoid((row[0] - self.cutoff) / self.scale))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Model file
// ---------------------------------------------------------------------------

fn default_threshold() -> f64 {
    0.5
}

fn default_scale() -> f64 {
    1.0
}

/// On-disk model description, tagged by `kind`:
///
/// ```json
/// { "kind": "logistic", "weights": [0.8, -1.2], "bias": 0.1,
///   "feature_names": ["bytes", "duration"] }
/// { "kind": "random_stub", "seed": 42 }
/// { "kind": "threshold", "feature": "packets", "cutoff": 500, "scale": 50 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic {
        weights: Vec<f64>,
        bias: f64,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    RandomStub {
        #[serde(default)]
        seed: u64,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    Threshold {
        feature: String,
        cutoff: f64,
        #[serde(default = "default_scale")]
        scale: f64,
    },
}

impl ModelSpec {
    /// Validate and build the concrete predictor.
    pub fn into_predictor(self) -> Result<Arc<dyn Predictor>, PredictError> {
        match self {
            ModelSpec::Logistic {
                weights,
                bias,
                feature_names,
                threshold,
            } => {
                if weights.is_empty() {
                    return Err(PredictError::InvalidModel("logistic model has no weights".into()));
                }
                if let Some(names) = &feature_names {
                    if names.len() != weights.len() {
                        return Err(PredictError::InvalidModel(format!(
                            "{} feature names for {} weights",
                            names.len(),
                            weights.len()
                        )));
                    }
                }
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(PredictError::InvalidModel(format!(
                        "threshold {threshold} is outside [0, 1]"
                    )));
                }
                Ok(Arc::new(LogisticModel {
                    weights,
                    bias,
                    feature_names,
                    threshold,
                }))
            }
            ModelSpec::RandomStub {
                seed,
                feature_names,
            } => Ok(Arc::new(RandomStub {
                seed,
                feature_names,
            })),
            ModelSpec::Threshold {
                feature,
                cutoff,
                scale,
            } => {
                if !(scale > 0.0) {
                    return Err(PredictError::InvalidModel(format!(
                        "scale must be positive, got {scale}"
                    )));
                }
                Ok(Arc::new(ThresholdRule {
                    feature: [feature],
                    cutoff,
                    scale,
                }))
            }
        }
    }
}

/// A predictor together with the file it came from.
pub struct LoadedModel {
    pub path: PathBuf,
    pub predictor: Arc<dyn Predictor>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("path", &self.path)
            .field("predictor", &self.predictor.name())
            .finish()
    }
}

/// Read and validate a model file.
pub fn load_model(path: &Path) -> Result<LoadedModel> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading model file {}", path.display()))?;
    let spec: ModelSpec = serde_json::from_str(&text).context("parsing model description")?;
    let predictor = spec.into_predictor()?;
    log::info!("loaded model {} from {}", predictor.name(), path.display());
    Ok(LoadedModel {
        path: path.to_path_buf(),
        predictor,
    })
}

// ---------------------------------------------------------------------------
// Feature alignment
// ---------------------------------------------------------------------------

/// Build the feature matrix the predictor expects from a table.
///
/// With named features, each name must exist in the table and the matrix
/// follows the model's order. Without names, every column except `target`
/// is used in table order and the count must match the model.
pub fn align_features(
    table: &Table,
    predictor: &dyn Predictor,
    target: &str,
) -> Result<FeatureMatrix, PredictError> {
    if table.n_rows() == 0 {
        return Err(PredictError::EmptyTable);
    }

    let indices: Vec<usize> = match predictor.feature_names() {
        Some(names) => {
            let missing: Vec<String> = names
                .iter()
                .filter(|n| table.column_index(n).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(PredictError::FeatureMismatch { missing });
            }
            names.iter().filter_map(|n| table.column_index(n)).collect()
        }
        None => {
            let indices: Vec<usize> = (0..table.n_cols())
                .filter(|&i| table.columns()[i].name != target)
                .collect();
            if let Some(expected) = predictor.n_features() {
                if expected != indices.len() {
                    return Err(PredictError::FeatureCountMismatch {
                        expected,
                        found: indices.len(),
                    });
                }
            }
            indices
        }
    };

    let names = indices
        .iter()
        .map(|&i| table.columns()[i].name.clone())
        .collect();
    let mut rows = Vec::with_capacity(table.n_rows());
    for r in 0..table.n_rows() {
        let mut row = Vec::with_capacity(indices.len());
        for &c in &indices {
            let column = &table.columns()[c];
            let value = column.values[r]
                .as_f64()
                .ok_or_else(|| PredictError::NonNumericFeature {
                    column: column.name.clone(),
                    row: r,
                })?;
            row.push(value);
        }
        rows.push(row);
    }

    Ok(FeatureMatrix { names, rows })
}
