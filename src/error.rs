use crate::data::selection::SelectionError;
use crate::data::transform::TransformError;
use crate::eval::predictor::PredictError;
use crate::tasks::TaskError;

/// Errors surfaced to the user by page actions. I/O failures travel as
/// `anyhow::Error` inside task results instead.
#[derive(Debug, thiserror::Error)]
pub enum WorkbenchError {
    #[error("No data loaded. Open a traffic file first.")]
    NoTable,
    #[error("No model loaded. Load a model first.")]
    NoModel,
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Task(#[from] TaskError),
}
