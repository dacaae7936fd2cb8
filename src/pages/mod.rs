//! Page state and actions, independent of rendering.
//!
//! Every page follows the same loop: an action validates its preconditions
//! and submits a background task; `poll` picks up the result on the UI
//! thread and mutates page state.

pub mod evaluate;
pub mod monitor;
pub mod preprocess;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;

use crate::data::loader::load_file;
use crate::data::model::Table;
use crate::error::WorkbenchError;
use crate::eval::predictor::{load_model, LoadedModel};
use crate::state::Notices;
use crate::tasks::{TaskPoll, TaskSlot};

/// Result of a background file load, tagged with its source.
pub type LoadResult<T> = (PathBuf, anyhow::Result<T>);

/// Submit a table load for `path`.
pub(crate) fn submit_table_load(
    slot: &mut TaskSlot<LoadResult<Table>>,
    path: &Path,
    ctx: &egui::Context,
) -> Result<(), WorkbenchError> {
    let path = path.to_path_buf();
    slot.submit("Loading data", ctx, move || {
        let result = load_file(&path);
        (path, result)
    })?;
    Ok(())
}

/// Unwrap a finished load, reporting failures as error notices.
pub(crate) fn take_load<T>(
    poll: TaskPoll<LoadResult<T>>,
    what: &str,
    notices: &mut Notices,
) -> Option<(PathBuf, T)> {
    match poll {
        TaskPoll::Done((path, Ok(value))) => Some((path, value)),
        TaskPoll::Done((path, Err(e))) => {
            log::error!("Failed to load {what} {}: {e:#}", path.display());
            notices.error(format!("Failed to load {what}"), format!("{e:#}"));
            None
        }
        TaskPoll::Failed(msg) => {
            notices.error(format!("Failed to load {what}"), msg);
            None
        }
        TaskPoll::Idle | TaskPoll::Running => None,
    }
}

/// Whether `scored` is still the page's loaded table. Results computed for a
/// table that has since been replaced are dropped.
pub(crate) fn is_current(loaded: &Option<Arc<Table>>, scored: &Arc<Table>) -> bool {
    loaded.as_ref().is_some_and(|t| Arc::ptr_eq(t, scored))
}

/// Keep calling `poll_once` until it reports nothing running.
#[cfg(test)]
pub(crate) fn settle(mut poll_once: impl FnMut() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while poll_once() {
        assert!(std::time::Instant::now() < deadline, "background task did not finish");
        std::thread::sleep(Duration::from_millis(5));
    }
}

// ---------------------------------------------------------------------------
// Shared model
// ---------------------------------------------------------------------------

/// The model shared by the Monitor and Evaluate pages. Owned by the app and
/// handed to pages explicitly.
#[derive(Default)]
pub struct ModelSlot {
    model: Option<Arc<LoadedModel>>,
    task: TaskSlot<LoadResult<LoadedModel>>,
}

impl ModelSlot {
    pub fn get(&self) -> Option<&Arc<LoadedModel>> {
        self.model.as_ref()
    }

    /// The loaded model or a `NoModel` error.
    pub fn require(&self) -> Result<Arc<LoadedModel>, WorkbenchError> {
        self.model.clone().ok_or(WorkbenchError::NoModel)
    }

    pub fn start_load(&mut self, path: &Path, ctx: &egui::Context) -> Result<(), WorkbenchError> {
        let path = path.to_path_buf();
        self.task.submit("Loading model", ctx, move || {
            let result = load_model(&path);
            (path, result)
        })?;
        Ok(())
    }

    /// Apply a finished load. Returns the new model's description so pages
    /// can log it.
    pub fn poll(&mut self, notices: &mut Notices) -> Option<String> {
        let (path, model) = take_load(self.task.poll(), "model", notices)?;
        let line = format!("Model {} ({}) loaded.", path.display(), model.predictor.name());
        self.model = Some(Arc::new(model));
        Some(line)
    }

    pub fn running(&self) -> Option<(&str, Duration)> {
        self.task.running()
    }

    pub fn cancel(&mut self) {
        self.task.cancel();
    }

    #[cfg(test)]
    pub fn set(&mut self, model: LoadedModel) {
        self.model = Some(Arc::new(model));
    }
}
