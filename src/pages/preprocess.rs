use std::path::{Path, PathBuf};
use std::time::Duration;

use eframe::egui;

use super::{submit_table_load, take_load, LoadResult};
use crate::config::AppConfig;
use crate::data::model::Table;
use crate::data::selection::{parse_columns, parse_rows, resolve_columns, ColumnRef};
use crate::data::transform::Transform;
use crate::data::writer::save_file;
use crate::error::WorkbenchError;
use crate::state::Notices;
use crate::tasks::{TaskPoll, TaskSlot};
use crate::ui::table::RowWindow;

/// Transforms driven by the selection text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    DropColumns,
    DropRows,
    Normalize,
    OneHot,
    Clean,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::DropColumns,
        Operation::DropRows,
        Operation::Normalize,
        Operation::OneHot,
        Operation::Clean,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Operation::DropColumns => "Delete columns",
            Operation::DropRows => "Delete rows",
            Operation::Normalize => "Normalize",
            Operation::OneHot => "One-hot encode",
            Operation::Clean => "Remove dirty data",
        }
    }

    /// Build the transform from the raw selection input.
    pub fn transform(&self, input: &str) -> Result<Transform, WorkbenchError> {
        Ok(match self {
            Operation::DropColumns => Transform::DropColumns(parse_columns(input)?),
            Operation::DropRows => Transform::DropRows(parse_rows(input)?),
            Operation::Normalize => Transform::MinMaxScale(parse_columns(input)?),
            Operation::OneHot => Transform::OneHotEncode(parse_columns(input)?),
            Operation::Clean => Transform::Clean,
        })
    }
}

/// Open PCA component-count prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaPrompt {
    pub columns: Vec<ColumnRef>,
    /// Number of selected columns, the upper bound for `components`.
    pub width: usize,
    pub components: usize,
}

pub struct PreprocessPage {
    pub table: Option<Table>,
    pub source: Option<PathBuf>,
    pub selection_input: String,
    pub window: RowWindow,
    pub pca_prompt: Option<PcaPrompt>,
    load_task: TaskSlot<LoadResult<Table>>,
    save_task: TaskSlot<(PathBuf, anyhow::Result<()>)>,
}

impl PreprocessPage {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            table: None,
            source: None,
            selection_input: String::new(),
            window: RowWindow::new(&config.table),
            pca_prompt: None,
            load_task: TaskSlot::default(),
            save_task: TaskSlot::default(),
        }
    }

    fn table(&self) -> Result<&Table, WorkbenchError> {
        self.table.as_ref().ok_or(WorkbenchError::NoTable)
    }

    pub fn start_load(&mut self, path: &Path, ctx: &egui::Context) -> Result<(), WorkbenchError> {
        submit_table_load(&mut self.load_task, path, ctx)
    }

    /// Save a snapshot of the current table in the background.
    pub fn start_save(&mut self, path: &Path, ctx: &egui::Context) -> Result<(), WorkbenchError> {
        let snapshot = self.table()?.clone();
        let path = path.to_path_buf();
        self.save_task.submit("Saving data", ctx, move || {
            let result = save_file(&snapshot, &path);
            (path, result)
        })?;
        Ok(())
    }

    pub fn poll(&mut self, notices: &mut Notices) {
        if let Some((path, table)) = take_load(self.load_task.poll(), "file", notices) {
            log::info!(
                "Loaded {} rows with columns {:?}",
                table.n_rows(),
                table.column_names()
            );
            self.set_table(table);
            self.source = Some(path);
        }

        match self.save_task.poll() {
            TaskPoll::Done((path, Ok(()))) => {
                log::info!("Saved table to {}", path.display());
                notices.info("Saved", format!("File saved to {}", path.display()));
            }
            TaskPoll::Done((path, Err(e))) => {
                log::error!("Failed to save {}: {e:#}", path.display());
                notices.error("Failed to save file", format!("{e:#}"));
            }
            TaskPoll::Failed(msg) => notices.error("Failed to save file", msg),
            TaskPoll::Idle | TaskPoll::Running => {}
        }
    }

    /// Replace the table with a freshly loaded one.
    pub fn set_table(&mut self, table: Table) {
        self.table = Some(table);
        self.window.reset();
        self.pca_prompt = None;
    }

    /// Apply a transform; the table is replaced only on success. Returns the
    /// transform's warnings.
    pub fn apply(&mut self, transform: &Transform) -> Result<Vec<String>, WorkbenchError> {
        let outcome = transform.apply(self.table()?)?;
        log::info!(
            "{}: table is now {} rows x {} columns",
            transform.name(),
            outcome.table.n_rows(),
            outcome.table.n_cols()
        );
        self.table = Some(outcome.table);
        Ok(outcome.warnings)
    }

    /// Run a selection-driven operation.
    pub fn run(&mut self, op: Operation) -> Result<Vec<String>, WorkbenchError> {
        self.table()?;
        let transform = op.transform(&self.selection_input)?;
        self.apply(&transform)
    }

    /// Validate the column selection and open the component prompt.
    pub fn open_pca_prompt(&mut self) -> Result<(), WorkbenchError> {
        let table = self.table()?;
        let columns = parse_columns(&self.selection_input)?;
        let width = resolve_columns(table, &columns)?.len();
        self.pca_prompt = Some(PcaPrompt {
            columns,
            width,
            components: width.min(2),
        });
        Ok(())
    }

    /// Run PCA with the prompt's component count. The prompt closes either
    /// way.
    pub fn confirm_pca(&mut self) -> Result<Vec<String>, WorkbenchError> {
        let Some(prompt) = self.pca_prompt.take() else {
            return Ok(Vec::new());
        };
        self.apply(&Transform::Pca {
            columns: prompt.columns,
            components: prompt.components,
        })
    }

    pub fn running(&self) -> Option<(&str, Duration)> {
        self.load_task.running().or_else(|| self.save_task.running())
    }

    pub fn cancel(&mut self) {
        self.load_task.cancel();
        self.save_task.cancel();
    }
}
