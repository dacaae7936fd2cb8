use std::collections::VecDeque;
use std::fmt;

use crate::config::AppConfig;
use crate::pages::evaluate::EvaluatePage;
use crate::pages::monitor::MonitorPage;
use crate::pages::preprocess::PreprocessPage;
use crate::pages::ModelSlot;

// ---------------------------------------------------------------------------
// Dialog notices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// One message box waiting to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub text: String,
}

/// Queue of message boxes; the UI shows the front one until dismissed.
#[derive(Debug, Default)]
pub struct Notices {
    queue: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, level: NoticeLevel, title: impl Into<String>, text: impl Into<String>) {
        self.queue.push_back(Notice {
            level,
            title: title.into(),
            text: text.into(),
        });
    }

    pub fn info(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.push(NoticeLevel::Info, title, text);
    }

    pub fn warn(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.push(NoticeLevel::Warning, title, text);
    }

    pub fn error(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.push(NoticeLevel::Error, title, text);
    }

    /// Report an action's error, if any.
    pub fn report<T, E: fmt::Display>(&mut self, title: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{title}: {e}");
                self.error(title, e.to_string());
                None
            }
        }
    }

    pub fn front(&self) -> Option<&Notice> {
        self.queue.front()
    }

    pub fn dismiss(&mut self) {
        self.queue.pop_front();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Preprocess,
    Monitor,
    Evaluate,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Preprocess, Tab::Monitor, Tab::Evaluate];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Preprocess => "Data Preprocessing",
            Tab::Monitor => "Traffic Monitoring",
            Tab::Evaluate => "Model Evaluation",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,
    pub tab: Tab,
    /// Model shared by the monitor and evaluation pages.
    pub model: ModelSlot,
    pub preprocess: PreprocessPage,
    pub monitor: MonitorPage,
    pub evaluate: EvaluatePage,
    pub notices: Notices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            preprocess: PreprocessPage::new(&config),
            monitor: MonitorPage::default(),
            evaluate: EvaluatePage::default(),
            model: ModelSlot::default(),
            tab: Tab::Preprocess,
            notices: Notices::default(),
            config,
        }
    }

    /// Pick up finished background work. Called once per frame, before
    /// anything is drawn.
    pub fn poll_tasks(&mut self) {
        if let Some(line) = self.model.poll(&mut self.notices) {
            self.monitor.log(line.clone());
            self.evaluate.log(line);
        }
        self.preprocess.poll(&mut self.notices);
        self.monitor.poll(&mut self.notices);
        self.evaluate.poll(&mut self.notices);
    }

    /// Label and elapsed seconds of the first running task, for the
    /// progress overlay.
    pub fn busy(&self) -> Option<(String, f32)> {
        [
            self.model.running(),
            self.preprocess.running(),
            self.monitor.running(),
            self.evaluate.running(),
        ]
        .into_iter()
        .flatten()
        .next()
        .map(|(label, elapsed)| (label.to_string(), elapsed.as_secs_f32()))
    }

    /// Drop every running task's result.
    pub fn cancel_all(&mut self) {
        self.model.cancel();
        self.preprocess.cancel();
        self.monitor.cancel();
        self.evaluate.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_queue_in_order() {
        let mut notices = Notices::default();
        notices.info("a", "first");
        notices.error("b", "second");
        assert_eq!(notices.len(), 2);
        assert_eq!(notices.front().unwrap().text, "first");
        notices.dismiss();
        assert_eq!(notices.front().unwrap().level, NoticeLevel::Error);
        notices.dismiss();
        assert!(notices.front().is_none());
    }

    #[test]
    fn test_report_passes_ok_through() {
        let mut notices = Notices::default();
        assert_eq!(notices.report::<_, String>("x", Ok(3)), Some(3));
        assert_eq!(notices.report::<i32, _>("x", Err("bad")), None);
        assert_eq!(notices.front().unwrap().text, "bad");
    }

    #[test]
    fn test_fresh_state_is_idle() {
        let state = AppState::new(AppConfig::default());
        assert!(state.busy().is_none());
        assert!(state.model.get().is_none());
        assert_eq!(state.tab, Tab::Preprocess);
    }
}
