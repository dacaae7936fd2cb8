use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui;

// ---------------------------------------------------------------------------
// Background task slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("'{0}' is still running; wait for it to finish")]
    Busy(String),
    #[error("failed to start worker thread: {0}")]
    Spawn(String),
}

/// What a slot has to report on this frame.
#[derive(Debug)]
pub enum TaskPoll<T> {
    Idle,
    Running,
    Done(T),
    /// The worker went away without a result (it panicked).
    Failed(String),
}

struct Pending<T> {
    label: String,
    started: Instant,
    rx: Receiver<T>,
}

/// Single-occupancy handle to a job running on its own thread.
///
/// The UI submits work, keeps drawing, and calls [`TaskSlot::poll`] every
/// frame; the worker requests a repaint when its result is ready. Results
/// are only ever applied by the caller of `poll`, i.e. on the UI thread.
pub struct TaskSlot<T> {
    pending: Option<Pending<T>>,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T: Send + 'static> TaskSlot<T> {
    /// Start `job` on a worker thread. Rejected while a job is running.
    pub fn submit<F>(&mut self, label: &str, ctx: &egui::Context, job: F) -> Result<(), TaskError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if let Some(p) = &self.pending {
            log::warn!("rejected '{label}': '{}' still running", p.label);
            return Err(TaskError::Busy(p.label.clone()));
        }

        let (tx, rx) = mpsc::channel();
        let waker = ctx.clone();
        let name = label.to_string();
        thread::Builder::new()
            .name(format!("task: {label}"))
            .spawn(move || {
                let result = job();
                if tx.send(result).is_err() {
                    log::debug!("'{name}' finished after cancellation; result discarded");
                }
                waker.request_repaint();
            })
            .map_err(|e| TaskError::Spawn(e.to_string()))?;

        log::info!("started '{label}'");
        self.pending = Some(Pending {
            label: label.to_string(),
            started: Instant::now(),
            rx,
        });
        Ok(())
    }

    /// Non-blocking check for a result.
    pub fn poll(&mut self) -> TaskPoll<T> {
        let Some(p) = &self.pending else {
            return TaskPoll::Idle;
        };
        match p.rx.try_recv() {
            Ok(result) => {
                log::info!("'{}' finished in {:.2?}", p.label, p.started.elapsed());
                self.pending = None;
                TaskPoll::Done(result)
            }
            Err(TryRecvError::Empty) => TaskPoll::Running,
            Err(TryRecvError::Disconnected) => {
                let label = p.label.clone();
                log::error!("'{label}' worker exited without a result");
                self.pending = None;
                TaskPoll::Failed(format!("'{label}' stopped unexpectedly"))
            }
        }
    }
}

impl<T> TaskSlot<T> {
    /// Label and elapsed time of the running job, for progress display.
    pub fn running(&self) -> Option<(&str, Duration)> {
        self.pending
            .as_ref()
            .map(|p| (p.label.as_str(), p.started.elapsed()))
    }

    /// Forget the running job. The worker runs to completion but its result
    /// is dropped.
    pub fn cancel(&mut self) {
        if let Some(p) = self.pending.take() {
            log::info!("cancelled '{}'", p.label);
        }
    }
}

#[cfg(test)]
impl<T: Send + 'static> TaskSlot<T> {
    /// Block until the running job reports.
    pub fn wait(&mut self) -> TaskPoll<T> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            match self.poll() {
                TaskPoll::Running if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(5))
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_submit_then_poll_result() {
        let ctx = egui::Context::default();
        let mut slot = TaskSlot::default();
        slot.submit("sum", &ctx, || 2 + 2).unwrap();
        assert!(matches!(slot.wait(), TaskPoll::Done(4)));
        assert!(slot.running().is_none());
        assert!(matches!(slot.poll(), TaskPoll::Idle));
    }

    #[test]
    fn test_busy_slot_rejects_second_submission() {
        let ctx = egui::Context::default();
        let (release_tx, release_rx) = channel::<()>();
        let mut slot = TaskSlot::default();
        slot.submit("load", &ctx, move || {
            let _ = release_rx.recv();
            1
        })
        .unwrap();

        let err = slot.submit("load again", &ctx, || 2).unwrap_err();
        assert_eq!(err, TaskError::Busy("load".into()));

        release_tx.send(()).unwrap();
        assert!(matches!(slot.wait(), TaskPoll::Done(1)));
    }

    #[test]
    fn test_cancelled_result_is_discarded() {
        let ctx = egui::Context::default();
        let (release_tx, release_rx) = channel::<()>();
        let mut slot = TaskSlot::default();
        slot.submit("slow", &ctx, move || {
            let _ = release_rx.recv();
            7
        })
        .unwrap();

        slot.cancel();
        assert!(slot.running().is_none());
        release_tx.send(()).unwrap();
        assert!(matches!(slot.poll(), TaskPoll::Idle));

        slot.submit("next", &ctx, || 8).unwrap();
        assert!(matches!(slot.wait(), TaskPoll::Done(8)));
    }

    #[test]
    fn test_panicking_worker_reports_failure() {
        let ctx = egui::Context::default();
        let mut slot: TaskSlot<i32> = TaskSlot::default();
        slot.submit("boom", &ctx, || panic!("worker failure")).unwrap();
        assert!(matches!(slot.wait(), TaskPoll::Failed(_)));
    }
}
