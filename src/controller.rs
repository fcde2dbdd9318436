use chrono::{DateTime, Local};
use std::future::Future;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::history::{self, RunRecord};
use crate::reminder::{self, Alerter, Reminder};

const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Status {
    pub active: bool,
    pub task: Option<String>,
    pub interval_secs: Option<u64>,
    pub fires: u64,
    pub started_at: Option<DateTime<Local>>,
}

impl Status {
    fn idle() -> Self {
        Status {
            active: false,
            task: None,
            interval_secs: None,
            fires: 0,
            started_at: None,
        }
    }
}

struct Active {
    reminder: Reminder,
    started_at: DateTime<Local>,
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<u64>,
    done: watch::Receiver<bool>,
    fires: Arc<AtomicU64>,
}

/// Owns at most one background reminder loop at a time.
pub struct Controller {
    alerter: Arc<dyn Alerter>,
    history: Option<PathBuf>,
    active: Mutex<Option<Active>>,
}

impl Controller {
    /// `history` is where finished runs are appended; `None` keeps no record.
    pub fn new(alerter: Arc<dyn Alerter>, history: Option<PathBuf>) -> Self {
        Controller {
            alerter,
            history,
            active: Mutex::new(None),
        }
    }

    /// Replaces any running reminder with `reminder`.
    pub async fn start(&self, reminder: Reminder, limit: Option<u64>) {
        let mut slot = self.active.lock().await;
        if let Some(previous) = slot.take() {
            self.finish(previous).await;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done) = watch::channel(false);
        let fires = Arc::new(AtomicU64::new(0));
        let run = reminder::run_loop(
            reminder.clone(),
            self.alerter.clone(),
            stop_rx,
            limit,
            fires.clone(),
        );
        let handle = tokio::spawn(async move {
            let n = run.await;
            let _ = done_tx.send(true);
            n
        });
        info!(task = %reminder.task, every = %reminder.interval.human(), "reminder started");

        *slot = Some(Active {
            reminder,
            started_at: Local::now(),
            stop_tx,
            handle,
            done,
            fires,
        });
    }

    /// Resolves once the running loop ends on its own. Returns at once when idle.
    pub async fn finished(&self) {
        let done = self.active.lock().await.as_ref().map(|a| a.done.clone());
        if let Some(mut done) = done {
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    /// Runs `reminder` until its limit is reached or `shutdown` resolves, then
    /// stops it and returns the finished run.
    pub async fn run_until(
        &self,
        reminder: Reminder,
        limit: Option<u64>,
        shutdown: impl Future<Output = ()>,
    ) -> Option<RunRecord> {
        self.start(reminder, limit).await;
        tokio::select! {
            _ = self.finished() => {}
            _ = shutdown => {}
        }
        self.stop().await
    }

    pub async fn stop(&self) -> Option<RunRecord> {
        let active = self.active.lock().await.take()?;
        Some(self.finish(active).await)
    }

    pub async fn status(&self) -> Status {
        let mut slot = self.active.lock().await;
        // a loop that hit its limit is done; record it and report idle
        if slot.as_ref().is_some_and(|a| a.handle.is_finished()) {
            if let Some(done) = slot.take() {
                self.finish(done).await;
            }
        }
        match slot.as_ref() {
            Some(a) => Status {
                active: true,
                task: Some(a.reminder.task.clone()),
                interval_secs: Some(a.reminder.interval.total_secs),
                fires: a.fires.load(Ordering::Relaxed),
                started_at: Some(a.started_at),
            },
            None => Status::idle(),
        }
    }

    async fn finish(&self, active: Active) -> RunRecord {
        let _ = active.stop_tx.send(true);
        let fires = match tokio::time::timeout(STOP_GRACE, active.handle).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!(error = %e, "reminder loop failed");
                active.fires.load(Ordering::Relaxed)
            }
            Err(_) => {
                warn!(task = %active.reminder.task, "reminder loop did not stop in time");
                active.fires.load(Ordering::Relaxed)
            }
        };

        let record = RunRecord {
            task: active.reminder.task,
            interval_secs: active.reminder.interval.total_secs,
            fires,
            started_at: active.started_at,
            stopped_at: Local::now(),
        };
        info!(task = %record.task, fires, "reminder stopped");

        if let Some(path) = &self.history {
            if let Err(e) = history::append_entry(path, &record) {
                warn!(path = %path.display(), error = %e, "failed to write history");
            }
        }
        record
    }
}
