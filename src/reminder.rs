use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::duration::Interval;
use crate::error::{NudgeError, Result};
use crate::notify::{self, NotifySettings};
use crate::sound::Sound;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task: String,
    pub interval: Interval,
}

impl Reminder {
    /// Rejects an empty task and any interval shorter than `min_secs`.
    pub fn new(task: &str, interval: Interval, min_secs: u64) -> Result<Self> {
        let task = Self::checked_task(task)?;
        if interval.total_secs < min_secs {
            return Err(NudgeError::IntervalTooShort { min_secs });
        }
        Ok(Reminder { task, interval })
    }

    /// Like [`Reminder::new`], but raises a short interval to `min_secs`.
    pub fn clamped(task: &str, interval: Interval, min_secs: u64) -> Result<Self> {
        let task = Self::checked_task(task)?;
        let interval = Interval::from_secs(interval.total_secs.max(min_secs));
        Ok(Reminder { task, interval })
    }

    fn checked_task(task: &str) -> Result<String> {
        let task = task.trim();
        if task.is_empty() {
            return Err(NudgeError::EmptyTask);
        }
        Ok(task.to_string())
    }

    pub fn message(&self) -> String {
        format!("Don't forget: {}", self.task)
    }
}

/// Side effects of a single reminder firing.
pub trait Alerter: Send + Sync + 'static {
    /// Called on the blocking pool; `n` counts from 1.
    fn fire(&self, reminder: &Reminder, n: u64);
}

pub struct DesktopAlerter {
    pub notify: NotifySettings,
    pub sound: Sound,
    /// Print a banner to stdout for each alert.
    pub echo: bool,
}

impl Alerter for DesktopAlerter {
    fn fire(&self, reminder: &Reminder, n: u64) {
        if let Err(e) = notify::send(&self.notify, &reminder.message()) {
            warn!(error = %e, "notification not delivered");
        }
        if let Err(e) = self.sound.play() {
            warn!(error = %e, "sound not played");
        }
        info!(task = %reminder.task, n, "reminder sent");

        if self.echo {
            println!();
            println!("--- REMINDER #{n} ---");
            println!("ACTION REQUIRED: {}", reminder.task);
            println!("--------------------");
        }
    }
}

/// Fires `reminder` now and then once per interval until `stop` turns true,
/// the sender goes away, or `limit` alerts have fired. Returns the number fired.
pub async fn run_loop(
    reminder: Reminder,
    alerter: Arc<dyn Alerter>,
    mut stop: watch::Receiver<bool>,
    limit: Option<u64>,
    fires: Arc<AtomicU64>,
) -> u64 {
    let mut n = 0;
    debug!(task = %reminder.task, interval = reminder.interval.total_secs, "reminder loop started");

    loop {
        if *stop.borrow_and_update() || limit.is_some_and(|l| n >= l) {
            break;
        }

        n += 1;
        let alert = alerter.clone();
        let current = reminder.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || alert.fire(&current, n)).await {
            warn!(error = %e, "alert task failed");
        }
        fires.store(n, Ordering::Relaxed);

        if limit.is_some_and(|l| n >= l) {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(reminder.interval.as_std()) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!(task = %reminder.task, fires = n, "reminder loop stopped");
    n
}
