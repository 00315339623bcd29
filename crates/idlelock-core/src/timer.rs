//! Idle timer with a single live deadline
//!
//! Each `reset` aborts the previous sleep task and bumps the epoch. The fire
//! callback receives the epoch it was scheduled under, and the owner confirms
//! it with [`IdleTimer::claim`] before acting on it. A fire that was already
//! queued when the timer was reset or cancelled fails the claim.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

type FireCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Deadline offset used when `now + duration` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Holds at most one scheduled timeout
pub struct IdleTimer {
    epoch: u64,
    task: Option<JoinHandle<()>>,
    on_fire: FireCallback,
}

impl IdleTimer {
    /// Create an idle timer that calls `on_fire` with the epoch of each expiry
    pub fn new<F>(on_fire: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        Self {
            epoch: 0,
            task: None,
            on_fire: Arc::new(on_fire),
        }
    }

    /// Cancel any pending timeout and schedule a new one `duration` from now
    ///
    /// Returns the epoch of the new deadline. Must be called within a tokio runtime.
    pub fn reset(&mut self, duration: Duration) -> u64 {
        self.abort();
        self.epoch = self.epoch.wrapping_add(1);

        let epoch = self.epoch;
        let now = Instant::now();
        let deadline = now
            .checked_add(duration)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let on_fire = Arc::clone(&self.on_fire);
        self.task = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            on_fire(epoch);
        }));

        epoch
    }

    /// Cancel any pending timeout; no-op if none is pending
    pub fn cancel(&mut self) {
        if self.task.is_some() {
            debug!(epoch = self.epoch, "Idle timer cancelled");
        }
        self.abort();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Accept a fire for `epoch` if it belongs to the live deadline
    ///
    /// A successful claim leaves the timer with nothing pending.
    pub fn claim(&mut self, epoch: u64) -> bool {
        if self.task.is_some() && epoch == self.epoch {
            self.task = None;
            true
        } else {
            debug!(epoch, live = self.epoch, "Discarding stale idle timer fire");
            false
        }
    }

    /// Whether a deadline is outstanding (scheduled or fired but not claimed)
    pub fn is_pending(&self) -> bool {
        self.task.is_some()
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.abort();
    }
}
