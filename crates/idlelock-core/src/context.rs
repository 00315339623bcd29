//! Read-only broadcast of the lock state
//!
//! Consumers hold a [`LockContext`] (or a [`Subscription`]) and never a
//! reference to the controller. Every snapshot is a whole [`LockState`]
//! published after a transition completed.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{LockError, Result};
use crate::state::LockState;

/// Observer side of the lock state
#[derive(Debug, Clone)]
pub struct LockContext {
    rx: watch::Receiver<LockState>,
}

impl LockContext {
    pub(crate) fn new(rx: watch::Receiver<LockState>) -> Self {
        Self { rx }
    }

    /// Latest published state
    pub fn state(&self) -> LockState {
        *self.rx.borrow()
    }

    /// Whether the overlay should currently be shown
    pub fn is_locked(&self) -> bool {
        self.state().is_locked()
    }

    /// Wait for the next published state
    ///
    /// Fails with [`LockError::Unmounted`] once the provider is gone.
    pub async fn changed(&mut self) -> Result<LockState> {
        self.rx.changed().await.map_err(|_| LockError::Unmounted)?;
        Ok(*self.rx.borrow_and_update())
    }

    /// Wait until the state equals `target`
    pub async fn wait_for(&mut self, target: LockState) -> Result<()> {
        self.rx
            .wait_for(|state| *state == target)
            .await
            .map_err(|_| LockError::Unmounted)?;
        Ok(())
    }

    /// Call `callback` with the current state and then with every published state
    ///
    /// Delivery stops when the returned [`Subscription`] is dropped or the
    /// provider unmounts. Must be called within a tokio runtime.
    pub fn subscribe<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(LockState) + Send + 'static,
    {
        let mut rx = self.rx.clone();
        let task = tokio::spawn(async move {
            let current = *rx.borrow_and_update();
            callback(current);
            while rx.changed().await.is_ok() {
                let state = *rx.borrow_and_update();
                callback(state);
            }
        });
        Subscription { task }
    }
}

/// Handle that keeps a [`LockContext::subscribe`] callback alive
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivering states to the callback
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
