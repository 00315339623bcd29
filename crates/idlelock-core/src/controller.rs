//! Lock controller and provider
//!
//! The controller is a single tokio task that owns the [`LockMachine`], the
//! [`IdleTimer`] and the state broadcast. Activity, timer expiries and
//! authentication results all arrive on one queue and are applied one at a
//! time; a transition's effects finish before the next command is read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::auth::{AuthOutcome, AuthenticationGateway};
use crate::config::LockConfig;
use crate::context::LockContext;
use crate::error::{LockError, Result};
use crate::machine::{Effect, LockEvent, LockMachine};
use crate::state::LockState;
use crate::timer::IdleTimer;

/// Commands queued for the controller task
#[derive(Debug)]
enum Command {
    Activity,
    UnlockRequested,
    TimeoutFired { epoch: u64 },
    AuthResolved { attempt: u64, outcome: AuthOutcome },
}

/// Sender side used by the activity surface and the overlay
///
/// Can only submit events; the lock state itself is read through [`LockContext`].
#[derive(Debug, Clone)]
pub struct LockHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl LockHandle {
    /// Report an interaction
    pub fn activity(&self) -> Result<()> {
        self.send(Command::Activity)
    }

    /// Ask for an unlock attempt
    pub fn request_unlock(&self) -> Result<()> {
        self.send(Command::UnlockRequested)
    }

    /// Whether the provider is still mounted
    pub fn is_mounted(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| LockError::Unmounted)
    }
}

struct LockController {
    machine: LockMachine,
    timer: IdleTimer,
    timeout: Duration,
    prompt: Arc<str>,
    gateway: Arc<dyn AuthenticationGateway>,
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Sender<LockState>,
}

impl LockController {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Command>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                command = rx.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
            }
        }

        let effects = self.machine.teardown();
        self.apply(effects);
        info!("Lock provider unmounted");
    }

    fn dispatch(&mut self, command: Command) {
        let event = match command {
            Command::Activity => LockEvent::Activity,
            Command::UnlockRequested => LockEvent::UnlockRequested,
            Command::TimeoutFired { epoch } => {
                if !self.timer.claim(epoch) {
                    return;
                }
                LockEvent::TimeoutFired
            }
            Command::AuthResolved { attempt, outcome } => {
                LockEvent::AuthResolved { attempt, outcome }
            }
        };

        let effects = self.machine.handle(event);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ResetTimer => {
                    let epoch = self.timer.reset(self.timeout);
                    debug!(epoch, timeout_ms = self.timeout.as_millis() as u64, "Idle timer reset");
                }
                Effect::CancelTimer => self.timer.cancel(),
                Effect::StartChallenge { attempt } => self.start_challenge(attempt),
                Effect::Publish(state) => {
                    self.state.send_replace(state);
                }
            }
        }
    }

    fn start_challenge(&self, attempt: u64) {
        let gateway = Arc::clone(&self.gateway);
        let prompt = Arc::clone(&self.prompt);
        let commands = self.commands.clone();

        tokio::spawn(async move {
            let outcome = if gateway.has_challenge().await {
                AuthOutcome::Challenge(gateway.challenge(&prompt).await)
            } else {
                AuthOutcome::NoChallenge
            };

            debug!(attempt, ?outcome, "Unlock attempt resolved");
            if commands
                .send(Command::AuthResolved { attempt, outcome })
                .is_err()
            {
                debug!(attempt, "Provider unmounted; dropping unlock result");
            }
        });
    }
}

/// A mounted lock: the controller task plus its handle and context
///
/// Dropping the provider unmounts it. Use [`LockProvider::unmount`] to also
/// wait for the controller to finish.
pub struct LockProvider {
    handle: LockHandle,
    context: LockContext,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl LockProvider {
    /// Mount a lock provider: state starts Unlocked and the idle timer starts now
    ///
    /// Must be called within a tokio runtime.
    pub fn mount(config: LockConfig, gateway: Arc<dyn AuthenticationGateway>) -> Result<Self> {
        config.validate()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let (state, state_rx) = watch::channel(LockState::Unlocked);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let timer = {
            let tx = tx.clone();
            IdleTimer::new(move |epoch| {
                let _ = tx.send(Command::TimeoutFired { epoch });
            })
        };

        let mut controller = LockController {
            machine: LockMachine::new(config.fallback),
            timer,
            timeout: config.timeout,
            prompt: Arc::from(config.prompt.as_str()),
            gateway,
            commands: tx.clone(),
            state,
        };

        // Arm the timer before returning so the idle clock starts at mount
        let effects = controller.machine.start();
        controller.apply(effects);

        info!(
            timeout_ms = config.timeout.as_millis() as u64,
            fallback = ?config.fallback,
            "Lock provider mounted"
        );

        let task = tokio::spawn(controller.run(rx, shutdown_rx));

        Ok(Self {
            handle: LockHandle { tx },
            context: LockContext::new(state_rx),
            shutdown: Some(shutdown_tx),
            task: Some(task),
            timeout: config.timeout,
        })
    }

    /// Handle for reporting activity and requesting unlock
    pub fn handle(&self) -> LockHandle {
        self.handle.clone()
    }

    /// Read-only view of the lock state
    pub fn context(&self) -> LockContext {
        self.context.clone()
    }

    /// Idle timeout this provider was mounted with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Tear down: cancel the idle timer and stop accepting events
    pub async fn unmount(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LockProvider {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
