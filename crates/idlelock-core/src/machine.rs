//! Lock state machine
//!
//! The machine performs no I/O. It consumes one [`LockEvent`] at a time and
//! returns the [`Effect`]s the driver has to carry out, in order, before the
//! next event is fed in. Keeping timers, tasks and channels out of here makes
//! every transition testable without a runtime.
//!
//! | State    | Event              | Effects                    | Next     |
//! |----------|--------------------|----------------------------|----------|
//! | Unlocked | Activity           | ResetTimer                 | Unlocked |
//! | Unlocked | TimeoutFired       | Publish(Locked)            | Locked   |
//! | Locked   | Activity           | none                       | Locked   |
//! | Locked   | UnlockRequested    | StartChallenge (once)      | Locked   |
//! | Locked   | AuthResolved(ok)   | ResetTimer, Publish        | Unlocked |
//! | Locked   | AuthResolved(cxl)  | none                       | Locked   |
//! | Locked   | AuthResolved(fail) | fallback policy            | either   |

use tracing::{debug, info, warn};

use crate::auth::{AuthOutcome, AuthResult};
use crate::config::FallbackPolicy;
use crate::state::LockState;

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    /// Any interaction on the activity surface
    Activity,
    /// The live idle timer expired
    TimeoutFired,
    /// The overlay's unlock affordance was used
    UnlockRequested,
    /// An unlock attempt finished
    AuthResolved {
        /// Generation of the attempt this result belongs to
        attempt: u64,
        /// What the gateway reported
        outcome: AuthOutcome,
    },
}

/// Side effect requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Cancel any live idle timer and schedule a fresh one
    ResetTimer,
    /// Cancel the live idle timer
    CancelTimer,
    /// Run the authentication gateway for this attempt
    StartChallenge {
        /// Generation the result must carry back
        attempt: u64,
    },
    /// Broadcast a new state to consumers
    Publish(LockState),
}

/// Lock state machine for one mounted provider
#[derive(Debug)]
pub struct LockMachine {
    state: LockState,
    fallback: FallbackPolicy,
    /// Whether a timer deadline is outstanding
    timer_armed: bool,
    /// Attempt currently awaiting a result
    pending: Option<u64>,
    next_attempt: u64,
    torn_down: bool,
}

impl LockMachine {
    /// Create a machine in the unlocked state
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            state: LockState::Unlocked,
            fallback,
            timer_armed: false,
            pending: None,
            next_attempt: 1,
            torn_down: false,
        }
    }

    /// Effects to run when the provider mounts
    pub fn start(&mut self) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        self.enter_unlocked()
    }

    /// Apply one event
    pub fn handle(&mut self, event: LockEvent) -> Vec<Effect> {
        if self.torn_down {
            debug!(?event, "Lock torn down; ignoring event");
            return Vec::new();
        }

        match (self.state, event) {
            (LockState::Unlocked, LockEvent::Activity) => {
                self.timer_armed = true;
                vec![Effect::ResetTimer]
            }
            (LockState::Locked, LockEvent::Activity) => Vec::new(),

            (LockState::Unlocked, LockEvent::TimeoutFired) => {
                if !self.timer_armed {
                    debug!("Timeout without a live timer; ignoring");
                    return Vec::new();
                }
                self.timer_armed = false;
                self.state = LockState::Locked;
                info!("Idle timeout reached; screen locked");
                vec![Effect::Publish(LockState::Locked)]
            }
            (LockState::Locked, LockEvent::TimeoutFired) => Vec::new(),

            (LockState::Locked, LockEvent::UnlockRequested) => {
                if let Some(attempt) = self.pending {
                    debug!(attempt, "Unlock already in progress; ignoring request");
                    return Vec::new();
                }
                let attempt = self.next_attempt;
                self.next_attempt += 1;
                self.pending = Some(attempt);
                debug!(attempt, "Starting unlock attempt");
                vec![Effect::StartChallenge { attempt }]
            }
            (LockState::Unlocked, LockEvent::UnlockRequested) => Vec::new(),

            (_, LockEvent::AuthResolved { attempt, outcome }) => {
                if self.pending != Some(attempt) {
                    warn!(attempt, "Discarding result of a stale unlock attempt");
                    return Vec::new();
                }
                self.pending = None;
                self.resolve(outcome)
            }
        }
    }

    /// Stop the machine; it ignores every later event
    pub fn teardown(&mut self) -> Vec<Effect> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        self.pending = None;
        self.timer_armed = false;
        vec![Effect::CancelTimer]
    }

    /// Current state
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Whether an unlock attempt is awaiting its result
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the machine expects a timer deadline to be outstanding
    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// Whether [`LockMachine::teardown`] has run
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn resolve(&mut self, outcome: AuthOutcome) -> Vec<Effect> {
        match outcome {
            AuthOutcome::Challenge(AuthResult::Success) => {
                info!("Authentication succeeded; screen unlocked");
                self.enter_unlocked()
            }
            AuthOutcome::Challenge(AuthResult::Cancelled) => {
                debug!("Authentication cancelled; staying locked");
                Vec::new()
            }
            AuthOutcome::Challenge(AuthResult::Failed(reason)) => self.fall_back(&reason),
            AuthOutcome::NoChallenge => self.fall_back("no authentication sensor"),
        }
    }

    fn fall_back(&mut self, reason: &str) -> Vec<Effect> {
        match self.fallback {
            FallbackPolicy::Unlock => {
                warn!(reason, "Unlock could not be challenged; unlocking by fallback");
                self.enter_unlocked()
            }
            FallbackPolicy::StayLocked => {
                warn!(reason, "Unlock could not be challenged; staying locked");
                Vec::new()
            }
        }
    }

    fn enter_unlocked(&mut self) -> Vec<Effect> {
        self.state = LockState::Unlocked;
        self.timer_armed = true;
        vec![Effect::ResetTimer, Effect::Publish(LockState::Unlocked)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn locked(fallback: FallbackPolicy) -> LockMachine {
        let mut machine = LockMachine::new(fallback);
        machine.start();
        machine.handle(LockEvent::TimeoutFired);
        assert_eq!(machine.state(), LockState::Locked);
        machine
    }

    fn resolved(attempt: u64, result: AuthResult) -> LockEvent {
        LockEvent::AuthResolved {
            attempt,
            outcome: AuthOutcome::Challenge(result),
        }
    }

    #[test]
    fn test_start_arms_timer_and_publishes() {
        let mut machine = LockMachine::new(FallbackPolicy::Unlock);
        assert_eq!(
            machine.start(),
            vec![Effect::ResetTimer, Effect::Publish(LockState::Unlocked)]
        );
        assert!(machine.timer_armed());
    }

    #[test]
    fn test_activity_resets_timer_while_unlocked() {
        let mut machine = LockMachine::new(FallbackPolicy::Unlock);
        machine.start();
        assert_eq!(machine.handle(LockEvent::Activity), vec![Effect::ResetTimer]);
        assert_eq!(machine.state(), LockState::Unlocked);
    }

    #[test]
    fn test_timeout_locks() {
        let mut machine = LockMachine::new(FallbackPolicy::Unlock);
        machine.start();
        assert_eq!(
            machine.handle(LockEvent::TimeoutFired),
            vec![Effect::Publish(LockState::Locked)]
        );
        assert!(!machine.timer_armed());
    }

    #[test]
    fn test_activity_ignored_while_locked() {
        let mut machine = locked(FallbackPolicy::Unlock);
        assert!(machine.handle(LockEvent::Activity).is_empty());
        assert!(!machine.timer_armed());
        assert_eq!(machine.state(), LockState::Locked);
    }

    #[test]
    fn test_success_unlocks_with_single_timer_reset() {
        let mut machine = locked(FallbackPolicy::Unlock);
        assert_eq!(
            machine.handle(LockEvent::UnlockRequested),
            vec![Effect::StartChallenge { attempt: 1 }]
        );

        let effects = machine.handle(resolved(1, AuthResult::Success));
        assert_eq!(
            effects,
            vec![Effect::ResetTimer, Effect::Publish(LockState::Unlocked)]
        );
        assert_eq!(machine.state(), LockState::Unlocked);
        assert!(!machine.is_pending());
    }

    #[test]
    fn test_duplicate_unlock_request_ignored() {
        let mut machine = locked(FallbackPolicy::Unlock);
        machine.handle(LockEvent::UnlockRequested);
        assert!(machine.handle(LockEvent::UnlockRequested).is_empty());
        assert!(machine.is_pending());
    }

    #[test]
    fn test_cancel_stays_locked_and_allows_retry() {
        let mut machine = locked(FallbackPolicy::Unlock);
        machine.handle(LockEvent::UnlockRequested);
        assert!(machine.handle(resolved(1, AuthResult::Cancelled)).is_empty());
        assert_eq!(machine.state(), LockState::Locked);

        assert_eq!(
            machine.handle(LockEvent::UnlockRequested),
            vec![Effect::StartChallenge { attempt: 2 }]
        );
    }

    #[test]
    fn test_failure_falls_back_to_unlock() {
        let mut machine = locked(FallbackPolicy::Unlock);
        machine.handle(LockEvent::UnlockRequested);
        let effects = machine.handle(resolved(1, AuthResult::Failed("lockout".into())));
        assert_eq!(
            effects,
            vec![Effect::ResetTimer, Effect::Publish(LockState::Unlocked)]
        );
    }

    #[test]
    fn test_no_challenge_falls_back_to_unlock() {
        let mut machine = locked(FallbackPolicy::Unlock);
        machine.handle(LockEvent::UnlockRequested);
        machine.handle(LockEvent::AuthResolved {
            attempt: 1,
            outcome: AuthOutcome::NoChallenge,
        });
        assert_eq!(machine.state(), LockState::Unlocked);
    }

    #[test]
    fn test_stay_locked_policy() {
        let mut machine = locked(FallbackPolicy::StayLocked);
        machine.handle(LockEvent::UnlockRequested);
        assert!(machine
            .handle(LockEvent::AuthResolved {
                attempt: 1,
                outcome: AuthOutcome::NoChallenge,
            })
            .is_empty());
        assert_eq!(machine.state(), LockState::Locked);
        assert!(!machine.is_pending());
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut machine = locked(FallbackPolicy::Unlock);
        machine.handle(LockEvent::UnlockRequested);
        assert!(machine.handle(resolved(7, AuthResult::Success)).is_empty());
        assert_eq!(machine.state(), LockState::Locked);
        assert!(machine.is_pending());
    }

    #[test]
    fn test_teardown_is_terminal() {
        let mut machine = LockMachine::new(FallbackPolicy::Unlock);
        machine.start();
        assert_eq!(machine.teardown(), vec![Effect::CancelTimer]);
        assert!(machine.teardown().is_empty());
        assert!(machine.handle(LockEvent::TimeoutFired).is_empty());
        assert!(machine.handle(LockEvent::Activity).is_empty());
        assert_eq!(machine.state(), LockState::Unlocked);
    }

    #[test]
    fn test_teardown_discards_pending_attempt() {
        let mut machine = locked(FallbackPolicy::Unlock);
        machine.handle(LockEvent::UnlockRequested);
        machine.teardown();
        assert!(machine.handle(resolved(1, AuthResult::Success)).is_empty());
        assert_eq!(machine.state(), LockState::Locked);
    }

    fn arb_event() -> impl Strategy<Value = LockEvent> {
        let result = prop_oneof![
            Just(AuthOutcome::NoChallenge),
            Just(AuthOutcome::Challenge(AuthResult::Success)),
            Just(AuthOutcome::Challenge(AuthResult::Cancelled)),
            Just(AuthOutcome::Challenge(AuthResult::Failed("error".into()))),
        ];
        prop_oneof![
            Just(LockEvent::Activity),
            Just(LockEvent::TimeoutFired),
            Just(LockEvent::UnlockRequested),
            (0u64..4, result).prop_map(|(attempt, outcome)| LockEvent::AuthResolved {
                attempt,
                outcome
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_locked_is_inert_to_activity(events in prop::collection::vec(arb_event(), 0..64)) {
            let mut machine = LockMachine::new(FallbackPolicy::Unlock);
            machine.start();
            for event in events {
                let was_locked = machine.state().is_locked();
                let is_activity = event == LockEvent::Activity;
                let effects = machine.handle(event);
                if was_locked && is_activity {
                    prop_assert!(effects.is_empty());
                    prop_assert!(machine.state().is_locked());
                }
            }
        }

        #[test]
        fn prop_at_most_one_attempt_in_flight(events in prop::collection::vec(arb_event(), 0..64)) {
            let mut machine = LockMachine::new(FallbackPolicy::StayLocked);
            machine.start();
            let mut in_flight = 0usize;
            for event in events {
                let resolving = matches!(event, LockEvent::AuthResolved { .. });
                let was_pending = machine.is_pending();
                let effects = machine.handle(event);
                if resolving && was_pending && !machine.is_pending() {
                    in_flight -= 1;
                }
                in_flight += effects
                    .iter()
                    .filter(|e| matches!(e, Effect::StartChallenge { .. }))
                    .count();
                prop_assert!(in_flight <= 1);
                prop_assert_eq!(in_flight == 1, machine.is_pending());
            }
        }

        #[test]
        fn prop_unlocked_implies_armed_timer(events in prop::collection::vec(arb_event(), 0..64)) {
            let mut machine = LockMachine::new(FallbackPolicy::Unlock);
            machine.start();
            for event in events {
                machine.handle(event);
                prop_assert_eq!(machine.state() == LockState::Unlocked, machine.timer_armed());
            }
        }
    }
}
