#![no_main]

use arbitrary::Arbitrary;
use idlelock_core::{
    AuthOutcome, AuthResult, Effect, FallbackPolicy, LockEvent, LockMachine, LockState,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Activity,
    TimeoutFired,
    UnlockRequested,
    NoChallenge { attempt: u8 },
    Success { attempt: u8 },
    Cancelled { attempt: u8 },
    Failed { attempt: u8 },
    Teardown,
}

#[derive(Debug, Arbitrary)]
struct Session {
    stay_locked: bool,
    inputs: Vec<Input>,
}

fuzz_target!(|session: Session| {
    let fallback = if session.stay_locked {
        FallbackPolicy::StayLocked
    } else {
        FallbackPolicy::Unlock
    };
    let mut machine = LockMachine::new(fallback);
    let mut published = LockState::Unlocked;
    let mut last_attempt = 0;

    for effect in machine.start() {
        if let Effect::Publish(state) = effect {
            published = state;
        }
    }

    for input in session.inputs {
        let resolved = |attempt: u8, outcome| LockEvent::AuthResolved {
            attempt: u64::from(attempt),
            outcome,
        };
        let was_locked = machine.state().is_locked();
        let effects = match input {
            Input::Activity => machine.handle(LockEvent::Activity),
            Input::TimeoutFired => machine.handle(LockEvent::TimeoutFired),
            Input::UnlockRequested => machine.handle(LockEvent::UnlockRequested),
            Input::NoChallenge { attempt } => {
                machine.handle(resolved(attempt, AuthOutcome::NoChallenge))
            }
            Input::Success { attempt } => machine.handle(resolved(
                attempt,
                AuthOutcome::Challenge(AuthResult::Success),
            )),
            Input::Cancelled { attempt } => machine.handle(resolved(
                attempt,
                AuthOutcome::Challenge(AuthResult::Cancelled),
            )),
            Input::Failed { attempt } => machine.handle(resolved(
                attempt,
                AuthOutcome::Challenge(AuthResult::Failed("sensor error".into())),
            )),
            Input::Teardown => machine.teardown(),
        };

        let mut challenges = 0;
        for effect in &effects {
            match effect {
                Effect::Publish(state) => published = *state,
                Effect::StartChallenge { attempt } => {
                    assert!(*attempt > last_attempt);
                    last_attempt = *attempt;
                    challenges += 1;
                }
                Effect::ResetTimer | Effect::CancelTimer => {}
            }
        }

        // Observers always see the machine's state
        assert_eq!(published, machine.state());
        assert!(challenges <= 1);

        if machine.is_torn_down() {
            assert!(!machine.timer_armed());
            assert!(!machine.is_pending());
        } else {
            // The idle timer runs exactly while unlocked
            assert_eq!(machine.timer_armed(), !machine.state().is_locked());
        }

        // Only an unlock attempt may leave the locked state
        if was_locked && !machine.state().is_locked() {
            assert!(matches!(
                effects.as_slice(),
                [Effect::ResetTimer, Effect::Publish(LockState::Unlocked)]
            ));
        }
    }
});
