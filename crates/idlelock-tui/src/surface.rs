//! Activity surface
//!
//! Every interaction in the terminal, whether it lands on the child view or
//! on the lock overlay, is forwarded to the controller as one undifferentiated
//! activity signal. No filtering or debouncing happens here; the controller
//! decides whether the signal matters.

use crossterm::event::{Event, KeyEventKind, MouseEventKind};
use idlelock_core::LockHandle;
use tracing::debug;

/// Phase of an interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Key press or mouse button down
    Start,
    /// Key repeat, drag, pointer motion or scroll
    Move,
    /// Key or mouse button release
    End,
}

/// Classify a terminal event; `None` for events that are not user interaction
pub fn classify(event: &Event) -> Option<Interaction> {
    match event {
        Event::Key(key) => Some(match key.kind {
            KeyEventKind::Press => Interaction::Start,
            KeyEventKind::Repeat => Interaction::Move,
            KeyEventKind::Release => Interaction::End,
        }),
        Event::Mouse(mouse) => Some(match mouse.kind {
            MouseEventKind::Down(_) => Interaction::Start,
            MouseEventKind::Up(_) => Interaction::End,
            _ => Interaction::Move,
        }),
        _ => None,
    }
}

/// Forwards terminal interaction to the lock controller
#[derive(Debug, Clone)]
pub struct ActivitySurface {
    handle: LockHandle,
}

impl ActivitySurface {
    /// Wrap a lock handle
    pub fn new(handle: LockHandle) -> Self {
        Self { handle }
    }

    /// Forward `event` as activity if it is an interaction
    pub fn forward(&self, event: &Event) -> Option<Interaction> {
        let interaction = classify(event)?;
        if self.handle.activity().is_err() {
            debug!(?interaction, "Lock unmounted; activity dropped");
        }
        Some(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{
        KeyCode, KeyEvent, KeyEventState, KeyModifiers, MouseButton, MouseEvent,
    };
    use rstest::rstest;

    fn key(kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[rstest]
    #[case(key(KeyEventKind::Press), Some(Interaction::Start))]
    #[case(key(KeyEventKind::Repeat), Some(Interaction::Move))]
    #[case(key(KeyEventKind::Release), Some(Interaction::End))]
    #[case(mouse(MouseEventKind::Down(MouseButton::Left)), Some(Interaction::Start))]
    #[case(mouse(MouseEventKind::Drag(MouseButton::Left)), Some(Interaction::Move))]
    #[case(mouse(MouseEventKind::Moved), Some(Interaction::Move))]
    #[case(mouse(MouseEventKind::ScrollDown), Some(Interaction::Move))]
    #[case(mouse(MouseEventKind::Up(MouseButton::Right)), Some(Interaction::End))]
    #[case(Event::Resize(80, 24), None)]
    #[case(Event::FocusGained, None)]
    #[case(Event::Paste("hello".to_string()), None)]
    fn test_classify(#[case] event: Event, #[case] expected: Option<Interaction>) {
        assert_eq!(classify(&event), expected);
    }
}
