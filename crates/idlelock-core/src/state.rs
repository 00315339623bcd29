//! Lock state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether the application surface is covered by the lock overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    /// Normal operation; the idle timer is running
    #[default]
    Unlocked,
    /// Overlay shown; only an unlock attempt can leave this state
    Locked,
}

impl LockState {
    /// True when the overlay should be shown
    pub fn is_locked(self) -> bool {
        matches!(self, LockState::Locked)
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Unlocked => write!(f, "unlocked"),
            LockState::Locked => write!(f, "locked"),
        }
    }
}
