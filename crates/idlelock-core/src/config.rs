//! Lock configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LockError, Result};

/// Default idle timeout (3 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Default text shown by the authentication prompt
pub const DEFAULT_PROMPT: &str = "Unlock the screen";

/// What to do when an unlock attempt cannot be meaningfully challenged
///
/// Applies when the gateway reports no sensor, and when a challenge fails for
/// any reason other than the user cancelling it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Unlock immediately
    #[default]
    Unlock,
    /// Stay locked; the user has to request unlock again
    StayLocked,
}

/// Configuration for one mounted lock provider
///
/// Immutable once the provider is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    /// Idle period after which the lock engages
    pub timeout: Duration,
    /// Policy for sensor-less and failed attempts
    pub fallback: FallbackPolicy,
    /// Text handed to the gateway's prompt
    pub prompt: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            fallback: FallbackPolicy::default(),
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl LockConfig {
    /// Set the idle timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the idle timeout in milliseconds
    pub fn with_timeout_ms(self, millis: u64) -> Self {
        self.with_timeout(Duration::from_millis(millis))
    }

    /// Set the fallback policy
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set the prompt text
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Reject configurations the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(LockError::InvalidTimeout);
        }
        Ok(())
    }
}
