//! Authentication gateway contract
//!
//! The gateway is the only collaborator the lock consults to leave the
//! locked state. It is stateless per call; the controller guarantees that
//! at most one [`AuthenticationGateway::challenge`] is in flight.

use async_trait::async_trait;

/// Outcome of a single authentication prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    /// The user proved their identity
    Success,
    /// The user dismissed the prompt
    Cancelled,
    /// Anything else: lockout, missing enrolment, sensor error
    Failed(String),
}

/// What an unlock attempt produced, as seen by the lock state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No usable sensor or credential; no prompt was shown
    NoChallenge,
    /// A prompt was shown and resolved
    Challenge(AuthResult),
}

/// Device-provided authentication
#[async_trait]
pub trait AuthenticationGateway: Send + Sync {
    /// Whether a usable sensor or enrolled credential exists
    async fn has_challenge(&self) -> bool;

    /// Present one prompt and resolve to exactly one result
    async fn challenge(&self, prompt: &str) -> AuthResult;
}

/// Gateway for devices without any authentication sensor
///
/// Every unlock attempt takes the fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensorGateway;

#[async_trait]
impl AuthenticationGateway for NoSensorGateway {
    async fn has_challenge(&self) -> bool {
        false
    }

    async fn challenge(&self, _prompt: &str) -> AuthResult {
        AuthResult::Failed("no authentication sensor".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_sensor_gateway() {
        let gateway = NoSensorGateway;
        assert!(!gateway.has_challenge().await);
        assert!(matches!(
            gateway.challenge("unlock").await,
            AuthResult::Failed(_)
        ));
    }
}
