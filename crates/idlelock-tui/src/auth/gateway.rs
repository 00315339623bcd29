//! Authentication gateway backed by an enrolled PIN
//!
//! The gateway does not draw anything. Each prompt is sent to the UI as a
//! [`PromptRequest`]; the overlay collects the PIN and answers through the
//! request's reply channel. A wrong PIN prompts again within the same
//! challenge, the way a system biometric sheet lets the user retry.

use std::sync::Arc;

use async_trait::async_trait;
use idlelock_core::{AuthResult, AuthenticationGateway};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::PinStore;

/// Ask the UI for a PIN
#[derive(Debug)]
pub struct PromptRequest {
    /// Prompt text from the lock configuration
    pub prompt: String,
    /// Feedback from the previous try, if it failed
    pub error: Option<String>,
    /// Where the UI sends the user's answer
    pub reply: oneshot::Sender<PromptReply>,
}

/// The user's answer to a [`PromptRequest`]
#[derive(Debug)]
pub enum PromptReply {
    /// Entered PIN
    Pin(Zeroizing<String>),
    /// The user dismissed the prompt
    Cancelled,
}

/// [`AuthenticationGateway`] that challenges for the enrolled PIN
pub struct PinGateway {
    store: Arc<PinStore>,
    prompts: mpsc::UnboundedSender<PromptRequest>,
    max_attempts: u32,
}

impl PinGateway {
    /// Create a gateway and the receiver the UI reads prompts from
    pub fn new(store: PinStore, max_attempts: u32) -> (Self, mpsc::UnboundedReceiver<PromptRequest>) {
        let (prompts, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            store: Arc::new(store),
            prompts,
            max_attempts: max_attempts.max(1),
        };
        (gateway, rx)
    }

    async fn ask(&self, prompt: &str, error: Option<String>) -> Option<PromptReply> {
        let (reply, answer) = oneshot::channel();
        let request = PromptRequest {
            prompt: prompt.to_string(),
            error,
            reply,
        };
        self.prompts.send(request).ok()?;
        answer.await.ok()
    }
}

#[async_trait]
impl AuthenticationGateway for PinGateway {
    async fn has_challenge(&self) -> bool {
        self.store.is_enrolled()
    }

    async fn challenge(&self, prompt: &str) -> AuthResult {
        let mut error = None;

        for attempt in 1..=self.max_attempts {
            let pin = match self.ask(prompt, error.take()).await {
                Some(PromptReply::Pin(pin)) => pin,
                Some(PromptReply::Cancelled) => return AuthResult::Cancelled,
                None => return AuthResult::Failed("prompt unavailable".to_string()),
            };

            // Argon2 verification blocks for a noticeable time
            let store = Arc::clone(&self.store);
            let verified = tokio::task::spawn_blocking(move || store.verify(&pin)).await;

            match verified {
                Ok(Ok(true)) => {
                    debug!(attempt, "PIN accepted");
                    return AuthResult::Success;
                }
                Ok(Ok(false)) => {
                    let remaining = self.max_attempts - attempt;
                    warn!(attempt, remaining, "Incorrect PIN");
                    error = Some(format!("Incorrect PIN ({remaining} attempts left)"));
                }
                Ok(Err(e)) => return AuthResult::Failed(e.to_string()),
                Err(e) => return AuthResult::Failed(e.to_string()),
            }
        }

        AuthResult::Failed("too many attempts".to_string())
    }
}
