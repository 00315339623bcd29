//! Application state

use std::time::Instant;

use tokio::sync::oneshot;
use zeroize::Zeroizing;

use crate::auth::{PromptReply, PromptRequest, MAX_PIN_LENGTH};

/// PIN prompt currently shown on the overlay
pub struct PinPrompt {
    /// Prompt text
    pub message: String,
    /// Feedback from the previous try
    pub error: Option<String>,
    /// Digits typed so far
    pub input: Zeroizing<String>,
    /// Where the answer goes
    reply: Option<oneshot::Sender<PromptReply>>,
}

impl PinPrompt {
    /// Build a prompt from a gateway request
    pub fn from_request(request: PromptRequest) -> Self {
        Self {
            message: request.prompt,
            error: request.error,
            input: Zeroizing::new(String::new()),
            reply: Some(request.reply),
        }
    }

    /// Append a digit; anything else is ignored
    pub fn push(&mut self, c: char) {
        if c.is_ascii_digit() && self.input.len() < MAX_PIN_LENGTH {
            self.input.push(c);
        }
    }

    /// Remove the last digit
    pub fn pop(&mut self) {
        self.input.pop();
    }

    /// Send the typed PIN to the gateway
    pub fn submit(mut self) {
        let pin = std::mem::replace(&mut self.input, Zeroizing::new(String::new()));
        self.answer(PromptReply::Pin(pin));
    }

    /// Tell the gateway the user dismissed the prompt
    pub fn cancel(mut self) {
        self.answer(PromptReply::Cancelled);
    }

    fn answer(&mut self, reply: PromptReply) {
        if let Some(tx) = self.reply.take() {
            if tx.send(reply).is_err() {
                tracing::debug!("Unlock attempt no longer waiting for the PIN");
            }
        }
    }
}

/// Application state
pub struct AppState {
    /// Active PIN prompt, if the gateway asked for one
    pub pin_prompt: Option<PinPrompt>,

    /// Last forwarded interaction
    pub last_activity: Instant,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Create new application state
    pub fn new() -> Self {
        Self {
            pin_prompt: None,
            last_activity: Instant::now(),
        }
    }
}
