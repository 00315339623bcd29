//! PIN-backed authentication for the lock overlay

mod gateway;
mod pin;

pub use gateway::{PinGateway, PromptReply, PromptRequest};
pub use pin::{validate, PinError, PinStore, MAX_PIN_LENGTH, MIN_PIN_LENGTH};
