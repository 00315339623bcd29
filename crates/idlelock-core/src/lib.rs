//! idlelock core - idle-timeout screen lock
//!
//! This crate provides:
//! - A pure lock state machine ([`LockMachine`]) driven by activity, timeout and
//!   authentication events
//! - A tokio idle timer holding at most one live deadline ([`IdleTimer`])
//! - The authentication gateway contract ([`AuthenticationGateway`])
//! - An async controller that owns the lock state ([`LockProvider`]) and a
//!   read-only broadcast of that state to any number of consumers ([`LockContext`])

pub mod auth;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod machine;
pub mod state;
pub mod timer;

pub use auth::{AuthOutcome, AuthResult, AuthenticationGateway, NoSensorGateway};
pub use config::{FallbackPolicy, LockConfig, DEFAULT_PROMPT, DEFAULT_TIMEOUT};
pub use context::{LockContext, Subscription};
pub use controller::{LockHandle, LockProvider};
pub use error::{LockError, Result};
pub use machine::{Effect, LockEvent, LockMachine};
pub use state::LockState;
pub use timer::IdleTimer;
