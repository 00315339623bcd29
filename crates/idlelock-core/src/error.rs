//! Error types for the lock core

use thiserror::Error;

/// Result type alias for lock operations
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors that can occur while configuring or talking to a lock provider
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    /// Idle timeout of zero would lock immediately after every interaction
    #[error("Idle timeout must be greater than zero")]
    InvalidTimeout,

    /// The provider was unmounted; no further events are accepted
    #[error("Lock provider has been unmounted")]
    Unmounted,
}
