//! Error types for session-registry.

use thiserror::Error;

/// Main error type for session-registry operations.
///
/// Looking up an unknown or evicted session is never an error; those paths
/// return `None` or a "Session not found" status instead.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The session has already been invalidated and its attributes are gone.
    #[error("session invalidated: {0}")]
    SessionInvalidated(String),

    /// Releasing the resource behind a session failed.
    #[error("failed to invalidate session {id}: {reason}")]
    Invalidation { id: String, reason: String },

    /// A session identifier could not be parsed.
    #[error("invalid session id: {0:?}")]
    InvalidSessionId(String),

    /// Eviction schedule is not usable.
    #[error("invalid eviction schedule: {0}")]
    InvalidSchedule(String),

    /// No async runtime available to run background tasks.
    #[error("runtime unavailable: {0}")]
    Runtime(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for session-registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
