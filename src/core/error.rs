//! Error taxonomy for timer operations.
//!
//! Lifecycle operations propagate these to the caller; the scheduler logs
//! per-timer failures and moves on so one bad timer cannot stall a cycle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerError {
    /// The id does not resolve to a live record. Surfaced, never retried.
    #[error("no timer with id {0} exists")]
    NotFound(String),

    /// Bad caller input (unparseable date, empty edit). Surfaced, never retried.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Owner or channel could not be reached at delivery time. The timer stays
    /// undelivered and is retried on the next scheduler cycle.
    #[error("destination unresolved: {0}")]
    DestinationUnresolved(String),

    /// Persistence layer failure.
    #[error("store error: {0}")]
    Store(String),

    /// Delivery transport failure (message send rejected by the platform).
    #[error("transport error: {0}")]
    Transport(String),
}

impl TimerError {
    /// Wrap an arbitrary persistence error.
    pub fn store<E: std::fmt::Display>(err: E) -> Self {
        TimerError::Store(err.to_string())
    }

    /// Wrap an arbitrary transport error.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        TimerError::Transport(err.to_string())
    }
}
