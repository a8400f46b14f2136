//! Error types for request execution.
//!
//! HTTP failure statuses are not errors: they come back as a [`Response`]
//! with `success() == false`. Everything here means no usable response was
//! produced.
//!
//! [`Response`]: crate::response::Response

use std::time::Duration;
use thiserror::Error;

/// Terminal failure of an `execute` call or of one batch entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    /// Malformed url or method. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration rejected before any I/O happened.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The transport never reached the server, after all retries.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The overall time budget ran out before any HTTP response arrived.
    #[error("Timed out after {}s", .timeout.as_secs())]
    TimeoutExceeded { timeout: Duration },

    /// The caller cancelled the execution.
    #[error("Cancelled")]
    Cancelled,

    /// A batch worker task died before reporting a result.
    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

/// Failure reported by a [`Transport`](crate::transport::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connect, send, or body read failed.
    #[error("{0}")]
    Connection(String),

    /// The per-attempt timeout handed to the transport elapsed.
    #[error("transport timed out")]
    TimedOut,
}
