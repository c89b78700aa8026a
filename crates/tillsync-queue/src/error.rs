//! Error types for the delivery queue.

use thiserror::Error;

/// Failure reported by a [`Sink`](crate::Sink).
///
/// The queue treats every variant the same way: the batch is kept and
/// retried after the policy delay. The distinction is for logs.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    /// The destination could not be reached.
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The destination was reached but refused the batch.
    #[error("batch rejected: {0}")]
    Rejected(String),
}

/// Errors observed by queue callers.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The drain task went away before the queue emptied, which only
    /// happens when the runtime shuts down.
    #[error("delivery queue stopped before draining")]
    Stopped,

    /// Written outside a tokio runtime. The payload stays queued.
    #[error("no tokio runtime to drain the queue on")]
    NoRuntime,
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
