//! Error types for the sync service.

use thiserror::Error;

use tillsync_core::CoreError;
use tillsync_protocol::{ErrorBody, ProtocolError};
use tillsync_queue::QueueError;

/// Errors that can occur during service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The server call failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Model error.
    #[error("model error: {0}")]
    Core(#[from] CoreError),

    /// The delivery queue could not drain.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    /// The device is not bound to a register.
    #[error("device register is not initialized")]
    RegisterNotInitialized,
}

impl ServiceError {
    /// The user-visible form of this error.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            ServiceError::Protocol(e) => e.to_body(),
            ServiceError::Core(e) => ErrorBody {
                code: "INVALID_INPUT".into(),
                message: e.to_string(),
            },
            ServiceError::Queue(e) => ErrorBody {
                code: match e {
                    QueueError::Stopped => "QUEUE_STOPPED",
                    QueueError::NoRuntime => "NO_RUNTIME",
                }
                .into(),
                message: e.to_string(),
            },
            ServiceError::RegisterNotInitialized => ErrorBody {
                code: "REGISTER_NOT_INITIALIZED".into(),
                message: self.to_string(),
            },
        }
    }
}

impl From<ServiceError> for ErrorBody {
    fn from(e: ServiceError) -> Self {
        e.to_body()
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
