//! Error types for the protocol client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request did not complete.
    #[error("network failure: {0}")]
    Network(String),

    /// The body could not be decoded as JSON.
    #[error("undecodable body: {0}")]
    Decode(String),
}

/// Errors that can occur when talking to the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The server answered with a non-2xx status.
    #[error("server error (HTTP {status})")]
    Server { status: u16 },

    /// The request did not complete.
    #[error("network error: {0}")]
    Network(String),

    /// The body was undecodable or not shaped like a response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A well-formed response with status "error".
    #[error("{code}: {message}")]
    Response { code: String, message: String },

    /// The request needs a token and none is held. Raised before any
    /// network call.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ProtocolError {
    /// Stable error code shown to users.
    pub fn code(&self) -> &str {
        match self {
            ProtocolError::Server { .. } => "SERVER_ERROR",
            ProtocolError::Network(_) => "NETWORK_ERROR",
            ProtocolError::InvalidResponse(_) => "INVALID_RESPONSE",
            ProtocolError::Response { code, .. } => code,
            ProtocolError::NotAuthenticated => "NOT_AUTHENTICATED",
        }
    }

    /// The user-visible form of this error.
    pub fn to_body(&self) -> ErrorBody {
        let message = match self {
            ProtocolError::Response { message, .. } => message.clone(),
            other => other.to_string(),
        };
        ErrorBody {
            code: self.code().to_string(),
            message,
        }
    }
}

impl From<TransportError> for ProtocolError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Status(status) => ProtocolError::Server { status },
            TransportError::Network(msg) => ProtocolError::Network(msg),
            TransportError::Decode(msg) => ProtocolError::InvalidResponse(msg),
        }
    }
}

/// Typed error object handed to callers of query operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl From<ProtocolError> for ErrorBody {
    fn from(e: ProtocolError) -> Self {
        e.to_body()
    }
}

/// Failure reported by a [`SaveHook`](crate::SaveHook).
#[derive(Debug, Clone, Error)]
#[error("saving client state failed: {0}")]
pub struct SaveError(pub String);

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_map_to_distinct_kinds() {
        assert_eq!(
            ProtocolError::from(TransportError::Status(503)),
            ProtocolError::Server { status: 503 }
        );
        assert!(matches!(
            ProtocolError::from(TransportError::Network("reset".into())),
            ProtocolError::Network(_)
        ));
        assert!(matches!(
            ProtocolError::from(TransportError::Decode("eof".into())),
            ProtocolError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_error_body() {
        let body = ErrorBody::from(ProtocolError::Response {
            code: "OUT_OF_STOCK".into(),
            message: "no more bread".into(),
        });
        assert_eq!(body.code, "OUT_OF_STOCK");
        assert_eq!(body.message, "no more bread");

        let body = ProtocolError::NotAuthenticated.to_body();
        assert_eq!(body.code, "NOT_AUTHENTICATED");
        assert_eq!(body.message, "not authenticated");

        let body = ProtocolError::Server { status: 500 }.to_body();
        assert_eq!(body.code, "SERVER_ERROR");
    }
}
