//! Transport abstraction for the protocol client.
//!
//! A transport performs a POST-style request and returns the decoded JSON
//! body. Implementations may use HTTP, a local IPC bridge, or anything else
//! that can carry JSON.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Transport trait for posting a request body to a path.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `path` and return the decoded response body.
    ///
    /// Non-2xx statuses, network failures and undecodable bodies must be
    /// reported as the matching [`TransportError`] variant.
    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        (**self).post(path, body).await
    }
}

/// A scripted in-memory transport for testing.
///
/// Answers are queued up front and handed out in order; every request is
/// recorded for later inspection.
pub mod memory {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// A request seen by [`ScriptedTransport`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub path: String,
        pub body: Option<Value>,
    }

    #[derive(Default)]
    struct Script {
        answers: VecDeque<Result<Value>>,
        requests: Vec<RecordedRequest>,
    }

    /// Transport that replays queued answers.
    ///
    /// Clones share the same script. When the script runs out, requests fail
    /// with a network error.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedTransport {
        /// Create a transport with an empty script.
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Script> {
            self.script.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Queue a response body.
        pub fn respond(&self, body: Value) -> &Self {
            self.lock().answers.push_back(Ok(body));
            self
        }

        /// Queue a transport failure.
        pub fn fail(&self, error: TransportError) -> &Self {
            self.lock().answers.push_back(Err(error));
            self
        }

        /// Requests seen so far, oldest first.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.lock().requests.clone()
        }

        /// Number of requests seen so far.
        pub fn request_count(&self) -> usize {
            self.lock().requests.len()
        }

        /// Number of queued answers not yet used.
        pub fn remaining(&self) -> usize {
            self.lock().answers.len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
            let mut script = self.lock();
            script.requests.push(RecordedRequest {
                path: path.to_string(),
                body,
            });
            script
                .answers
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        }
    }
}
