//! The write path: uploading change events through the protocol client.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use tillsync_protocol::{ProtocolError, SyncClient, Transport};
use tillsync_queue::{Sink, SinkError};

use crate::events::ChangeEvent;

/// Delivery-queue sink that posts batches of change events to the changes
/// endpoint with authentication.
pub struct ChangeUploader<T> {
    client: Arc<SyncClient<T>>,
}

impl<T> ChangeUploader<T> {
    pub fn new(client: Arc<SyncClient<T>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: Transport + 'static> Sink<ChangeEvent> for ChangeUploader<T> {
    async fn deliver(&self, batch: &[ChangeEvent]) -> Result<(), SinkError> {
        let events = serde_json::to_value(batch).map_err(|e| SinkError::Rejected(e.to_string()))?;
        let path = self.client.config().endpoints.changes.as_str();

        debug!(events = batch.len(), "uploading change events");
        self.client
            .request(path, Some(events), true)
            .await
            .map(|_: Value| ())
            .map_err(sink_error)
    }
}

fn sink_error(e: ProtocolError) -> SinkError {
    match e {
        ProtocolError::Response { .. } | ProtocolError::InvalidResponse(_) => {
            SinkError::Rejected(e.to_string())
        }
        ProtocolError::Server { .. } | ProtocolError::Network(_) | ProtocolError::NotAuthenticated => {
            SinkError::Unavailable(e.to_string())
        }
    }
}
