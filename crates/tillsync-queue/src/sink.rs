//! Sink trait: where a delivery queue sends its batches.

use async_trait::async_trait;

use crate::error::SinkError;

/// Destination for batches drained from a [`DeliveryQueue`](crate::DeliveryQueue).
///
/// A failed batch is retried verbatim, possibly with more entries appended,
/// so implementations must tolerate seeing the same payload more than once.
#[async_trait]
pub trait Sink<T>: Send + Sync + 'static
where
    T: Send + Sync,
{
    /// Deliver a batch in queue order.
    async fn deliver(&self, batch: &[T]) -> Result<(), SinkError>;
}
