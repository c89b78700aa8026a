//! Change propagation: from a committed change set to the delivery queue.

use tokio::sync::broadcast;
use tracing::debug;

use tillsync_core::{ChangeSet, ChangeSink, Order};
use tillsync_queue::{Delivery, DeliveryQueue, Sink};

use crate::events::ChangeEvent;

/// Capacity of the local change-event channel.
const LOCAL_EVENT_CAPACITY: usize = 256;

/// Packages committed change sets as [`ChangeEvent`]s and writes them to
/// the delivery queue.
///
/// Local listeners can follow the same events through
/// [`subscribe`](Self::subscribe). A slow listener misses events rather
/// than holding up delivery.
pub struct ChangePropagator<S> {
    queue: DeliveryQueue<ChangeEvent, S>,
    local: broadcast::Sender<ChangeEvent>,
}

impl<S: Sink<ChangeEvent>> ChangePropagator<S> {
    pub fn new(queue: DeliveryQueue<ChangeEvent, S>) -> Self {
        let (local, _) = broadcast::channel(LOCAL_EVENT_CAPACITY);
        Self { queue, local }
    }

    /// Queue a change set and return its delivery.
    pub fn submit(&self, order: &Order, changes: ChangeSet) -> Delivery {
        let event = ChangeEvent::new(&changes);
        debug!(
            order = %order.id(),
            event = %event.event_id,
            "queueing change event"
        );

        // No receivers is fine.
        let _ = self.local.send(event.clone());
        self.queue.write(event)
    }

    /// Follow change events as they are queued.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.local.subscribe()
    }

    pub fn queue(&self) -> &DeliveryQueue<ChangeEvent, S> {
        &self.queue
    }
}

impl<S: Sink<ChangeEvent>> ChangeSink for ChangePropagator<S> {
    fn propagate(&self, order: &Order, changes: ChangeSet) {
        // Callers of commit do not wait for delivery; the event stays queued.
        let _ = self.submit(order, changes);
    }
}
