//! The sync service: composition root for a tillsync client.
//!
//! The service owns the protocol client, the live business and register,
//! authentication state and the change-delivery pipeline:
//!
//! ```text
//! Order::commit_changes ──▶ ChangePropagator ──▶ DeliveryQueue ──▶ ChangeUploader ──▶ SyncClient
//! ```
//!
//! Query operations go straight to the client and report failures as
//! [`ServiceError`]. Change uploads never fail from the caller's point of
//! view; they are retried until the server accepts them.

use std::cell::Cell;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::info;

use tillsync_core::{
    Business, ChangeSet, Item, Live, Order, OrderId, ProductId, Register, Transaction,
};
use tillsync_protocol::{
    Authentication, ClientConfig, SaveHook, SavedState, SyncClient, Transport, WireOrder,
    WireTransaction,
};
use tillsync_queue::{Delivery, DeliveryQueue, QueueConfig};

use crate::error::{Result, ServiceError};
use crate::events::{ChangeEvent, RegisterEvent};
use crate::propagation::ChangePropagator;
use crate::uploader::ChangeUploader;

/// Configuration for the sync service.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Protocol client configuration.
    pub client: ClientConfig,
    /// Change-delivery queue configuration.
    pub queue: QueueConfig,
}

/// Credentials a device signs in with.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCredentials {
    pub device_id: String,
    pub secret: String,
}

/// Filter for [`SyncService::order_history`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    /// Only orders created at or after this time (Unix ms).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// The change propagator this service uses.
pub type ServicePropagator<T> = ChangePropagator<ChangeUploader<T>>;

/// A tillsync client: protocol, live entities and change delivery.
pub struct SyncService<T> {
    client: Arc<SyncClient<T>>,
    propagator: ServicePropagator<T>,
}

impl<T: Transport + 'static> SyncService<T> {
    /// Create a service with fresh live entities and a fresh authentication
    /// state.
    pub fn new(transport: T, config: ServiceConfig) -> Self {
        let client = SyncClient::new(transport, config.client).with_authentication(Authentication::new());
        Self::from_client(client, config.queue)
    }

    /// Create a service restoring state from a previous run and persisting
    /// through `hook`.
    pub fn restore(
        transport: T,
        config: ServiceConfig,
        saved: SavedState,
        hook: impl SaveHook + 'static,
    ) -> Self {
        let auth = Authentication::new();
        let client = SyncClient::new(transport, config.client)
            .with_saved_state(saved)
            .with_authentication(auth)
            .with_save_hook(hook);
        Self::from_client(client, config.queue)
    }

    /// Build the delivery pipeline around an existing client.
    pub fn from_client(client: SyncClient<T>, queue: QueueConfig) -> Self {
        let client = Arc::new(client);
        let uploader = ChangeUploader::new(Arc::clone(&client));
        let propagator = ChangePropagator::new(DeliveryQueue::new(uploader, queue));
        Self { client, propagator }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn client(&self) -> &SyncClient<T> {
        &self.client
    }

    /// The shared business instance. Updated in place by every response that
    /// carries one.
    pub fn business(&self) -> Live<Business> {
        self.client.business().clone()
    }

    /// The shared register instance.
    pub fn register(&self) -> Live<Register> {
        self.client.register().clone()
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.client.authentication()
    }

    /// The change sink to commit orders into.
    pub fn changes(&self) -> &ServicePropagator<T> {
        &self.propagator
    }

    /// Follow change events as they are queued.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.propagator.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Change delivery
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit an order's recorded changes and return the delivery to await,
    /// or `None` when nothing changed.
    ///
    /// Outside a tokio runtime the change event is still queued, but the
    /// delivery fails with [`QueueError::NoRuntime`](tillsync_queue::QueueError::NoRuntime)
    /// and the upload waits for the next commit or [`flush`](Self::flush)
    /// made inside one.
    pub fn commit(&self, order: &mut Order) -> Option<Delivery> {
        let delivery = Cell::new(None);
        order.commit_changes(&|order: &Order, changes: ChangeSet| {
            delivery.set(Some(self.propagator.submit(order, changes)));
        });
        delivery.into_inner()
    }

    /// Wait until every queued change event has been uploaded.
    pub async fn flush(&self) -> Result<()> {
        self.propagator.queue().drained().await?;
        Ok(())
    }

    /// Change events not yet uploaded, for persisting across restarts.
    pub fn pending_changes(&self) -> Vec<ChangeEvent> {
        self.propagator.queue().pending()
    }

    /// Re-queue change events saved by [`pending_changes`](Self::pending_changes).
    pub fn restore_changes(&self, events: Vec<ChangeEvent>) -> Delivery {
        info!(events = events.len(), "restoring queued change events");
        self.propagator.queue().restore(events)
    }

    /// Add `quantity` of a product from the current business catalog to
    /// `order`, with the catalog's price and taxes.
    pub fn add_product(
        &self,
        order: &mut Order,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Arc<Item>> {
        let item = Item::from_catalog(&self.client.business().read(), product_id, quantity)?;
        Ok(order.add_item(item))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign the device in. The response's token authenticates the client.
    pub async fn sign_in(&self, credentials: &DeviceCredentials) -> Result<()> {
        let path = self.client.config().endpoints.sign_in.as_str();
        self.client
            .request(path, Some(json!(credentials)), false)
            .await?;
        info!(device = %credentials.device_id, "device signed in");
        Ok(())
    }

    /// Drop the token and mark the client signed out.
    pub async fn sign_out(&self) {
        self.client.forget_token().await;
        info!("device signed out");
    }

    /// Fetch the business. The live instance is updated in place and a copy
    /// of it returned.
    pub async fn refresh_business(&self) -> Result<Business> {
        let path = self.client.config().endpoints.business.as_str();
        self.client.request(path, None, true).await?;
        Ok(self.client.business().snapshot())
    }

    /// Fetch the device register. The live instance is updated in place and
    /// a copy of it returned.
    pub async fn refresh_register(&self) -> Result<Register> {
        let path = self.client.config().endpoints.register.as_str();
        self.client.request(path, None, true).await?;
        Ok(self.client.register().snapshot())
    }

    /// Fetch past orders.
    pub async fn order_history(&self, query: &HistoryQuery) -> Result<Vec<Order>> {
        let path = self.client.config().endpoints.order_history.as_str();
        let orders: Vec<WireOrder> = self
            .client
            .request_as(path, Some(json!(query)), true)
            .await?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    /// Record a register event such as opening or closing the till.
    pub async fn push_register_event(&self, event: &RegisterEvent) -> Result<()> {
        let register_id = self
            .client
            .register()
            .read()
            .id
            .clone()
            .ok_or(ServiceError::RegisterNotInitialized)?;

        let path = self.client.config().endpoints.register_events.as_str();
        self.client
            .request(
                path,
                Some(json!({"registerId": register_id, "event": event})),
                true,
            )
            .await?;
        Ok(())
    }

    /// Record a payment taken outside a change set.
    pub async fn push_transaction(&self, order_id: OrderId, transaction: &Transaction) -> Result<()> {
        let path = self.client.config().endpoints.transactions.as_str();
        let data = json!({
            "orderId": order_id,
            "transaction": WireTransaction::from(transaction),
        });
        self.client.request(path, Some(data), true).await?;
        Ok(())
    }
}
