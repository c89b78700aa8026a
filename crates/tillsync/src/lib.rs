//! # tillsync
//!
//! Offline-capable sync core for a point-of-sale client.
//!
//! ## Overview
//!
//! Three parts work together:
//!
//! - the change-set engine in [`tillsync_core`] works out what changed in
//!   an [`Order`] while it was being edited
//! - the delivery queue in [`tillsync_queue`] guarantees those changes reach
//!   the server eventually, retrying on failure
//! - the protocol client in [`tillsync_protocol`] speaks the authenticated
//!   request/response protocol and keeps the shared business and register
//!   up to date
//!
//! [`SyncService`] wires them together.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tillsync::{Order, ServiceConfig, SyncService};
//! use tillsync_protocol::ScriptedTransport;
//!
//! async fn example() {
//!     let service = SyncService::new(ScriptedTransport::new(), ServiceConfig::default());
//!
//!     let mut order = Order::new();
//!     order.record_changes();
//!     order.set_note("table 4");
//!
//!     // Queues the change; await the delivery to wait for the upload.
//!     if let Some(delivery) = service.commit(&mut order) {
//!         delivery.await.unwrap();
//!     }
//! }
//! ```

pub mod error;
pub mod events;
pub mod propagation;
pub mod service;
pub mod uploader;

pub use error::{Result, ServiceError};
pub use events::{ChangeEvent, RegisterEvent};
pub use propagation::ChangePropagator;
pub use service::{DeviceCredentials, HistoryQuery, ServiceConfig, ServicePropagator, SyncService};
pub use uploader::ChangeUploader;

// Re-export the pieces applications touch directly.
pub use tillsync_core::{
    Amount, Business, ChangeField, ChangeSet, ChangeSink, CoreError, Credit, Customer, Item, Live,
    Order, ProductId, Register, RoomSelection, Transaction,
};
pub use tillsync_protocol::{AuthStatus, Authentication, ErrorBody, ProtocolError};
pub use tillsync_queue::{Delivery, QueueConfig, QueueError, QueuePhase, RetryPolicy};
