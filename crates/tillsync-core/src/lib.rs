//! # tillsync core
//!
//! The in-memory model of a point-of-sale client: orders and their lines,
//! the business catalog, the device register, and the change-set engine
//! that works out what changed in an order so it can be uploaded.
//!
//! This crate does no I/O. Delivery and the server protocol live in
//! `tillsync-queue` and `tillsync-protocol`.
//!
//! ## Key Types
//!
//! - [`Order`] - A customer transaction with append-only lines
//! - [`ChangeSet`] - The fields of an order changed during one recording
//! - [`Business`] / [`Register`] - Server-owned entities shared through [`Live`]
//! - [`Catalog`] - Products keyed by id, with parent/variant lookup
//!
//! ## Change tracking
//!
//! ```
//! use tillsync_core::{ChangeSet, Order};
//!
//! let mut order = Order::new();
//! order.record_changes();
//! order.set_note("table 4");
//!
//! let sink = |_: &Order, changes: ChangeSet| assert_eq!(changes.note(), Some("table 4"));
//! assert!(order.commit_changes(&sink));
//! ```

pub mod business;
pub mod changes;
pub mod customer;
pub mod error;
pub mod field;
pub mod live;
pub mod order;
pub mod product;
pub mod register;
pub mod types;

pub use business::{Business, Room, TransactionMode};
pub use changes::{ChangeField, ChangeSet, ChangeSink};
pub use customer::Customer;
pub use error::{CoreError, Result};
pub use field::{FieldDef, FieldKind, FieldValue, FieldValues};
pub use live::{Live, Merge};
pub use order::{AppliedTax, Credit, Item, Order, OrderParts, RoomSelection, Transaction};
pub use product::{Catalog, Product, Tax};
pub use register::{Register, RegisterSession};
pub use types::{
    now_millis, Amount, BusinessId, EventId, FieldId, LineId, OrderId, ProductId, RegisterId,
    RoomId, TaxId, TransactionModeId,
};
