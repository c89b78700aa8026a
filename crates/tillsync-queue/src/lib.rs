//! # tillsync queue
//!
//! Reliable in-memory delivery for the tillsync client. Payloads written to
//! a [`DeliveryQueue`] are batched and handed to a [`Sink`] until the sink
//! accepts them; failures are retried on a timer and never surface to the
//! writer.
//!
//! ## Key Types
//!
//! - [`DeliveryQueue`] - FIFO queue with a single self-rescheduling drain task
//! - [`Sink`] - The async trait a queue delivers to
//! - [`RetryPolicy`] - Delay between failed attempts
//! - [`RecordingSink`] - In-memory sink for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tillsync_queue::{DeliveryQueue, QueueConfig, RecordingSink};
//!
//! async fn example() {
//!     let queue = DeliveryQueue::new(RecordingSink::new(), QueueConfig::default());
//!
//!     // Resolves once everything queued so far has been delivered.
//!     queue.write("hello").await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **One attempt in flight**: a single task drains the queue, so batches
//!   never overlap and stay in write order
//! - **Whole-queue batches**: every attempt sends everything queued, and a
//!   failed batch is resent together with anything written since
//! - **No persistence**: entries live in memory; [`DeliveryQueue::pending`]
//!   and [`DeliveryQueue::restore`] let the caller persist them

pub mod error;
pub mod memory;
pub mod queue;
pub mod retry;
pub mod sink;

pub use error::{QueueError, Result, SinkError};
pub use memory::RecordingSink;
pub use queue::{Delivery, DeliveryQueue, QueueConfig, QueuePhase};
pub use retry::RetryPolicy;
pub use sink::Sink;
