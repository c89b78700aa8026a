//! # Tillsync Testkit
//!
//! Testing utilities for tillsync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a sample business and order, canned server responses,
//!   and a [`TestFixture`] wiring a scripted transport to a client
//! - **Generators**: Proptest strategies for orders and order edits
//!
//! ## Test Fixtures
//!
//! ```rust
//! use tillsync_testkit::fixtures::{sample_business_json, TestFixture};
//!
//! let (fixture, saved) = TestFixture::signed_in("token-1");
//! fixture
//!     .transport
//!     .respond(serde_json::json!({"status": "ok", "business": sample_business_json()}));
//! let client = fixture.client(saved);
//! assert_eq!(client.token().as_deref(), Some("token-1"));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use tillsync_testkit::generators::{apply_edit, order, OrderEdit, OrderState};
//!
//! proptest! {
//!     #[test]
//!     fn test_revert_undoes_edits(mut o in order(), edits: Vec<OrderEdit>) {
//!         let before = OrderState::capture(&o);
//!         o.record_changes();
//!         edits.into_iter().for_each(|e| apply_edit(&mut o, e));
//!         o.revert_changes();
//!         prop_assert_eq!(OrderState::capture(&o), before);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{sample_business, sample_order, TestFixture};
pub use generators::{apply_edit, OrderEdit, OrderState};
