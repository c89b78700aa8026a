//! # tillsync protocol
//!
//! The authenticated request/response protocol between a tillsync client
//! and its server, plus the wire shapes for orders and change sets.
//!
//! ## Overview
//!
//! Every call is a POST of `{data?, dataVersion?, token?}` answered by
//! `{status, data?, error?, token?, dataVersion?, business?, deviceRegister?}`.
//! The client keeps the session token and the data-version cursor, merges
//! embedded business and register snapshots into the shared [`Live`]
//! instances, tracks authentication and persists its state after every
//! response.
//!
//! ## Key Types
//!
//! - [`SyncClient`] - Builds requests and post-processes responses
//! - [`Transport`] - The async trait that carries a request body
//! - [`Authentication`] - Observable authentication state
//! - [`SaveHook`] / [`SavedState`] - Persistence of token and cursor
//! - [`WireOrder`] / [`WireChanges`] - Outbound and inbound order shapes
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tillsync_protocol::{ClientConfig, ScriptedTransport, SyncClient};
//!
//! async fn example() {
//!     let transport = ScriptedTransport::new();
//!     transport.respond(serde_json::json!({"status": "ok", "token": "T1"}));
//!
//!     let client = SyncClient::new(transport, ClientConfig::default());
//!     let _data = client.request("/device/sign-in", None, false).await.unwrap();
//!     assert_eq!(client.token().as_deref(), Some("T1"));
//! }
//! ```
//!
//! ## Error Kinds
//!
//! | error | cause |
//! |---|---|
//! | `Server` | non-2xx status |
//! | `Network` | the request did not complete |
//! | `InvalidResponse` | undecodable or mis-shaped body |
//! | `Response` | well-formed `"error"` response |
//! | `NotAuthenticated` | no token for a request that needs one |
//!
//! [`Live`]: tillsync_core::Live

pub mod auth;
pub mod client;
pub mod error;
pub mod messages;
pub mod shaping;
pub mod state;
pub mod transport;

pub use auth::{AuthStatus, Authentication};
pub use client::{ClientConfig, Endpoints, SyncClient};
pub use error::{ErrorBody, ProtocolError, Result, SaveError, TransportError};
pub use messages::{ErrorPayload, Request, Response, ResponseStatus};
pub use shaping::{
    WireChanges, WireCredit, WireItem, WireOrder, WireProduct, WireRoomSelection, WireTax,
    WireTransaction,
};
pub use state::memory::MemorySaveHook;
pub use state::{SaveHook, SavedState};
pub use transport::memory::{RecordedRequest, ScriptedTransport};
pub use transport::Transport;
