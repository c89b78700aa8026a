//! The protocol client.
//!
//! [`SyncClient::request`] is the single entry point: it builds the
//! envelope, applies the authentication gate, calls the transport, validates
//! the answer and then runs the same post-processing for every well-formed
//! response, whatever its status:
//!
//! 1. remember `token` and `dataVersion` when present
//! 2. merge an embedded `business` into the live business
//! 3. merge an embedded `deviceRegister` into the live register
//! 4. update authentication state
//! 5. persist `{token, dataVersion}` through the save hook
//! 6. resolve with `data`, or reject if the status was `"error"`
//!
//! Absent fields never clear what is already known. The live business and
//! register are updated in place so every holder keeps the same instance.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use tillsync_core::{Business, Live, Merge, Register};

use crate::auth::{AuthStatus, Authentication};
use crate::error::{ProtocolError, Result};
use crate::messages::{ErrorPayload, Request, Response, ResponseStatus};
use crate::state::{SaveHook, SavedState};
use crate::transport::Transport;

/// Server endpoint paths.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub sign_in: String,
    pub business: String,
    pub register: String,
    pub order_history: String,
    pub register_events: String,
    pub transactions: String,
    pub changes: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sign_in: "/device/sign-in".into(),
            business: "/business".into(),
            register: "/register".into(),
            order_history: "/orders/history".into(),
            register_events: "/register/events".into(),
            transactions: "/transactions".into(),
            changes: "/changes".into(),
        }
    }
}

/// Configuration for the protocol client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    /// Error code with which the server reports a rejected token.
    pub auth_error_code: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            auth_error_code: "AUTH_FAILED".into(),
        }
    }
}

#[derive(Debug, Default)]
struct ClientState {
    token: Option<String>,
    data_version: Option<String>,
    /// Outcome of the last embedded business: `None` when it failed to parse.
    last_business: Option<Business>,
    last_register: Option<Register>,
}

/// Authenticated request/response client.
pub struct SyncClient<T> {
    transport: T,
    config: ClientConfig,
    state: Mutex<ClientState>,
    business: Live<Business>,
    register: Live<Register>,
    auth: Option<Authentication>,
    save_hook: Option<Arc<dyn SaveHook>>,
}

impl<T: Transport> SyncClient<T> {
    /// Create a client with fresh live entities and no token.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(ClientState::default()),
            business: Live::default(),
            register: Live::new(Register::uninitialized()),
            auth: None,
            save_hook: None,
        }
    }

    /// Seed the token and cursor from a previous run.
    pub fn with_saved_state(self, saved: SavedState) -> Self {
        {
            let mut state = self.lock();
            state.token = saved.token;
            state.data_version = saved.data_version;
        }
        self
    }

    /// Merge embedded businesses into `business` instead of a private one.
    pub fn with_business(mut self, business: Live<Business>) -> Self {
        self.business = business;
        self
    }

    /// Merge embedded registers into `register` instead of a private one.
    pub fn with_register(mut self, register: Live<Register>) -> Self {
        self.register = register;
        self
    }

    /// Drive `auth` from responses.
    pub fn with_authentication(mut self, auth: Authentication) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Persist token and cursor after every response.
    pub fn with_save_hook(mut self, hook: impl SaveHook + 'static) -> Self {
        self.save_hook = Some(Arc::new(hook));
        self
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn business(&self) -> &Live<Business> {
        &self.business
    }

    pub fn register(&self) -> &Live<Register> {
        &self.register
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.auth.as_ref()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn data_version(&self) -> Option<String> {
        self.lock().data_version.clone()
    }

    /// The business from the last response that carried one, or `None` if
    /// that one was malformed.
    pub fn last_business(&self) -> Option<Business> {
        self.lock().last_business.clone()
    }

    /// The register from the last response that carried one, or `None` if
    /// that one was malformed.
    pub fn last_register(&self) -> Option<Register> {
        self.lock().last_register.clone()
    }

    /// Token and cursor as they would be persisted.
    pub fn saved_state(&self) -> SavedState {
        let state = self.lock();
        SavedState {
            token: state.token.clone(),
            data_version: state.data_version.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Send `data` to `path` and return the response's `data` (or null).
    ///
    /// When `requires_auth` is set and no token is held this fails with
    /// [`ProtocolError::NotAuthenticated`] without touching the transport.
    pub async fn request(&self, path: &str, data: Option<Value>, requires_auth: bool) -> Result<Value> {
        let request = {
            let state = self.lock();
            if requires_auth && state.token.is_none() {
                debug!(path, "refusing unauthenticated request");
                return Err(ProtocolError::NotAuthenticated);
            }
            Request {
                data,
                data_version: state.data_version.clone(),
                token: if requires_auth { state.token.clone() } else { None },
            }
        };

        debug!(path, requires_auth, "sending request");
        let body = self.transport.post(path, Some(request.into_body())).await?;
        let response = Response::from_value(body)?;
        self.process(response).await
    }

    /// Like [`request`](Self::request), decoding `data` as `R`.
    pub async fn request_as<R: DeserializeOwned>(
        &self,
        path: &str,
        data: Option<Value>,
        requires_auth: bool,
    ) -> Result<R> {
        let data = self.request(path, data, requires_auth).await?;
        serde_json::from_value(data).map_err(|e| ProtocolError::InvalidResponse(e.to_string()))
    }

    /// Drop the token, mark the client unauthenticated and persist.
    pub async fn forget_token(&self) {
        self.lock().token = None;
        if let Some(auth) = &self.auth {
            auth.set(AuthStatus::Unauthenticated);
        }
        self.persist().await;
    }

    async fn process(&self, response: Response) -> Result<Value> {
        let Response {
            status,
            data,
            error,
            token,
            data_version,
            business,
            device_register,
        } = response;

        {
            let mut state = self.lock();
            if let Some(token) = &token {
                state.token = Some(token.clone());
            }
            if let Some(version) = data_version {
                state.data_version = Some(version);
            }
        }

        if let Some(raw) = business {
            let parsed = serde_json::from_value::<Business>(raw);
            let cached = merge_snapshot(&self.business, parsed, "business");
            self.lock().last_business = cached;
        }

        if let Some(raw) = device_register {
            let parsed = if raw.is_null() {
                Ok(Register::uninitialized())
            } else {
                serde_json::from_value::<Register>(raw)
            };
            let cached = merge_snapshot(&self.register, parsed, "deviceRegister");
            self.lock().last_register = cached;
        }

        let rejected = error
            .as_ref()
            .is_some_and(|e| e.code == self.config.auth_error_code);
        if rejected {
            // The held token is no longer valid.
            self.lock().token = None;
            warn!("credentials rejected, token dropped");
        }
        if let Some(auth) = &self.auth {
            if rejected {
                auth.set(AuthStatus::Unauthenticated);
            } else if token.is_some() {
                auth.set(AuthStatus::Authenticated);
            }
        }

        self.persist().await;

        match status {
            ResponseStatus::Ok => Ok(data.unwrap_or(Value::Null)),
            ResponseStatus::Error => {
                let ErrorPayload { code, message } = error.unwrap_or_else(ErrorPayload::unknown);
                Err(ProtocolError::Response { code, message })
            }
        }
    }

    async fn persist(&self) {
        let Some(hook) = &self.save_hook else {
            return;
        };
        let saved = self.saved_state();
        if let Err(e) = hook.save(&saved).await {
            warn!(error = %e, "failed to persist client state");
        }
    }
}

/// Merge a parsed snapshot into its live entity and return what to cache.
fn merge_snapshot<E>(live: &Live<E>, parsed: serde_json::Result<E>, what: &str) -> Option<E>
where
    E: Merge + Clone,
{
    match parsed {
        Ok(value) => {
            live.merge(value.clone());
            Some(value)
        }
        Err(e) => {
            warn!(field = what, error = %e, "ignoring malformed snapshot in response");
            None
        }
    }
}
