//! Authentication state.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

/// Whether the client holds a token the server accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// No response has said either way yet.
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Shared authentication state, observable through [`subscribe`](Self::subscribe).
///
/// The protocol client drives the transitions from server responses; UI code
/// watches them to show or hide a sign-in screen.
#[derive(Clone)]
pub struct Authentication {
    status: Arc<watch::Sender<AuthStatus>>,
}

impl Authentication {
    pub fn new() -> Self {
        Self::with_status(AuthStatus::Unknown)
    }

    pub fn with_status(status: AuthStatus) -> Self {
        let (tx, _) = watch::channel(status);
        Self {
            status: Arc::new(tx),
        }
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    /// Move to `status`. Returns whether it changed; subscribers are only
    /// woken on a change.
    pub fn set(&self, status: AuthStatus) -> bool {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            info!(?status, "authentication state changed");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }
}

impl Default for Authentication {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Authentication").field(&self.status()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transitions_notify_once() {
        let auth = Authentication::new();
        let mut rx = auth.subscribe();

        assert!(auth.set(AuthStatus::Authenticated));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), AuthStatus::Authenticated);

        assert!(!auth.set(AuthStatus::Authenticated));
        assert!(!rx.has_changed().unwrap());

        assert!(auth.set(AuthStatus::Unauthenticated));
        assert!(!auth.is_authenticated());
    }

    #[test]
    fn test_clones_share_state() {
        let auth = Authentication::new();
        let other = auth.clone();
        auth.set(AuthStatus::Authenticated);
        assert!(other.is_authenticated());
    }
}
