//! Client state that survives restarts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SaveError;

/// What the client persists after every response: the session token and the
/// data-version cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_version: Option<String>,
}

/// Persists [`SavedState`].
///
/// Failures are logged by the client and otherwise ignored.
#[async_trait]
pub trait SaveHook: Send + Sync {
    async fn save(&self, state: &SavedState) -> Result<(), SaveError>;
}

/// In-memory save hook for tests.
pub mod memory {
    use super::*;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    #[derive(Default)]
    struct Saved {
        states: Vec<SavedState>,
        fail: bool,
    }

    /// Records every saved state. Clones share the record.
    #[derive(Clone, Default)]
    pub struct MemorySaveHook {
        saved: Arc<Mutex<Saved>>,
    }

    impl MemorySaveHook {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Saved> {
            self.saved.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Make every save fail from now on.
        pub fn fail_saves(&self, fail: bool) {
            self.lock().fail = fail;
        }

        /// Every state saved so far.
        pub fn saved(&self) -> Vec<SavedState> {
            self.lock().states.clone()
        }

        /// The most recently saved state.
        pub fn last(&self) -> Option<SavedState> {
            self.lock().states.last().cloned()
        }
    }

    #[async_trait]
    impl SaveHook for MemorySaveHook {
        async fn save(&self, state: &SavedState) -> Result<(), SaveError> {
            let mut saved = self.lock();
            if saved.fail {
                return Err(SaveError("storage unavailable".into()));
            }
            saved.states.push(state.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_saved_state_wire_form() {
        let state = SavedState {
            token: Some("T".into()),
            data_version: None,
        };
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"token": "T"}));

        let parsed: SavedState = serde_json::from_value(json!({"dataVersion": "V"})).unwrap();
        assert_eq!(parsed.data_version.as_deref(), Some("V"));
        assert!(parsed.token.is_none());
    }
}
