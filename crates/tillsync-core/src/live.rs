//! Long-lived shared entities that are updated in place.
//!
//! A [`Live`] handle is the one allocation every subsystem (UI bindings,
//! listeners, the sync client) holds for the business or the register.
//! Updates mutate the value behind the handle and never swap the allocation,
//! so every holder keeps seeing the same instance. Each update bumps a
//! revision counter that interested parties can watch.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tokio::sync::watch;

/// Update an existing value from a freshly parsed one without replacing it.
pub trait Merge {
    /// Copy the server-owned state of `incoming` into `self`.
    fn merge_from(&mut self, incoming: Self);
}

/// Shared handle to an entity updated in place.
pub struct Live<T> {
    inner: Arc<LiveInner<T>>,
}

struct LiveInner<T> {
    value: RwLock<T>,
    revision: watch::Sender<u64>,
}

impl<T> Live<T> {
    /// Wrap a value.
    pub fn new(value: T) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(LiveInner {
                value: RwLock::new(value),
                revision,
            }),
        }
    }

    /// Borrow the current value.
    ///
    /// Do not hold the guard across an `.await`.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the value in place and notify subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)
        };
        self.inner.revision.send_modify(|rev| *rev += 1);
        result
    }

    /// Subscribe to update notifications.
    ///
    /// The receiver yields the revision number, which increases by one per
    /// update.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Number of updates applied so far.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Whether two handles point at the same instance.
    pub fn same_as(&self, other: &Live<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Merge> Live<T> {
    /// Merge a freshly parsed value into the shared instance.
    pub fn merge(&self, incoming: T) {
        self.update(|current| current.merge_from(incoming));
    }
}

impl<T: Clone> Live<T> {
    /// Clone out the current value.
    pub fn snapshot(&self) -> T {
        self.read().clone()
    }
}

impl<T: Default> Default for Live<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Clone for Live<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Live<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Live")
            .field("value", &*self.read())
            .field("revision", &self.revision())
            .finish()
    }
}
