//! In-memory sink for tests.
//!
//! [`RecordingSink`] keeps every batch it is handed and can be told to fail
//! or stall, which is enough to drive the queue through all of its phases.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::SinkError;
use crate::sink::Sink;

/// Sink that records batches instead of sending them anywhere.
///
/// Clones share state, so a test can keep one handle and give the other to
/// the queue.
pub struct RecordingSink<T> {
    inner: Arc<RecordingInner<T>>,
}

struct RecordingInner<T> {
    state: Mutex<RecordingState<T>>,
    hold: watch::Sender<bool>,
}

struct RecordingState<T> {
    /// Every batch seen, failed ones included.
    batches: Vec<Vec<T>>,
    /// Payloads from batches that succeeded.
    delivered: Vec<T>,
    /// Number of upcoming calls that fail.
    failures_left: usize,
}

impl<T> RecordingSink<T> {
    pub fn new() -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            inner: Arc::new(RecordingInner {
                state: Mutex::new(RecordingState {
                    batches: Vec::new(),
                    delivered: Vec::new(),
                    failures_left: 0,
                }),
                hold,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState<T>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `n` calls fail.
    pub fn fail_next(&self, n: usize) {
        self.lock().failures_left = n;
    }

    /// While held, calls block before returning.
    pub fn hold(&self, held: bool) {
        self.inner.hold.send_replace(held);
    }

    /// Number of calls so far.
    pub fn calls(&self) -> usize {
        self.lock().batches.len()
    }
}

impl<T: Clone> RecordingSink<T> {
    /// Every batch seen so far, in call order.
    pub fn batches(&self) -> Vec<Vec<T>> {
        self.lock().batches.clone()
    }

    /// Payloads from successful calls, in delivery order.
    pub fn delivered(&self) -> Vec<T> {
        self.lock().delivered.clone()
    }
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingSink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl<T> Sink<T> for RecordingSink<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn deliver(&self, batch: &[T]) -> Result<(), SinkError> {
        self.lock().batches.push(batch.to_vec());

        let mut hold = self.inner.hold.subscribe();
        // Only errors if the sender is gone, which cannot happen while
        // `self` is alive.
        let _ = hold.wait_for(|held| !held).await;

        let mut state = self.lock();
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(SinkError::Unavailable("scripted failure".into()));
        }
        state.delivered.extend_from_slice(batch);
        Ok(())
    }
}
