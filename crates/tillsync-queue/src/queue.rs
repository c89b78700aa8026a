//! The delivery queue.
//!
//! Payloads are appended by [`DeliveryQueue::write`] and drained by a single
//! background task that hands the whole queue to the [`Sink`] as one batch.
//! The task lives only while there is something to deliver:
//!
//! ```text
//! Idle ──write──▶ Attempting ──ok, queue empty──▶ Idle
//!                   │    ▲
//!              fail │    │ delay elapsed
//!                   ▼    │
//!              RetryScheduled
//! ```
//!
//! After a successful attempt the delivered entries are removed and the task
//! immediately attempts again, so anything written during the attempt goes
//! out in the next batch. Write futures resolve together once the task sees
//! an empty queue.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{QueueError, Result};
use crate::retry::RetryPolicy;
use crate::sink::Sink;

/// Configuration for a delivery queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Label used in log output.
    pub name: String,
    /// Delay between failed attempts.
    pub retry: RetryPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "delivery".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Where the drain task is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    /// No task running; the queue is empty.
    Idle,
    /// A batch is with the sink.
    Attempting,
    /// The last attempt failed; waiting out the retry delay.
    RetryScheduled,
}

/// Position-independent handle for a queued payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EntryId(u64);

struct QueueEntry<T> {
    id: EntryId,
    payload: T,
}

struct QueueState<T> {
    entries: Vec<QueueEntry<T>>,
    next_id: u64,
    phase: QueuePhase,
    waiters: Vec<oneshot::Sender<()>>,
}

struct Inner<T, S> {
    sink: S,
    config: QueueConfig,
    state: Mutex<QueueState<T>>,
}

impl<T, S> Inner<T, S> {
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reliable in-memory queue in front of a [`Sink`].
///
/// Entries are delivered in write order and are never dropped: a failing
/// sink is retried until it succeeds. The queue is cheap to clone; clones
/// share the same entries.
///
/// The drain task is spawned on the current tokio runtime. Writing outside
/// one keeps the payload queued and returns a [`Delivery`] that fails with
/// [`QueueError::NoRuntime`]; the payload goes out with the next write or
/// [`drained`](Self::drained) call made inside a runtime.
pub struct DeliveryQueue<T, S> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for DeliveryQueue<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, S> DeliveryQueue<T, S>
where
    T: Clone + Send + Sync + 'static,
    S: Sink<T>,
{
    /// Create an idle, empty queue.
    pub fn new(sink: S, config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                config,
                state: Mutex::new(QueueState {
                    entries: Vec::new(),
                    next_id: 0,
                    phase: QueuePhase::Idle,
                    waiters: Vec::new(),
                }),
            }),
        }
    }

    /// Append a payload and make sure a drain task is running.
    ///
    /// The returned future resolves once the queue has been flushed and
    /// observed empty, which includes this payload and everything written
    /// before the flush completed.
    pub fn write(&self, payload: T) -> Delivery {
        self.enqueue(std::iter::once(payload))
    }

    /// Re-enqueue payloads saved from [`pending`](Self::pending), typically
    /// at start-up. They go after anything already queued.
    pub fn restore(&self, payloads: impl IntoIterator<Item = T>) -> Delivery {
        self.enqueue(payloads)
    }

    /// Resolve once the queue is empty, without writing anything.
    ///
    /// Starts a drain task if entries were left behind by a write made
    /// outside a runtime.
    pub fn drained(&self) -> Delivery {
        self.attach(self.inner.lock())
    }

    /// Payloads not yet delivered, oldest first.
    pub fn pending(&self) -> Vec<T> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|e| e.payload.clone())
            .collect()
    }

    /// Number of payloads not yet delivered.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phase(&self) -> QueuePhase {
        self.inner.lock().phase
    }

    /// The sink this queue delivers to.
    pub fn sink(&self) -> &S {
        &self.inner.sink
    }

    fn enqueue(&self, payloads: impl IntoIterator<Item = T>) -> Delivery {
        let mut state = self.inner.lock();
        for payload in payloads {
            let id = EntryId(state.next_id);
            state.next_id += 1;
            state.entries.push(QueueEntry { id, payload });
        }
        self.attach(state)
    }

    /// Register a waiter for the next empty queue, starting the drain task
    /// when idle with entries.
    fn attach(&self, mut state: MutexGuard<'_, QueueState<T>>) -> Delivery {
        if state.phase != QueuePhase::Idle {
            let (tx, delivery) = Delivery::pending();
            state.waiters.push(tx);
            return delivery;
        }
        if state.entries.is_empty() {
            return Delivery::ready();
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!(
                queue = self.inner.config.name.as_str(),
                pending = state.entries.len(),
                "no runtime to drain on, entries kept"
            );
            return Delivery::failed();
        };

        state.phase = QueuePhase::Attempting;
        let (tx, delivery) = Delivery::pending();
        state.waiters.push(tx);
        drop(state);

        runtime.spawn(drain(Arc::clone(&self.inner)));
        delivery
    }
}

/// The drain task. Exactly one runs per queue while it is not idle.
async fn drain<T, S>(inner: Arc<Inner<T, S>>)
where
    T: Clone + Send + Sync + 'static,
    S: Sink<T>,
{
    let name = inner.config.name.as_str();
    let mut failures = 0u32;

    loop {
        let (ids, batch): (Vec<EntryId>, Vec<T>) = {
            let mut state = inner.lock();
            if state.entries.is_empty() {
                state.phase = QueuePhase::Idle;
                let waiters = mem::take(&mut state.waiters);
                drop(state);

                info!(queue = name, resolved = waiters.len(), "queue drained");
                for waiter in waiters {
                    // The caller may have dropped its future.
                    let _ = waiter.send(());
                }
                return;
            }
            state.phase = QueuePhase::Attempting;
            state
                .entries
                .iter()
                .map(|e| (e.id, e.payload.clone()))
                .unzip()
        };

        debug!(queue = name, batch = batch.len(), "delivering batch");

        match inner.sink.deliver(&batch).await {
            Ok(()) => {
                failures = 0;
                let mut state = inner.lock();
                state.entries.retain(|e| ids.binary_search(&e.id).is_err());
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = inner.config.retry.delay(failures);
                inner.lock().phase = QueuePhase::RetryScheduled;

                warn!(
                    queue = name,
                    error = %e,
                    failures,
                    retry_in = ?delay,
                    "delivery failed, retry scheduled"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Future returned by [`DeliveryQueue::write`] and friends.
///
/// Resolves when the queue has been observed empty.
#[must_use = "a delivery does nothing unless awaited; the payload is queued either way"]
#[derive(Debug)]
pub struct Delivery {
    /// `None` when no drain task could be started.
    rx: Option<oneshot::Receiver<()>>,
}

impl Delivery {
    fn pending() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx: Some(rx) })
    }

    fn failed() -> Self {
        Self { rx: None }
    }

    fn ready() -> Self {
        let (tx, delivery) = Self::pending();
        let _ = tx.send(());
        delivery
    }
}

impl Future for Delivery {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.rx {
            Some(rx) => Pin::new(rx)
                .poll(cx)
                .map(|r| r.map_err(|_| QueueError::Stopped)),
            None => Poll::Ready(Err(QueueError::NoRuntime)),
        }
    }
}
