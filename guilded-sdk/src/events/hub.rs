//! Typed broadcast channels.
//!
//! An [`EventHub<T>`] is the sink of one registry entry. Every subscriber owns
//! its own unbounded `flume` channel, so a slow subscriber only delays itself:
//! publishing never waits. Events reach every subscriber in publish order, and
//! streams are live-only (nothing is replayed to late subscribers).

use std::any::type_name;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures_util::future::{AbortHandle, Abortable};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};

use crate::sdk_log;

/// Multi-subscriber, ordered, unbounded broadcast point for values of `T`.
///
/// Cloning a hub yields another handle to the same subscriber list.
pub struct EventHub<T> {
    inner: Arc<HubInner<T>>,
}

struct HubInner<T> {
    subscribers: Mutex<Vec<flume::Sender<T>>>,
    closed: AtomicBool,
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("type", &type_name::<T>())
            .field("subscribers", &self.subscriber_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(HubInner {
                subscribers: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

impl<T> EventHub<T> {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscribers. Dropped streams are only pruned on the
    /// next publish.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Ends every subscriber stream. Later publishes are discarded and later
    /// subscribers receive an already-finished stream.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<flume::Sender<T>>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> EventHub<T> {
    /// Deliver `value` to every current subscriber. Returns how many received it.
    pub fn publish(&self, value: T) -> usize {
        if self.is_closed() {
            return 0;
        }
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
        subscribers.len()
    }

    /// Subscribe as a [`Stream`].
    pub fn subscribe(&self) -> EventStream<T> {
        let (tx, rx) = flume::unbounded();
        if !self.is_closed() {
            self.lock().push(tx);
        }
        EventStream {
            inner: rx.into_stream().boxed(),
        }
    }

    /// Subscribe with a callback running on its own tokio task.
    ///
    /// The callback sees events in publish order. A panic inside the callback
    /// is caught and logged, and the next event is still delivered. Dropping the
    /// returned [`Subscription`] stops delivery; call
    /// [`Subscription::detach`] to keep it running for the life of the hub.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn subscribe_with<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(T) + Send + 'static,
    {
        let stream = self.subscribe();
        let (abort, registration) = AbortHandle::new_pair();
        tokio::spawn(Abortable::new(run_callback(stream, callback), registration));
        Subscription { abort: Some(abort) }
    }
}

async fn run_callback<T, F>(mut stream: EventStream<T>, mut callback: F)
where
    T: Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    while let Some(event) = stream.next().await {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
            sdk_log!(
                error,
                "Subscriber callback for {} panicked: {}",
                type_name::<T>(),
                panic_message(panic.as_ref())
            );
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic>"
    }
}

/// Live stream of events published on an [`EventHub`].
///
/// Ends when the hub is closed (client shutdown).
pub struct EventStream<T> {
    inner: BoxStream<'static, T>,
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("type", &type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T> EventStream<T> {
    /// Wait for the next event. `None` once the hub is closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.inner.next().await
    }
}

impl<T> Stream for EventStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Handle of a callback subscription created by [`EventHub::subscribe_with`].
#[derive(Debug)]
#[must_use = "dropping a Subscription stops its callback"]
pub struct Subscription {
    abort: Option<AbortHandle>,
}

impl Subscription {
    /// Stop delivering events to the callback.
    pub fn unsubscribe(mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }

    /// Let the callback run until the hub closes.
    pub fn detach(mut self) {
        self.abort = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}
