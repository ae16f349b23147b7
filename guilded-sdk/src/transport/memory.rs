use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use super::{DisconnectReason, Transport, TransportSignal};
use crate::errors::TransportError;

/// In-process transport fed by hand through a [`MemoryFeed`].
///
/// Useful for tests and for applications that run their own socket and only
/// want the typed event layer.
///
/// # Example
/// ```
/// # async fn run() -> guilded::Result<()> {
/// use guilded::GuildedClient;
/// use guilded::transport::MemoryTransport;
///
/// let (transport, feed) = MemoryTransport::new();
/// let client = GuildedClient::builder().transport(transport).build()?;
/// client.connect().await?;
/// feed.message(r#"{"op":1,"d":{"heartbeatIntervalMs":22500,"user":{"id":"u","botId":"b","name":"bot","createdBy":"o","createdAt":"2024-01-01T00:00:00Z"}}}"#);
/// let me = client.wait_prepared().await;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    shared: Arc<Mutex<Shared>>,
}

#[derive(Debug, Default)]
struct Shared {
    sender: Option<flume::Sender<TransportSignal>>,
    fail_with: Option<TransportError>,
    connects: usize,
}

/// Pushes signals into the connection opened by a [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct MemoryFeed {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryTransport {
    /// A transport and the feed that drives it.
    pub fn new() -> (Self, MemoryFeed) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MemoryFeed { shared },
        )
    }

    /// A transport whose `connect` fails with `error` until
    /// [`MemoryFeed::allow_connect`] is called.
    pub fn failing(error: TransportError) -> (Self, MemoryFeed) {
        let (transport, feed) = Self::new();
        lock(&transport.shared).fail_with = Some(error);
        (transport, feed)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self) -> Result<flume::Receiver<TransportSignal>, TransportError> {
        let mut shared = lock(&self.shared);
        if let Some(error) = &shared.fail_with {
            return Err(error.clone());
        }
        let (tx, rx) = flume::unbounded();
        shared.sender = Some(tx);
        shared.connects += 1;
        Ok(rx)
    }

    async fn close(&self) {
        lock(&self.shared).sender = None;
    }
}

impl MemoryFeed {
    /// Deliver a raw text message. Returns `false` when not connected.
    pub fn message(&self, text: impl Into<String>) -> bool {
        self.send(TransportSignal::Message(text.into()))
    }

    /// Simulate a reconnect.
    pub fn reconnected(&self) -> bool {
        self.send(TransportSignal::Connected)
    }

    /// Simulate a dropped socket.
    pub fn disconnected(&self, reason: DisconnectReason) -> bool {
        self.send(TransportSignal::Disconnected(reason))
    }

    /// End the connection as if the transport gave up.
    pub fn hang_up(&self) {
        lock(&self.shared).sender = None;
    }

    /// Let later `connect` calls succeed.
    pub fn allow_connect(&self) {
        lock(&self.shared).fail_with = None;
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        lock(&self.shared).sender.is_some()
    }

    /// How many times `connect` succeeded.
    pub fn connect_count(&self) -> usize {
        lock(&self.shared).connects
    }

    fn send(&self, signal: TransportSignal) -> bool {
        lock(&self.shared)
            .sender
            .as_ref()
            .is_some_and(|tx| tx.send(signal).is_ok())
    }
}

fn lock(shared: &Mutex<Shared>) -> std::sync::MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
