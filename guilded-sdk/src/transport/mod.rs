//! Contract between the client and the socket that feeds it.
//!
//! A [`Transport`] owns the physical connection: opening it, heartbeats,
//! reconnecting and backoff. The client only consumes the ordered
//! [`TransportSignal`]s it produces.

use std::fmt;

use async_trait::async_trait;

use crate::errors::TransportError;

mod memory;
mod websocket;

pub use memory::{MemoryFeed, MemoryTransport};
pub use websocket::{DEFAULT_GATEWAY_URL, WebSocketConfig, WebSocketTransport};

/// One lifecycle signal or inbound message, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportSignal {
    /// The socket was reopened after a disconnect.
    ///
    /// The first successful open is reported by [`Transport::connect`]
    /// returning `Ok`, not by this signal.
    Connected,
    /// A text message from the server.
    Message(String),
    /// The socket dropped.
    Disconnected(DisconnectReason),
}

/// Why the socket dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Nothing arrived within the heartbeat window. The transport resumes from
    /// the last message id without a new handshake.
    NoMessageReceived,
    /// The connection broke (reset, EOF, I/O error).
    ConnectionLost(String),
    /// The server sent a close frame.
    ServerClosed {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// The client closed the socket.
    ClosedByClient,
    /// Any other failure.
    Error(String),
}

impl DisconnectReason {
    /// Whether the session survives this disconnect.
    pub fn is_resumable(&self) -> bool {
        matches!(self, DisconnectReason::NoMessageReceived)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::NoMessageReceived => write!(f, "no message received"),
            DisconnectReason::ConnectionLost(cause) => write!(f, "connection lost: {cause}"),
            DisconnectReason::ServerClosed { code, reason } => {
                write!(f, "closed by server ({code}): {reason}")
            }
            DisconnectReason::ClosedByClient => write!(f, "closed by client"),
            DisconnectReason::Error(cause) => write!(f, "error: {cause}"),
        }
    }
}

/// A source of gateway messages.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug + 'static {
    /// Open the connection.
    ///
    /// On success, returns the receiver of every later signal. The transport
    /// keeps the sender alive for as long as it runs, including across its own
    /// reconnects, and drops it once it gives up or is closed.
    ///
    /// # Errors
    /// [`TransportError`] when the first open fails. No retry is expected from
    /// the caller's side of this call.
    async fn connect(&self) -> Result<flume::Receiver<TransportSignal>, TransportError>;

    /// Stop reading, close the socket and drop the signal sender.
    async fn close(&self);
}
