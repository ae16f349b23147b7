//! Unified error types for the `guilded` crate.
//!
//! This module centralizes every failure the SDK can surface and provides a
//! single top-level [`Error`] enum plus the convenient [`Result`] alias.
//! Errors from lower layers (`reqwest`, `serde_json`, URL parsing, the gateway
//! transport) are mapped into structured variants so callers can handle them
//! precisely.
//!
//! Failures that are local to one gateway frame ([`DispatchError`]) are not part
//! of [`Error`]: the dispatch loop logs and drops them. They are still exposed so
//! that [`crate::Dispatcher::dispatch`] can be driven and inspected directly.

use std::sync::Arc;

use thiserror::Error;

use crate::events::EventKey;

// --- Build-Time Errors ---

/// Errors that can occur while building a [`crate::GuildedClient`] or
/// [`crate::GuildedHttpClient`].
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to build the HTTP client (reqwest configuration).
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// The event registry could not be assembled.
    #[error("Failed to build the event registry: {0}")]
    Registry(#[from] RegistryError),

    /// A required setting was missing or malformed.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Errors raised while populating an [`crate::EventRegistry`].
///
/// These are programming errors: they only happen while a client is being
/// constructed and are never produced at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same key was registered twice.
    #[error("Event key {0} is already registered")]
    DuplicateKey(EventKey),
}

// --- The Main Operational Error Enum ---

/// The crate’s top-level error type.
///
/// It groups failures into high-level categories:
/// - [`Error::Request`]: REST transport/server/validation issues
/// - [`Error::Connect`]: the gateway could not be opened
/// - [`Error::Parse`]: URL parsing failures
/// - [`Error::Build`]: construction of a client failed
///
/// Most lower-level errors automatically convert into this enum via `From`.
#[derive(Debug, Error)]
pub enum Error {
    /// REST request/response failed (transport, server, validation, JSON).
    #[error("Request failed: {0}")]
    Request(#[from] RequestError),

    /// Opening the gateway connection failed.
    #[error("Gateway connection failed: {0}")]
    Connect(#[from] ConnectError),

    /// URL parsing failed while preparing a request or gateway address.
    #[error("Failed to parse URL: {0}")]
    Parse(#[from] url::ParseError),

    /// Building a client failed.
    #[error("Client build failed: {0}")]
    Build(#[from] BuildError),
}

// --- Consolidated Request Error ---

/// Transport and server-side REST errors.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Network/protocol failure from reqwest (timeouts, TLS, I/O, etc.).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned a non-success status. Includes status and body message.
    #[error("Server responded with an error: {status} - {message}")]
    Server {
        /// The HTTP status code returned by the server.
        status: reqwest::StatusCode,
        /// Short description or the server response body captured for context.
        message: String,
    },

    /// Caller supplied an invalid id/path/argument for this API.
    #[error("Invalid request: {message}")]
    Validation {
        /// Human-readable explanation of what was invalid.
        message: String,
    },

    /// JSON decoding failed when parsing a server response.
    #[error("JSON decode error: {message}")]
    DecodeJson {
        /// Error message from the JSON deserializer (with context if available).
        message: String,
    },
}

// --- Gateway Errors ---

/// Failure reported by a [`crate::transport::Transport`] implementation.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The socket could not be opened (DNS, TCP, TLS or upgrade failure).
    #[error("Could not open the socket: {0}")]
    Open(String),

    /// The server rejected the handshake (bad token, banned bot, ...).
    #[error("Handshake rejected: {0}")]
    Rejected(String),
}

/// Outcome error of [`crate::GuildedClient::connect`].
///
/// Cloneable so the same failure can be delivered to every subscriber of
/// [`crate::GuildedClient::connected`].
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// The transport failed to connect.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// `connect` was called while a connection is already running.
    #[error("The client is already connected")]
    AlreadyConnected,

    /// `connect` was called after `shutdown`.
    #[error("The client has been shut down")]
    ShutDown,
}

/// Per-frame decode failure. Always contained to the frame that caused it.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The raw text was not a gateway envelope (`{"op": .., "d": ..}`).
    #[error("Malformed gateway envelope: {0}")]
    Envelope(Arc<serde_json::Error>),

    /// The payload could not be deserialized into the registered type.
    #[error("Payload for {key} could not be decoded: {source}")]
    Decode {
        /// Key the frame resolved to.
        key: EventKey,
        /// Deserializer error.
        source: Arc<serde_json::Error>,
    },

    /// The payload transform rejected the frame.
    #[error("Payload transform for {key} failed: {source}")]
    Transform {
        /// Key the frame resolved to.
        key: EventKey,
        /// Transform error.
        source: TransformError,
    },
}

/// Error returned by a payload transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// A field the transform needs is absent from the envelope or payload.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A field had an unexpected JSON type.
    #[error("field `{0}` has an unexpected type")]
    WrongType(&'static str),
}

/// A specialized `Result` type for `guilded` operations.
pub type Result<T> = std::result::Result<T, Error>;

// Ergonomic "Staircase" From Implementations ---
// A macro to reduce boilerplate for converting base errors into the top-level Error.
macro_rules! impl_from_for_error {
    ($from_type:ty, $to_variant:path) => {
        impl From<$from_type> for Error {
            fn from(err: $from_type) -> Self {
                $to_variant(err.into())
            }
        }
    };
}

// Request Errors
impl_from_for_error!(reqwest::Error, Error::Request);

// Gateway Errors
impl_from_for_error!(TransportError, Error::Connect);

// Build Errors
impl_from_for_error!(RegistryError, Error::Build);

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::DecodeJson {
            message: err.to_string(),
        }
    }
}

impl_from_for_error!(serde_json::Error, Error::Request);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_converts_through_connect() {
        let err: Error = TransportError::Open("refused".into()).into();
        assert!(matches!(
            err,
            Error::Connect(ConnectError::Transport(TransportError::Open(_)))
        ));
        assert_eq!(
            err.to_string(),
            "Gateway connection failed: Could not open the socket: refused"
        );
    }

    #[test]
    fn duplicate_key_is_a_build_error() {
        let err: Error = RegistryError::DuplicateKey(EventKey::opcode(1)).into();
        assert!(matches!(err, Error::Build(BuildError::Registry(_))));
        assert!(err.to_string().contains("op 1"), "Got: {err}");
    }
}
