#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod client;
mod dispatch;
mod entities;
pub mod errors;
pub mod events;
mod macros;
pub mod models;
mod readiness;
mod rest;
pub mod transport;
mod util;

pub mod prelude;

// --- PUBLIC API EXPORTS ---
// Gateway facade
pub use client::core::{ConnectOutcome, GuildedClient, GuildedClientBuilder};
// REST
pub use rest::{
    GuildedHttpClient, GuildedHttpClientBuilder, NewCalendarEvent, NewDoc, NewMessage, NewTopic,
};
// Event core
pub use dispatch::{DispatchStats, Dispatched, Dispatcher};
pub use events::hub::{EventHub, EventStream, Subscription};
pub use events::registry::{Descriptor, EventRegistry, TypedDescriptor};
pub use events::scoped::ScopedStream;
pub use events::{EventKey, Frame};
pub use readiness::Readiness;

// Errors
pub use errors::{
    BuildError, ConnectError, DispatchError, Error, RegistryError, RequestError, Result,
    TransformError, TransportError,
};

// Export common constants
pub use rest::DEFAULT_API_URL;
pub use transport::DEFAULT_GATEWAY_URL;

// Re-exports
pub use reqwest::{Method, StatusCode};

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}
