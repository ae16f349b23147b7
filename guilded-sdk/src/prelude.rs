//! Common imports for quick starts.

// Common
pub use crate::{BuildError, Error, Result};

// Clients
pub use crate::{GuildedClient, GuildedClientBuilder};
pub use crate::{GuildedHttpClient, GuildedHttpClientBuilder};

// Events
pub use crate::events::payloads::*;
pub use crate::{EventKey, EventStream, Subscription};

// Entities
pub use crate::models::{BotUser, CalendarEvent, ChatMessage, Doc, ForumTopic, ServerMember, User};

// Streams are consumed through `StreamExt`.
pub use futures_util::StreamExt;
