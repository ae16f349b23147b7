//! Server-side entities as returned by the REST API and carried by gateway events.
//!
//! Timestamps are kept as the ISO 8601 strings the API sends.

mod calendar;
mod doc;
mod message;
mod topic;
mod user;

pub use calendar::CalendarEvent;
pub use doc::Doc;
pub use message::{ChatMessage, DeletedMessage, MessageType};
pub use topic::ForumTopic;
pub use user::{BotUser, ServerMember, User, UserType};
