//! REST collaborator: a thin typed client over the bot HTTP API.

mod calendar;
mod core;
mod docs;
mod members;
mod messages;
mod topics;

pub use calendar::NewCalendarEvent;
pub use core::{DEFAULT_API_URL, GuildedHttpClient, GuildedHttpClientBuilder};
pub use docs::NewDoc;
pub use messages::NewMessage;
pub use topics::NewTopic;
