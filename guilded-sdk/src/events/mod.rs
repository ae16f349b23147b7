//! Gateway events: keys, raw frames, the registry and the typed streams.
//!
//! Every gateway message is a JSON envelope:
//!
//! ```text
//! { "op": 0, "t": "ChatMessageCreated", "s": "<message id>", "d": { ... } }
//! ```
//!
//! Control messages (welcome, resume) are identified by their opcode alone.
//! Domain events share opcode [`opcode::EVENT`] and are identified by `t`.

use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

pub mod hub;
pub mod payloads;
pub mod registry;
pub mod scoped;
pub mod standard;
pub mod transforms;

/// Gateway opcodes understood by the SDK.
pub mod opcode {
    /// A named domain event; the key is the `t` field.
    pub const EVENT: u8 = 0;
    /// First message after the socket opens. Carries the bot identity.
    pub const WELCOME: u8 = 1;
    /// The server finished replaying missed events after a resume.
    pub const RESUME: u8 = 2;
}

/// Domain event names registered by default.
pub mod names {
    #![allow(missing_docs)]

    pub const CHAT_MESSAGE_CREATED: &str = "ChatMessageCreated";
    pub const CHAT_MESSAGE_UPDATED: &str = "ChatMessageUpdated";
    pub const CHAT_MESSAGE_DELETED: &str = "ChatMessageDeleted";
    pub const SERVER_MEMBER_JOINED: &str = "ServerMemberJoined";
    pub const SERVER_MEMBER_REMOVED: &str = "ServerMemberRemoved";
    pub const DOC_CREATED: &str = "DocCreated";
    pub const DOC_UPDATED: &str = "DocUpdated";
    pub const DOC_DELETED: &str = "DocDeleted";
    pub const FORUM_TOPIC_CREATED: &str = "ForumTopicCreated";
    pub const FORUM_TOPIC_UPDATED: &str = "ForumTopicUpdated";
    pub const FORUM_TOPIC_DELETED: &str = "ForumTopicDeleted";
    pub const CALENDAR_EVENT_CREATED: &str = "CalendarEventCreated";
    pub const CALENDAR_EVENT_UPDATED: &str = "CalendarEventUpdated";
    pub const CALENDAR_EVENT_DELETED: &str = "CalendarEventDeleted";
}

/// Identifies one entry of the [`registry::EventRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Control message keyed by opcode.
    Opcode(u8),
    /// Domain event keyed by its `t` name.
    Name(Cow<'static, str>),
}

impl EventKey {
    /// Key for a control opcode.
    #[must_use]
    pub const fn opcode(op: u8) -> Self {
        EventKey::Opcode(op)
    }

    /// Key for a domain event name.
    pub fn name<S: Into<Cow<'static, str>>>(name: S) -> Self {
        EventKey::Name(name.into())
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Opcode(op) => write!(f, "op {op}"),
            EventKey::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

impl From<u8> for EventKey {
    fn from(op: u8) -> Self {
        EventKey::Opcode(op)
    }
}

impl From<&'static str> for EventKey {
    fn from(name: &'static str) -> Self {
        EventKey::Name(Cow::Borrowed(name))
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        EventKey::Name(Cow::Owned(name))
    }
}

/// One inbound gateway message, parsed from its JSON envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Frame {
    /// Control code, always present.
    #[serde(rename = "op")]
    pub opcode: u8,
    /// Event name, only set for [`opcode::EVENT`].
    #[serde(rename = "t", default)]
    pub event_name: Option<String>,
    /// Server message id, used to resume.
    #[serde(rename = "s", default)]
    pub message_id: Option<String>,
    /// Untyped payload.
    #[serde(rename = "d", default)]
    pub payload: Value,
}

impl Frame {
    /// Parse a text message into a frame.
    ///
    /// # Errors
    /// Returns the deserializer error when the text is not an envelope.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Build a frame by hand (tests, custom transports).
    pub fn new(opcode: u8, event_name: Option<&str>, payload: Value) -> Self {
        Self {
            opcode,
            event_name: event_name.map(str::to_owned),
            message_id: None,
            payload,
        }
    }

    /// The registry key this frame resolves to.
    ///
    /// Domain events are keyed by name, everything else by opcode. Returns
    /// `None` for a domain event without a name.
    pub fn key(&self) -> Option<EventKey> {
        if self.opcode == opcode::EVENT {
            self.event_name.clone().map(EventKey::from)
        } else {
            Some(EventKey::Opcode(self.opcode))
        }
    }
}
