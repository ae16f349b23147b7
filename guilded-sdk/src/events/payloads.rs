//! Typed payloads of the gateway messages the SDK registers by default.

use serde::{Deserialize, Serialize};

use crate::models::{
    BotUser, CalendarEvent, ChatMessage, DeletedMessage, Doc, ForumTopic, ServerMember,
};

/// Opcode 1: sent once the socket is open and the bot is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    /// Interval at which the server expects pings.
    pub heartbeat_interval_ms: u64,
    /// Last message id seen by the server, to resume from after a drop.
    #[serde(default)]
    pub last_message_id: Option<String>,
    /// The bot's identity.
    pub user: BotUser,
}

/// Opcode 2: the server finished replaying events missed during a drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    /// Id of the last replayed message.
    #[serde(default)]
    pub last_message_id: Option<String>,
}

/// `ChatMessageCreated` and `ChatMessageUpdated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Server the message belongs to; absent for direct messages.
    #[serde(default)]
    pub server_id: Option<String>,
    /// The message after the change.
    pub message: ChatMessage,
}

/// `ChatMessageDeleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletedEvent {
    /// Server the message belonged to.
    #[serde(default)]
    pub server_id: Option<String>,
    /// The deleted message.
    pub message: DeletedMessage,
}

/// `ServerMemberJoined`.
///
/// The wire payload carries `serverId` only on the envelope; it is copied into
/// `member` before decoding (see [`crate::events::transforms`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberJoinedEvent {
    /// Server that was joined.
    pub server_id: String,
    /// The new member.
    pub member: ServerMember,
    /// Member count after the join.
    #[serde(default)]
    pub server_member_count: Option<u64>,
}

/// `ServerMemberRemoved`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRemovedEvent {
    /// Server that was left.
    pub server_id: String,
    /// The removed user.
    pub user_id: String,
    /// Removed by a kick.
    #[serde(default)]
    pub is_kick: bool,
    /// Removed by a ban.
    #[serde(default)]
    pub is_ban: bool,
}

/// `DocCreated`, `DocUpdated` and `DocDeleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEvent {
    /// Server the doc belongs to.
    pub server_id: String,
    /// The doc.
    pub doc: Doc,
}

/// `ForumTopicCreated`, `ForumTopicUpdated` and `ForumTopicDeleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicEvent {
    /// Server the topic belongs to.
    pub server_id: String,
    /// The topic.
    pub forum_topic: ForumTopic,
}

/// `CalendarEventCreated`, `CalendarEventUpdated` and `CalendarEventDeleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventEvent {
    /// Server the calendar event belongs to.
    pub server_id: String,
    /// The calendar event.
    pub calendar_event: CalendarEvent,
}
