use serde::{Deserialize, Serialize};

/// Kind of chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// A message sent by a user or bot.
    #[default]
    Default,
    /// A system-generated message.
    System,
}

/// A message in a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Message id (UUID).
    pub id: String,
    /// Message kind.
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    /// Server the channel belongs to; absent for direct messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Markdown content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Ids of the messages this one replies to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reply_message_ids: Vec<String>,
    /// Only visible to the mentioned users.
    #[serde(default)]
    pub is_private: bool,
    /// Sent without notifying mentions.
    #[serde(default)]
    pub is_silent: bool,
    /// ISO 8601 creation time.
    pub created_at: String,
    /// Author user id.
    pub created_by: String,
    /// ISO 8601 last edit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// What remains of a message after deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMessage {
    /// Message id.
    pub id: String,
    /// Server the channel belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// ISO 8601 deletion time.
    pub deleted_at: String,
    /// Whether the deleted message was private.
    #[serde(default)]
    pub is_private: bool,
}
