use serde::{Deserialize, Serialize};

/// A topic in a forum channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumTopic {
    /// Topic id, unique within its channel.
    pub id: u64,
    /// Server the channel belongs to.
    pub server_id: String,
    /// Channel the topic lives in.
    pub channel_id: String,
    /// Title.
    pub title: String,
    /// Markdown body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Pinned to the top of the forum.
    #[serde(default)]
    pub is_pinned: bool,
    /// Locked against replies.
    #[serde(default)]
    pub is_locked: bool,
    /// ISO 8601 creation time.
    pub created_at: String,
    /// Author user id.
    pub created_by: String,
    /// ISO 8601 last edit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
