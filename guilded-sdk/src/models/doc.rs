use serde::{Deserialize, Serialize};

/// A document in a docs channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doc {
    /// Doc id, unique within its channel.
    pub id: u64,
    /// Server the channel belongs to.
    pub server_id: String,
    /// Channel the doc lives in.
    pub channel_id: String,
    /// Title.
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// ISO 8601 creation time.
    pub created_at: String,
    /// Author user id.
    pub created_by: String,
    /// ISO 8601 last edit time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Last editor user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}
