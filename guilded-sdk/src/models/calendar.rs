use serde::{Deserialize, Serialize};

/// An event in a calendar channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Calendar event id, unique within its channel.
    pub id: u64,
    /// Server the channel belongs to.
    pub server_id: String,
    /// Channel the event lives in.
    pub channel_id: String,
    /// Name.
    pub name: String,
    /// Markdown description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// ISO 8601 start time.
    pub starts_at: String,
    /// Duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Only visible to invited members.
    #[serde(default)]
    pub is_private: bool,
    /// ISO 8601 creation time.
    pub created_at: String,
    /// Author user id.
    pub created_by: String,
}
