use serde::{Deserialize, Serialize};

/// The bot's own identity, delivered by the welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotUser {
    /// User id of the bot account.
    pub id: String,
    /// Bot id (distinct from the user id).
    pub bot_id: String,
    /// Display name.
    pub name: String,
    /// User id of the bot's owner.
    pub created_by: String,
    /// ISO 8601 creation time.
    pub created_at: String,
}

/// Kind of account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Regular account.
    #[default]
    User,
    /// Bot account.
    Bot,
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id.
    pub id: String,
    /// Account kind; absent means `user`.
    #[serde(rename = "type", default)]
    pub user_type: UserType,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// ISO 8601 creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A user's membership in one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMember {
    /// Server the membership belongs to.
    pub server_id: String,
    /// The member.
    pub user: User,
    /// Role ids held in the server.
    #[serde(default)]
    pub role_ids: Vec<u64>,
    /// Server-specific nickname.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// ISO 8601 join time.
    pub joined_at: String,
    /// Whether the member owns the server.
    #[serde(default)]
    pub is_owner: bool,
}
