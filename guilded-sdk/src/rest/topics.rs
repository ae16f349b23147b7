use reqwest::Method;
use serde::Serialize;

use super::core::{GuildedHttpClient, require_id};
use crate::errors::Result;
use crate::models::ForumTopic;

/// Body of a new forum topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewTopic {
    /// Title.
    pub title: String,
    /// Markdown body.
    pub content: String,
}

impl NewTopic {
    /// Topic with `title` and `content`.
    pub fn new<T: Into<String>, C: Into<String>>(title: T, content: C) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

impl GuildedHttpClient {
    /// Fetch one forum topic.
    pub async fn get_topic(&self, channel_id: &str, topic_id: u64) -> Result<ForumTopic> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/topics/{topic_id}");
        self.fetch::<(), _>(Method::GET, &path, None, "forumTopic")
            .await
    }

    /// Create a forum topic in `channel_id`.
    pub async fn create_topic(&self, channel_id: &str, topic: &NewTopic) -> Result<ForumTopic> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/topics");
        self.fetch(Method::POST, &path, Some(topic), "forumTopic")
            .await
    }

    /// Delete a forum topic.
    pub async fn delete_topic(&self, channel_id: &str, topic_id: u64) -> Result<()> {
        require_id("channel_id", channel_id)?;
        self.send(
            Method::DELETE,
            &format!("channels/{channel_id}/topics/{topic_id}"),
        )
        .await
    }
}
