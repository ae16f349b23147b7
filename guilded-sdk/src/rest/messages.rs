use reqwest::Method;
use serde::Serialize;

use super::core::{GuildedHttpClient, require_id};
use crate::errors::Result;
use crate::models::ChatMessage;

/// Body of a new chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Markdown content.
    pub content: String,
    /// Only visible to mentioned users.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_private: bool,
    /// Do not notify mentions.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_silent: bool,
    /// Messages this one replies to.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_message_ids: Vec<String>,
}

impl NewMessage {
    /// Mark the message as a reply to `message_id`.
    #[must_use]
    pub fn reply_to<S: Into<String>>(mut self, message_id: S) -> Self {
        self.reply_message_ids.push(message_id.into());
        self
    }
}

impl From<&str> for NewMessage {
    fn from(content: &str) -> Self {
        Self {
            content: content.to_owned(),
            ..Self::default()
        }
    }
}

impl From<String> for NewMessage {
    fn from(content: String) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

impl GuildedHttpClient {
    /// Fetch one message.
    pub async fn get_message(&self, channel_id: &str, message_id: &str) -> Result<ChatMessage> {
        require_id("channel_id", channel_id)?;
        require_id("message_id", message_id)?;
        let path = format!("channels/{channel_id}/messages/{message_id}");
        self.fetch::<(), _>(Method::GET, &path, None, "message")
            .await
    }

    /// Post a message in `channel_id`.
    pub async fn create_message(
        &self,
        channel_id: &str,
        message: impl Into<NewMessage>,
    ) -> Result<ChatMessage> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/messages");
        self.fetch(Method::POST, &path, Some(&message.into()), "message")
            .await
    }

    /// Replace the content of a message the bot authored.
    pub async fn update_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<ChatMessage> {
        require_id("channel_id", channel_id)?;
        require_id("message_id", message_id)?;
        let path = format!("channels/{channel_id}/messages/{message_id}");
        self.fetch(Method::PUT, &path, Some(&ContentBody { content }), "message")
            .await
    }

    /// Delete a message.
    pub async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        require_id("channel_id", channel_id)?;
        require_id("message_id", message_id)?;
        self.send(
            Method::DELETE,
            &format!("channels/{channel_id}/messages/{message_id}"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::errors::{Error, RequestError};

    fn message_json(content: &str) -> serde_json::Value {
        json!({
            "id": "m1",
            "type": "default",
            "serverId": "s1",
            "channelId": "c1",
            "content": content,
            "createdAt": "2024-01-01T00:00:00.000Z",
            "createdBy": "u1"
        })
    }

    fn client(server: &MockServer) -> GuildedHttpClient {
        GuildedHttpClient::builder()
            .token("t")
            .base_url(Url::parse(&server.url("/api/v1/")).unwrap())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn create_message_posts_body_and_decodes_property() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/channels/c1/messages")
                    .json_body(json!({"content": "hi", "replyMessageIds": ["m0"]}));
                then.status(201)
                    .json_body(json!({"message": message_json("hi")}));
            })
            .await;

        let message = client(&server)
            .create_message("c1", NewMessage::from("hi").reply_to("m0"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(message.id, "m1");
        assert_eq!(message.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn update_and_delete() {
        let server = MockServer::start_async().await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/api/v1/channels/c1/messages/m1")
                    .json_body(json!({"content": "edited"}));
                then.status(200)
                    .json_body(json!({"message": message_json("edited")}));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/v1/channels/c1/messages/m1");
                then.status(204);
            })
            .await;

        let client = client(&server);
        let message = client.update_message("c1", "m1", "edited").await.unwrap();
        assert_eq!(message.content.as_deref(), Some("edited"));
        client.delete_message("c1", "m1").await.unwrap();

        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn empty_ids_never_reach_the_server() {
        let server = MockServer::start_async().await;
        let err = client(&server).get_message("c1", "").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Request(RequestError::Validation { .. })
        ));
    }
}
