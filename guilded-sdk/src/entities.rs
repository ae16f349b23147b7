//! Per-entity views over the global event streams.
//!
//! Each method subscribes anew, so call it before the events you care about
//! can arrive. Update streams stay open for the life of the client; delete
//! streams complete after the first match.

use crate::GuildedClient;
use crate::events::payloads::{CalendarEventEvent, DocEvent, MessageDeletedEvent, MessageEvent, TopicEvent};
use crate::events::scoped::{ScopedStream, filtered, first_match};
use crate::models::{CalendarEvent, ChatMessage, Doc, ForumTopic};

impl ChatMessage {
    /// Edits of this message.
    pub fn updated(&self, client: &GuildedClient) -> ScopedStream<MessageEvent> {
        let (channel_id, id) = (self.channel_id.clone(), self.id.clone());
        filtered(client.message_updated(), move |event| {
            event.message.channel_id == channel_id && event.message.id == id
        })
    }

    /// The deletion of this message.
    pub fn deleted(&self, client: &GuildedClient) -> ScopedStream<MessageDeletedEvent> {
        let (channel_id, id) = (self.channel_id.clone(), self.id.clone());
        first_match(client.message_deleted(), move |event| {
            event.message.channel_id == channel_id && event.message.id == id
        })
    }
}

// Entities whose id is only unique within a channel.
macro_rules! channel_scoped {
    ($entity:ty, $payload:ty, $field:ident, $updated:ident, $deleted:ident) => {
        impl $entity {
            /// Updates of this entity.
            pub fn updated(&self, client: &GuildedClient) -> ScopedStream<$payload> {
                let (channel_id, id) = (self.channel_id.clone(), self.id);
                filtered(client.$updated(), move |event| {
                    event.$field.channel_id == channel_id && event.$field.id == id
                })
            }

            /// The deletion of this entity.
            pub fn deleted(&self, client: &GuildedClient) -> ScopedStream<$payload> {
                let (channel_id, id) = (self.channel_id.clone(), self.id);
                first_match(client.$deleted(), move |event| {
                    event.$field.channel_id == channel_id && event.$field.id == id
                })
            }
        }
    };
}

channel_scoped!(Doc, DocEvent, doc, doc_updated, doc_deleted);
channel_scoped!(ForumTopic, TopicEvent, forum_topic, topic_updated, topic_deleted);
channel_scoped!(
    CalendarEvent,
    CalendarEventEvent,
    calendar_event,
    calendar_event_updated,
    calendar_event_deleted
);

#[cfg(test)]
mod tests {
    use futures_util::{FutureExt, StreamExt};
    use serde_json::{Value, json};
    use tokio::time::{Duration, timeout};

    use super::*;
    use crate::transport::{MemoryFeed, MemoryTransport};

    async fn connected() -> (GuildedClient, MemoryFeed) {
        let (transport, feed) = MemoryTransport::new();
        let client = GuildedClient::builder().transport(transport).build().unwrap();
        client.connect().await.unwrap();
        (client, feed)
    }

    fn message(channel_id: &str, id: &str, content: &str) -> Value {
        json!({
            "id": id,
            "serverId": "s1",
            "channelId": channel_id,
            "content": content,
            "createdAt": "2024-01-01T00:00:00.000Z",
            "createdBy": "u1"
        })
    }

    fn doc(channel_id: &str, id: u64, title: &str) -> Value {
        json!({
            "id": id,
            "serverId": "s1",
            "channelId": channel_id,
            "title": title,
            "content": "",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "createdBy": "u1"
        })
    }

    fn frame(name: &str, payload: Value) -> String {
        json!({"op": 0, "t": name, "d": payload}).to_string()
    }

    async fn next<S: futures_util::Stream + Unpin>(stream: &mut S) -> Option<S::Item> {
        timeout(Duration::from_secs(1), stream.next())
            .await
            .expect("timed out")
    }

    #[tokio::test]
    async fn message_updates_are_scoped_to_channel_and_id() {
        let (client, feed) = connected().await;
        let original: ChatMessage = serde_json::from_value(message("c1", "m1", "v1")).unwrap();
        let mut updates = original.updated(&client);
        let mut all = client.message_updated();

        for (channel, id, content) in [("c1", "m2", "x"), ("c2", "m1", "y"), ("c1", "m1", "v2")] {
            feed.message(frame(
                "ChatMessageUpdated",
                json!({"serverId": "s1", "message": message(channel, id, content)}),
            ));
        }

        let update = next(&mut updates).await.unwrap();
        assert_eq!(update.message.content.as_deref(), Some("v2"));

        // The unscoped stream saw all three, so the scoped one has nothing pending.
        for _ in 0..3 {
            next(&mut all).await.unwrap();
        }
        assert!(updates.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn message_deletion_fires_once() {
        let (client, feed) = connected().await;
        let original: ChatMessage = serde_json::from_value(message("c1", "m1", "hi")).unwrap();
        let mut deleted = original.deleted(&client);

        let deletion = json!({
            "serverId": "s1",
            "message": {
                "id": "m1",
                "channelId": "c1",
                "deletedAt": "2024-01-02T00:00:00.000Z"
            }
        });
        feed.message(frame("ChatMessageDeleted", deletion.clone()));
        feed.message(frame("ChatMessageDeleted", deletion));

        assert_eq!(next(&mut deleted).await.unwrap().message.id, "m1");
        assert!(next(&mut deleted).await.is_none());
    }

    #[tokio::test]
    async fn doc_ids_only_match_within_their_channel() {
        let (client, feed) = connected().await;
        let original: Doc = serde_json::from_value(doc("c1", 5, "Old")).unwrap();
        let mut updates = original.updated(&client);
        let mut deleted = original.deleted(&client);

        feed.message(frame("DocUpdated", json!({"serverId": "s1", "doc": doc("c2", 5, "Other")})));
        feed.message(frame("DocUpdated", json!({"serverId": "s1", "doc": doc("c1", 5, "New")})));
        feed.message(frame("DocDeleted", json!({"serverId": "s1", "doc": doc("c1", 5, "New")})));

        assert_eq!(next(&mut updates).await.unwrap().doc.title, "New");
        assert_eq!(next(&mut deleted).await.unwrap().doc.id, 5);
        assert!(next(&mut deleted).await.is_none());
    }

    #[tokio::test]
    async fn scoped_streams_end_on_shutdown() {
        let (client, _feed) = connected().await;
        let original: Doc = serde_json::from_value(doc("c1", 1, "t")).unwrap();
        let mut updates = original.updated(&client);

        client.shutdown().await;
        assert!(next(&mut updates).await.is_none());
    }
}
