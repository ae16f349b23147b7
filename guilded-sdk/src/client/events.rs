use super::core::GuildedClient;
use crate::events::hub::EventStream;
use crate::events::payloads::{
    CalendarEventEvent, DocEvent, MemberJoinedEvent, MemberRemovedEvent, MessageDeletedEvent,
    MessageEvent, Resume, TopicEvent, Welcome,
};

// One subscribing accessor per built-in hub.
macro_rules! event_accessors {
    ($($(#[$doc:meta])* $name:ident => $payload:ty;)*) => {
        impl GuildedClient {
            $(
                $(#[$doc])*
                pub fn $name(&self) -> EventStream<$payload> {
                    self.inner.events.$name.subscribe()
                }
            )*
        }
    };
}

event_accessors! {
    /// Welcome handshakes (opcode 1). Readiness is already updated when one arrives.
    welcome => Welcome;
    /// End of a resume replay (opcode 2).
    resume => Resume;
    /// `ChatMessageCreated`.
    message_created => MessageEvent;
    /// `ChatMessageUpdated`.
    message_updated => MessageEvent;
    /// `ChatMessageDeleted`.
    message_deleted => MessageDeletedEvent;
    /// `ServerMemberJoined`. The member carries the event's server id.
    member_joined => MemberJoinedEvent;
    /// `ServerMemberRemoved`.
    member_removed => MemberRemovedEvent;
    /// `DocCreated`.
    doc_created => DocEvent;
    /// `DocUpdated`.
    doc_updated => DocEvent;
    /// `DocDeleted`.
    doc_deleted => DocEvent;
    /// `ForumTopicCreated`.
    topic_created => TopicEvent;
    /// `ForumTopicUpdated`.
    topic_updated => TopicEvent;
    /// `ForumTopicDeleted`.
    topic_deleted => TopicEvent;
    /// `CalendarEventCreated`.
    calendar_event_created => CalendarEventEvent;
    /// `CalendarEventUpdated`.
    calendar_event_updated => CalendarEventEvent;
    /// `CalendarEventDeleted`.
    calendar_event_deleted => CalendarEventEvent;
}
