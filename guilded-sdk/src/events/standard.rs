//! The built-in event table and typed handles to its hubs.

use std::sync::Arc;

use super::hub::EventHub;
use super::names;
use super::opcode;
use super::payloads::{
    CalendarEventEvent, DocEvent, MemberJoinedEvent, MemberRemovedEvent, MessageDeletedEvent,
    MessageEvent, Resume, TopicEvent, Welcome,
};
use super::registry::{EventRegistry, TypedDescriptor};
use super::transforms;
use crate::errors::RegistryError;
use crate::readiness::Readiness;

/// Hubs of every event the SDK registers by default.
#[derive(Debug, Clone)]
pub struct StandardEvents {
    pub(crate) welcome: EventHub<Welcome>,
    pub(crate) resume: EventHub<Resume>,
    pub(crate) message_created: EventHub<MessageEvent>,
    pub(crate) message_updated: EventHub<MessageEvent>,
    pub(crate) message_deleted: EventHub<MessageDeletedEvent>,
    pub(crate) member_joined: EventHub<MemberJoinedEvent>,
    pub(crate) member_removed: EventHub<MemberRemovedEvent>,
    pub(crate) doc_created: EventHub<DocEvent>,
    pub(crate) doc_updated: EventHub<DocEvent>,
    pub(crate) doc_deleted: EventHub<DocEvent>,
    pub(crate) topic_created: EventHub<TopicEvent>,
    pub(crate) topic_updated: EventHub<TopicEvent>,
    pub(crate) topic_deleted: EventHub<TopicEvent>,
    pub(crate) calendar_event_created: EventHub<CalendarEventEvent>,
    pub(crate) calendar_event_updated: EventHub<CalendarEventEvent>,
    pub(crate) calendar_event_deleted: EventHub<CalendarEventEvent>,
}

impl StandardEvents {
    /// Register the built-in entries into `registry`.
    ///
    /// Welcomes are reported to `readiness` before subscribers see them.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateKey`] if `registry` already holds one of the
    /// built-in keys.
    pub fn register(
        registry: &mut EventRegistry,
        readiness: &Arc<Readiness>,
    ) -> Result<Self, RegistryError> {
        let observer = Arc::clone(readiness);
        let welcome = registry.insert(
            TypedDescriptor::<Welcome>::new(opcode::WELCOME)
                .with_observer(Arc::new(move |welcome: &Welcome| observer.on_welcome(welcome))),
        )?;

        Ok(Self {
            welcome,
            resume: registry.register(opcode::RESUME)?,
            message_created: registry.register(names::CHAT_MESSAGE_CREATED)?,
            message_updated: registry.register(names::CHAT_MESSAGE_UPDATED)?,
            message_deleted: registry.register(names::CHAT_MESSAGE_DELETED)?,
            member_joined: registry
                .register_with(names::SERVER_MEMBER_JOINED, transforms::member_joined())?,
            member_removed: registry.register(names::SERVER_MEMBER_REMOVED)?,
            doc_created: registry.register(names::DOC_CREATED)?,
            doc_updated: registry.register(names::DOC_UPDATED)?,
            doc_deleted: registry.register(names::DOC_DELETED)?,
            topic_created: registry.register(names::FORUM_TOPIC_CREATED)?,
            topic_updated: registry.register(names::FORUM_TOPIC_UPDATED)?,
            topic_deleted: registry.register(names::FORUM_TOPIC_DELETED)?,
            calendar_event_created: registry.register(names::CALENDAR_EVENT_CREATED)?,
            calendar_event_updated: registry.register(names::CALENDAR_EVENT_UPDATED)?,
            calendar_event_deleted: registry.register(names::CALENDAR_EVENT_DELETED)?,
        })
    }
}
