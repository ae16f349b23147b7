use reqwest::Method;
use serde::Serialize;

use super::core::{GuildedHttpClient, require_id};
use crate::errors::Result;
use crate::models::CalendarEvent;

/// Body of a new calendar event. Unset fields are left to server defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    /// Name.
    pub name: String,
    /// Markdown description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// ISO 8601 start time; the server defaults to now.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    /// Duration in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Only visible to invited members.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_private: bool,
}

impl GuildedHttpClient {
    /// Fetch one calendar event.
    pub async fn get_calendar_event(
        &self,
        channel_id: &str,
        event_id: u64,
    ) -> Result<CalendarEvent> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/events/{event_id}");
        self.fetch::<(), _>(Method::GET, &path, None, "calendarEvent")
            .await
    }

    /// Create a calendar event in `channel_id`.
    pub async fn create_calendar_event(
        &self,
        channel_id: &str,
        event: &NewCalendarEvent,
    ) -> Result<CalendarEvent> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/events");
        self.fetch(Method::POST, &path, Some(event), "calendarEvent")
            .await
    }

    /// Delete a calendar event.
    pub async fn delete_calendar_event(&self, channel_id: &str, event_id: u64) -> Result<()> {
        require_id("channel_id", channel_id)?;
        self.send(
            Method::DELETE,
            &format!("channels/{channel_id}/events/{event_id}"),
        )
        .await
    }
}
