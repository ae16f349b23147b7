use reqwest::Method;
use serde::Serialize;

use super::core::{GuildedHttpClient, require_id};
use crate::errors::Result;
use crate::models::Doc;

/// Body of a new or replaced doc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewDoc {
    /// Title.
    pub title: String,
    /// Markdown body.
    pub content: String,
}

impl NewDoc {
    /// Doc with `title` and `content`.
    pub fn new<T: Into<String>, C: Into<String>>(title: T, content: C) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

impl GuildedHttpClient {
    /// Fetch one doc.
    pub async fn get_doc(&self, channel_id: &str, doc_id: u64) -> Result<Doc> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/docs/{doc_id}");
        self.fetch::<(), _>(Method::GET, &path, None, "doc").await
    }

    /// Create a doc in `channel_id`.
    pub async fn create_doc(&self, channel_id: &str, doc: &NewDoc) -> Result<Doc> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/docs");
        self.fetch(Method::POST, &path, Some(doc), "doc").await
    }

    /// Replace a doc's title and content.
    pub async fn update_doc(&self, channel_id: &str, doc_id: u64, doc: &NewDoc) -> Result<Doc> {
        require_id("channel_id", channel_id)?;
        let path = format!("channels/{channel_id}/docs/{doc_id}");
        self.fetch(Method::PUT, &path, Some(doc), "doc").await
    }

    /// Delete a doc.
    pub async fn delete_doc(&self, channel_id: &str, doc_id: u64) -> Result<()> {
        require_id("channel_id", channel_id)?;
        self.send(Method::DELETE, &format!("channels/{channel_id}/docs/{doc_id}"))
            .await
    }
}
