use reqwest::Method;

use super::core::{GuildedHttpClient, require_id};
use crate::errors::Result;
use crate::models::ServerMember;

impl GuildedHttpClient {
    /// Fetch a member of `server_id`.
    ///
    /// The response omits the server id; it is filled in from the request.
    pub async fn get_member(&self, server_id: &str, user_id: &str) -> Result<ServerMember> {
        require_id("server_id", server_id)?;
        require_id("user_id", user_id)?;
        let path = format!("servers/{server_id}/members/{user_id}");

        let mut member = self.execute::<()>(Method::GET, &path, None).await?;
        if let Some(object) = member
            .get_mut("member")
            .and_then(serde_json::Value::as_object_mut)
        {
            object
                .entry("serverId")
                .or_insert_with(|| serde_json::Value::String(server_id.to_owned()));
        }
        Ok(serde_json::from_value(crate::util::take_property(
            member, "member",
        )?)?)
    }
}
