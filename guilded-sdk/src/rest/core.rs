use std::fmt::Debug;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::{BuildError, RequestError, Result};
use crate::sdk_log;
use crate::util::{check_http_status, take_property};

/// Default REST API base.
pub const DEFAULT_API_URL: &str = "https://www.guilded.gg/api/v1/";

const DEFAULT_USER_AGENT: &str = concat!("guilded-rs", "@", env!("CARGO_PKG_VERSION"),);

#[derive(Clone, Default)]
#[must_use]
/// Configures a [`GuildedHttpClient`] before construction.
///
/// # Defaults
/// - Base URL: [`DEFAULT_API_URL`]
/// - HTTP request timeout: reqwest default (no global timeout) unless set via
///   [`Self::request_timeout`]
/// - User-agent: `guilded-rs@<crate-version>` plus any [`Self::user_agent_extra`]
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// # use guilded::GuildedHttpClient;
/// let client = GuildedHttpClient::builder()
///     .token("gapi_...")
///     .request_timeout(Duration::from_secs(10))
///     .user_agent_extra("mybot/1.2.3")
///     .build()?;
/// # Ok::<_, guilded::BuildError>(())
/// ```
pub struct GuildedHttpClientBuilder {
    token: Option<String>,
    base_url: Option<Url>,
    http_request_timeout: Option<Duration>,

    /// Optional user-agent segment appended to the default UA.
    user_agent_extra: Option<String>,
}

impl Debug for GuildedHttpClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildedHttpClientBuilder")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("http_request_timeout", &self.http_request_timeout)
            .field("user_agent_extra", &self.user_agent_extra)
            .finish()
    }
}

impl GuildedHttpClientBuilder {
    /// Bot token sent as `Authorization: Bearer <token>`.
    pub fn token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the API base (tests, proxies). A trailing slash is added if missing.
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set HTTP requests timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.http_request_timeout = Some(timeout);
        self
    }

    /// Append an extra user-agent segment after the default `guilded-rs@<version>`.
    pub fn user_agent_extra<S: Into<String>>(mut self, extra: S) -> Self {
        self.user_agent_extra = Some(extra.into());
        self
    }

    /// Build [`GuildedHttpClient`].
    ///
    /// # Errors
    /// [`BuildError::Config`] without a token or with a token that is not a
    /// valid header value; [`BuildError::Http`] if reqwest rejects the settings.
    pub fn build(self) -> std::result::Result<GuildedHttpClient, BuildError> {
        let token = self
            .token
            .ok_or_else(|| BuildError::Config("a bot token is required".into()))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_err| BuildError::Config("token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        // Compose user agent with optional extra part.
        let user_agent = match &self.user_agent_extra {
            Some(extra) if !extra.trim().is_empty() => {
                format!("{DEFAULT_USER_AGENT} {}", extra.trim())
            }
            _ => DEFAULT_USER_AGENT.to_string(),
        };

        let mut http_builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers);
        if let Some(timeout) = self.http_request_timeout {
            http_builder = http_builder.timeout(timeout);
        }

        let mut base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL).expect("Always valid"),
        };
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(GuildedHttpClient {
            http: http_builder.build()?,
            base_url,
        })
    }
}

/// REST client for the bot API.
///
/// Stateless and cheap to clone. Every endpoint method builds a URL, optionally
/// serializes a body, executes the request and deserializes one named property
/// of the response. There is no retry and no rate limiting.
///
/// ```no_run
/// # use guilded::{GuildedHttpClient, Result};
/// # async fn run() -> Result<()> {
/// let client = GuildedHttpClient::new("gapi_...")?;
/// let message = client
///     .create_message("d2f8b2b4-7f4f-4a5c-8d60-2f1bde2e2a3d", "Hello!")
///     .await?;
/// println!("sent {}", message.id);
/// # Ok(()) }
/// ```
#[derive(Clone, Debug)]
pub struct GuildedHttpClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: Url,
}

impl GuildedHttpClient {
    /// Client with default settings for `token`.
    pub fn new<S: Into<String>>(token: S) -> std::result::Result<GuildedHttpClient, BuildError> {
        Self::builder().token(token).build()
    }

    /// Returns a builder to edit settings before creating [`GuildedHttpClient`].
    pub fn builder() -> GuildedHttpClientBuilder {
        GuildedHttpClientBuilder::default()
    }

    /// The API base all paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Execute a request against `path` (relative to the base) and return the raw JSON body.
    ///
    /// `204 No Content` yields `Value::Null`.
    ///
    /// # Errors
    /// - [`RequestError::Server`] for non-2xx responses
    /// - [`RequestError::Transport`] for network failures
    /// - [`RequestError::DecodeJson`] when the body is not JSON
    pub async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<serde_json::Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.base_url.join(path)?;
        sdk_log!(debug, "{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = check_http_status(request.send().await?).await?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(serde_json::Value::Null);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute and decode the `property` field of the response into `T`.
    pub(crate) async fn fetch<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        property: &str,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.execute(method, path, body).await?;
        Ok(serde_json::from_value(take_property(body, property)?)?)
    }

    /// Execute a request whose response body is irrelevant.
    pub(crate) async fn send(&self, method: Method, path: &str) -> Result<()> {
        self.execute::<()>(method, path, None).await?;
        Ok(())
    }
}

/// Reject empty ids before they turn into a different route.
pub(crate) fn require_id(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() || value.contains('/') {
        return Err(RequestError::Validation {
            message: format!("`{name}` must be a non-empty id without `/`"),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::errors::Error;

    fn client(server: &MockServer) -> GuildedHttpClient {
        GuildedHttpClient::builder()
            .token("test-token")
            .base_url(Url::parse(&server.url("/api/v1")).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn token_is_required() {
        let err = GuildedHttpClient::builder().build().unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = GuildedHttpClient::builder()
            .token("t")
            .base_url(Url::parse("http://localhost:1/api/v1").unwrap())
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:1/api/v1/");
    }

    #[test]
    fn builder_debug_redacts_token() {
        let builder = GuildedHttpClient::builder().token("very-secret");
        assert!(!format!("{builder:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn execute_sends_auth_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/things")
                    .header("authorization", "Bearer test-token")
                    .json_body(json!({"name": "x"}));
                then.status(201).json_body(json!({"thing": {"name": "x"}}));
            })
            .await;

        let body = client(&server)
            .execute(Method::POST, "things", Some(&json!({"name": "x"})))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, json!({"thing": {"name": "x"}}));
    }

    #[tokio::test]
    async fn server_errors_keep_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/missing");
                then.status(404).body("{\"code\":\"NotFound\"}");
            })
            .await;

        let err = client(&server)
            .execute::<()>(Method::GET, "missing", None)
            .await
            .unwrap_err();

        match err {
            Error::Request(RequestError::Server { status, message }) => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(message.contains("NotFound"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_content_is_null() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/v1/things/1");
                then.status(204);
            })
            .await;

        let body = client(&server)
            .execute::<()>(Method::DELETE, "things/1", None)
            .await
            .unwrap();
        assert_eq!(body, serde_json::Value::Null);
    }

    #[test]
    fn ids_are_validated() {
        assert!(require_id("channel_id", "abc").is_ok());
        assert!(require_id("channel_id", "").is_err());
        assert!(require_id("channel_id", "a/b").is_err());
    }
}
