use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future::{AbortHandle, Abortable};
use serde::de::DeserializeOwned;
use url::Url;

use crate::dispatch::{DispatchStats, Dispatcher};
use crate::errors::{BuildError, ConnectError, RegistryError, Result};
use crate::events::hub::{EventHub, EventStream, Subscription};
use crate::events::registry::EventRegistry;
use crate::events::standard::StandardEvents;
use crate::events::EventKey;
use crate::models::BotUser;
use crate::readiness::Readiness;
use crate::rest::GuildedHttpClient;
use crate::sdk_log;
use crate::transport::{
    DisconnectReason, Transport, TransportSignal, WebSocketConfig, WebSocketTransport,
};

/// Outcome of one connection attempt, as delivered by [`GuildedClient::connected`].
///
/// Reconnects performed by the transport are reported as `Ok(())` too.
pub type ConnectOutcome = std::result::Result<(), ConnectError>;

type RegistryHook = Box<dyn FnOnce(&mut EventRegistry) -> std::result::Result<(), RegistryError> + Send>;

/// Configures a [`GuildedClient`] before construction.
///
/// A client needs either a bot token (the gateway is then reached over
/// [`WebSocketTransport`] and the REST client is available) or an explicit
/// [`Transport`].
///
/// # Defaults
/// - Gateway: [`crate::transport::DEFAULT_GATEWAY_URL`] with [`WebSocketConfig::default`]
/// - REST base: [`crate::DEFAULT_API_URL`]
///
/// # Example
/// ```no_run
/// # async fn run() -> guilded::Result<()> {
/// use guilded::GuildedClient;
///
/// let client = GuildedClient::builder().token("gapi_...").build()?;
/// let mut messages = client.message_created();
/// client.connect().await?;
///
/// while let Some(event) = messages.recv().await {
///     println!("{:?}", event.message.content);
/// }
/// # Ok(()) }
/// ```
#[derive(Default)]
#[must_use]
pub struct GuildedClientBuilder {
    token: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    websocket: Option<WebSocketConfig>,
    api_url: Option<Url>,
    request_timeout: Option<Duration>,
    user_agent_extra: Option<String>,
    registry_hooks: Vec<RegistryHook>,
}

impl fmt::Debug for GuildedClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuildedClientBuilder")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("transport", &self.transport)
            .field("websocket", &self.websocket)
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent_extra", &self.user_agent_extra)
            .field("registry_hooks", &self.registry_hooks.len())
            .finish()
    }
}

impl GuildedClientBuilder {
    /// Bot token for both the gateway and REST.
    pub fn token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Use `transport` instead of the default websocket.
    pub fn transport<T: Transport>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Websocket settings. Ignored when an explicit transport is set.
    pub fn websocket(mut self, config: WebSocketConfig) -> Self {
        self.websocket = Some(config);
        self
    }

    /// Override the REST API base.
    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Set REST request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Append an extra user-agent segment to REST requests.
    pub fn user_agent_extra<S: Into<String>>(mut self, extra: S) -> Self {
        self.user_agent_extra = Some(extra.into());
        self
    }

    /// Add entries to the event registry after the built-in ones.
    ///
    /// ```
    /// # use serde::Deserialize;
    /// # use guilded::{GuildedClient, transport::MemoryTransport};
    /// #[derive(Debug, Clone, Deserialize)]
    /// struct ReactionAdded {
    ///     #[serde(rename = "serverId")]
    ///     server_id: String,
    /// }
    ///
    /// let (transport, _feed) = MemoryTransport::new();
    /// let client = GuildedClient::builder()
    ///     .transport(transport)
    ///     .configure_registry(|registry| {
    ///         registry.register::<ReactionAdded>("ChannelMessageReactionCreated")?;
    ///         Ok(())
    ///     })
    ///     .build()?;
    /// assert!(client.subscribe::<ReactionAdded>("ChannelMessageReactionCreated").is_some());
    /// # Ok::<_, guilded::BuildError>(())
    /// ```
    pub fn configure_registry<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&mut EventRegistry) -> std::result::Result<(), RegistryError> + Send + 'static,
    {
        self.registry_hooks.push(Box::new(hook));
        self
    }

    /// Build [`GuildedClient`].
    ///
    /// # Errors
    /// - [`BuildError::Config`] with neither a token nor a transport
    /// - [`BuildError::Registry`] when a custom entry collides with another key
    /// - [`BuildError::Http`] if the REST client cannot be built
    pub fn build(self) -> std::result::Result<GuildedClient, BuildError> {
        let transport: Arc<dyn Transport> = match (self.transport, &self.token) {
            (Some(transport), _) => transport,
            (None, Some(token)) => Arc::new(WebSocketTransport::new(
                token.clone(),
                self.websocket.unwrap_or_default(),
            )),
            (None, None) => {
                return Err(BuildError::Config(
                    "either a bot token or a transport is required".into(),
                ));
            }
        };

        let http = match self.token {
            Some(token) => {
                let mut builder = GuildedHttpClient::builder().token(token);
                if let Some(url) = self.api_url {
                    builder = builder.base_url(url);
                }
                if let Some(timeout) = self.request_timeout {
                    builder = builder.request_timeout(timeout);
                }
                if let Some(extra) = self.user_agent_extra {
                    builder = builder.user_agent_extra(extra);
                }
                Some(builder.build()?)
            }
            None => None,
        };

        let readiness = Arc::new(Readiness::new());
        let mut registry = EventRegistry::new();
        let events = StandardEvents::register(&mut registry, &readiness)?;
        for hook in self.registry_hooks {
            hook(&mut registry)?;
        }
        sdk_log!(debug, "Event registry built with {} entries", registry.len());

        Ok(GuildedClient {
            inner: Arc::new(ClientInner {
                transport,
                dispatcher: Dispatcher::new(Arc::new(registry)),
                events,
                readiness,
                connected: EventHub::new(),
                disconnected: EventHub::new(),
                session: tokio::sync::Mutex::new(None),
                http,
            }),
        })
    }
}

/// Facade over one gateway connection.
///
/// Cheap to clone; clones share the connection, the registry and readiness.
/// Subscribe to the streams you need before calling [`connect`](Self::connect):
/// streams never replay earlier events.
#[derive(Clone, Debug)]
pub struct GuildedClient {
    pub(crate) inner: Arc<ClientInner>,
}

#[derive(Debug)]
pub(crate) struct ClientInner {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    pub(crate) events: StandardEvents,
    readiness: Arc<Readiness>,
    connected: EventHub<ConnectOutcome>,
    disconnected: EventHub<DisconnectReason>,
    session: tokio::sync::Mutex<Option<Session>>,
    http: Option<GuildedHttpClient>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.abort.abort();
        }
    }
}

#[derive(Debug)]
struct Session {
    abort: AbortHandle,
    finished: Arc<AtomicBool>,
}

/// What the dispatch task needs, without a handle back to the client.
struct SessionContext {
    dispatcher: Dispatcher,
    readiness: Arc<Readiness>,
    connected: EventHub<ConnectOutcome>,
    disconnected: EventHub<DisconnectReason>,
}

impl GuildedClient {
    /// Returns a builder to edit settings before creating [`GuildedClient`].
    pub fn builder() -> GuildedClientBuilder {
        GuildedClientBuilder::default()
    }

    /// Client for `token` with default settings.
    pub fn new<S: Into<String>>(token: S) -> std::result::Result<GuildedClient, BuildError> {
        Self::builder().token(token).build()
    }

    /// Open the gateway and start dispatching.
    ///
    /// A transport failure is reported twice: it is published as `Err` on
    /// [`connected`](Self::connected) and also returned here. A success is
    /// published as `Ok(())`. `AlreadyConnected` and `ShutDown` are only
    /// returned, since no connection was attempted. A failed attempt leaves
    /// the client unprepared; call `connect` again to retry.
    ///
    /// # Errors
    /// - [`ConnectError::Transport`] when the transport fails to open
    /// - [`ConnectError::AlreadyConnected`] while a connection is running
    /// - [`ConnectError::ShutDown`] after [`shutdown`](Self::shutdown)
    pub async fn connect(&self) -> Result<()> {
        let inner = &self.inner;
        let mut session = inner.session.lock().await;

        if inner.readiness.is_shut_down() {
            return Err(ConnectError::ShutDown.into());
        }
        if session
            .as_ref()
            .is_some_and(|running| !running.finished.load(Ordering::Acquire))
        {
            return Err(ConnectError::AlreadyConnected.into());
        }

        let signals = match inner.transport.connect().await {
            Ok(signals) => signals,
            Err(e) => {
                let error = ConnectError::from(e);
                sdk_log!(error, "Gateway connection failed: {}", error);
                inner.connected.publish(Err(error.clone()));
                return Err(error.into());
            }
        };

        sdk_log!(info, "Gateway connected");
        inner.connected.publish(Ok(()));

        let finished = Arc::new(AtomicBool::new(false));
        let context = SessionContext {
            dispatcher: inner.dispatcher.clone(),
            readiness: Arc::clone(&inner.readiness),
            connected: inner.connected.clone(),
            disconnected: inner.disconnected.clone(),
        };
        let (abort, registration) = AbortHandle::new_pair();
        tokio::spawn(Abortable::new(
            run_session(context, signals, Arc::clone(&finished)),
            registration,
        ));
        *session = Some(Session { abort, finished });

        Ok(())
    }

    /// Stop dispatching, close the transport and end every stream.
    ///
    /// Terminal: later `connect` calls fail with [`ConnectError::ShutDown`].
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        let mut session = inner.session.lock().await;
        if inner.readiness.is_shut_down() {
            return;
        }

        inner.readiness.shutdown();
        if let Some(running) = session.take() {
            running.abort.abort();
        }
        inner.transport.close().await;

        inner.dispatcher.registry().close_all();
        inner.connected.close();
        inner.disconnected.close();
        sdk_log!(info, "Client shut down");
    }

    /// Stream of the registry entry for `key`.
    ///
    /// `None` if `key` is not registered or carries a payload type other than `T`.
    pub fn subscribe<T>(&self, key: impl Into<EventKey>) -> Option<EventStream<T>>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        self.hub::<T>(key).map(|hub| hub.subscribe())
    }

    /// Run `callback` for every event of `key` on its own task.
    ///
    /// A panic inside `callback` is logged and does not affect other subscribers.
    /// Must be called within a tokio runtime.
    pub fn subscribe_with<T, F>(&self, key: impl Into<EventKey>, callback: F) -> Option<Subscription>
    where
        T: DeserializeOwned + Clone + Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        self.hub::<T>(key).map(|hub| hub.subscribe_with(callback))
    }

    fn hub<T>(&self, key: impl Into<EventKey>) -> Option<EventHub<T>>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        self.inner.dispatcher.registry().hub::<T>(&key.into())
    }

    /// The registry frames are resolved against.
    pub fn registry(&self) -> &EventRegistry {
        self.inner.dispatcher.registry()
    }

    /// Stream of connection outcomes, including transport reconnects.
    pub fn connected(&self) -> EventStream<ConnectOutcome> {
        self.inner.connected.subscribe()
    }

    /// Stream of disconnects reported by the transport.
    pub fn disconnected(&self) -> EventStream<DisconnectReason> {
        self.inner.disconnected.subscribe()
    }

    /// Stream yielding the bot identity each time the client becomes prepared.
    pub fn prepared(&self) -> EventStream<BotUser> {
        self.inner.readiness.prepared()
    }

    /// Whether the welcome handshake completed on the current connection.
    pub fn is_prepared(&self) -> bool {
        self.inner.readiness.is_prepared()
    }

    /// The bot identity from the latest welcome.
    pub fn current_user(&self) -> Option<BotUser> {
        self.inner.readiness.current_user()
    }

    /// Resolve once prepared; `None` if the client shuts down first.
    pub async fn wait_prepared(&self) -> Option<BotUser> {
        self.inner.readiness.wait_prepared().await
    }

    /// Frames published, ignored and dropped so far.
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.inner.dispatcher.stats()
    }

    /// REST client, available when the client was built with a token.
    pub fn http(&self) -> Option<&GuildedHttpClient> {
        self.inner.http.as_ref()
    }
}

/// Marks the session finished however the task ends, so a dead task never
/// blocks the next `connect`.
struct FinishGuard(Arc<AtomicBool>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

async fn run_session(
    context: SessionContext,
    signals: flume::Receiver<TransportSignal>,
    finished: Arc<AtomicBool>,
) {
    let _guard = FinishGuard(Arc::clone(&finished));
    let mut reported_disconnect = false;

    while let Ok(signal) = signals.recv_async().await {
        reported_disconnect = false;
        match signal {
            TransportSignal::Connected => {
                sdk_log!(info, "Gateway reconnected");
                context.connected.publish(Ok(()));
            }
            TransportSignal::Message(text) => {
                context.dispatcher.handle_text(&text);
            }
            TransportSignal::Disconnected(reason) => {
                context.readiness.on_disconnect(&reason);
                context.disconnected.publish(reason);
                reported_disconnect = true;
            }
        }
    }

    finished.store(true, Ordering::Release);
    if !reported_disconnect && !context.readiness.is_shut_down() {
        let reason = DisconnectReason::ConnectionLost("transport ended".into());
        context.readiness.on_disconnect(&reason);
        context.disconnected.publish(reason);
    }
    sdk_log!(info, "Gateway session ended");
}
