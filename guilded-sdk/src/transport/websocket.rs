use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, HeaderName};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::{DisconnectReason, Transport, TransportSignal};
use crate::errors::TransportError;
use crate::sdk_log;

/// Default gateway endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "wss://www.guilded.gg/websocket/v1";

const LAST_MESSAGE_ID_HEADER: &str = "guilded-last-message-id";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Settings of a [`WebSocketTransport`].
///
/// # Defaults
/// - URL: [`DEFAULT_GATEWAY_URL`]
/// - Ping every 22.5 s (the gateway's advertised heartbeat interval)
/// - Idle timeout: 45 s without any inbound frame
/// - Reconnect backoff: 1 s doubling up to 60 s, unlimited attempts
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    /// Gateway address.
    pub url: Url,
    /// How often a ping is sent.
    pub ping_interval: Duration,
    /// How long the socket may stay silent before it counts as dead.
    pub idle_timeout: Duration,
    /// First reconnect delay.
    pub reconnect_delay: Duration,
    /// Reconnect delay cap.
    pub max_reconnect_delay: Duration,
    /// Give up after this many failed reconnects. `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_GATEWAY_URL).expect("Always valid"),
            ping_interval: Duration::from_millis(22_500),
            idle_timeout: Duration::from_secs(45),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            max_reconnect_attempts: None,
        }
    }
}

/// Gateway transport over `tokio-tungstenite`.
///
/// Owns heartbeats and reconnection: after a drop it reopens the socket with
/// `guilded-last-message-id` set so the server replays what was missed.
pub struct WebSocketTransport {
    token: String,
    config: WebSocketConfig,
    stop: Mutex<Option<flume::Sender<()>>>,
}

impl fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("token", &"<redacted>")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WebSocketTransport {
    /// Transport authenticating with the bot `token`.
    pub fn new(token: impl Into<String>, config: WebSocketConfig) -> Self {
        Self {
            token: token.into(),
            config,
            stop: Mutex::new(None),
        }
    }

    /// Active settings.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self) -> Result<flume::Receiver<TransportSignal>, TransportError> {
        let socket = open(&self.token, &self.config, None).await?;
        sdk_log!(info, "Gateway socket open at {}", self.config.url);

        let (signals_tx, signals_rx) = flume::unbounded();
        let (stop_tx, stop_rx) = flume::bounded(1);

        // Replacing a previous stop sender ends that connection's loop.
        *self.stop.lock().unwrap_or_else(PoisonError::into_inner) = Some(stop_tx);

        tokio::spawn(run(
            socket,
            self.token.clone(),
            self.config.clone(),
            signals_tx,
            stop_rx,
        ));

        Ok(signals_rx)
    }

    async fn close(&self) {
        let stop = self
            .stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(stop) = stop {
            let _ = stop.try_send(());
        }
    }
}

/// How one socket's read loop ended.
enum Pump {
    Stopped,
    Dropped(DisconnectReason),
}

async fn run(
    mut socket: Socket,
    token: String,
    config: WebSocketConfig,
    signals: flume::Sender<TransportSignal>,
    stop: flume::Receiver<()>,
) {
    let mut last_message_id = None;

    loop {
        let reason = match pump(&mut socket, &config, &signals, &stop, &mut last_message_id).await {
            Pump::Stopped => {
                let _ = socket.close(None).await;
                sdk_log!(info, "Gateway socket closed");
                return;
            }
            Pump::Dropped(reason) => reason,
        };

        sdk_log!(warn, "Gateway socket dropped: {}", reason);
        if signals
            .send(TransportSignal::Disconnected(reason))
            .is_err()
        {
            return;
        }

        match reconnect(&token, &config, last_message_id.as_deref(), &stop).await {
            Some(reopened) => {
                socket = reopened;
                if signals.send(TransportSignal::Connected).is_err() {
                    return;
                }
            }
            None => return,
        }
    }
}

async fn pump(
    socket: &mut Socket,
    config: &WebSocketConfig,
    signals: &flume::Sender<TransportSignal>,
    stop: &flume::Receiver<()>,
    last_message_id: &mut Option<String>,
) -> Pump {
    let mut ping = tokio::time::interval_at(
        Instant::now() + config.ping_interval,
        config.ping_interval,
    );
    let mut last_received = Instant::now();

    loop {
        tokio::select! {
            _ = stop.recv_async() => return Pump::Stopped,
            _ = sleep_until(last_received + config.idle_timeout) => {
                return Pump::Dropped(DisconnectReason::NoMessageReceived);
            }
            _ = ping.tick() => {
                if let Err(e) = socket.send(Message::Ping(Vec::new())).await {
                    return Pump::Dropped(DisconnectReason::ConnectionLost(e.to_string()));
                }
            }
            next = socket.next() => {
                last_received = Instant::now();
                match next {
                    None => {
                        return Pump::Dropped(DisconnectReason::ConnectionLost(
                            "stream ended".into(),
                        ));
                    }
                    Some(Err(e)) => return Pump::Dropped(classify(e)),
                    Some(Ok(Message::Text(text))) => {
                        if let Some(id) = message_id(&text) {
                            *last_message_id = Some(id);
                        }
                        if signals.send(TransportSignal::Message(text)).is_err() {
                            return Pump::Stopped;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.into_owned()))
                            .unwrap_or((1005, String::new()));
                        return Pump::Dropped(DisconnectReason::ServerClosed { code, reason });
                    }
                    // Pings are answered by tungstenite; pongs only refresh `last_received`.
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn reconnect(
    token: &str,
    config: &WebSocketConfig,
    last_message_id: Option<&str>,
    stop: &flume::Receiver<()>,
) -> Option<Socket> {
    let mut delay = config.reconnect_delay;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        tokio::select! {
            _ = stop.recv_async() => return None,
            () = sleep(delay) => {}
        }

        match open(token, config, last_message_id).await {
            Ok(socket) => {
                sdk_log!(info, "Gateway reconnected after {} attempt(s)", attempt);
                return Some(socket);
            }
            Err(e) => {
                sdk_log!(warn, "Gateway reconnect attempt {} failed: {}", attempt, e);
                if config
                    .max_reconnect_attempts
                    .is_some_and(|max| attempt >= max)
                {
                    sdk_log!(error, "Giving up on the gateway after {} attempts", attempt);
                    return None;
                }
                delay = (delay * 2).min(config.max_reconnect_delay);
            }
        }
    }
}

async fn open(
    token: &str,
    config: &WebSocketConfig,
    last_message_id: Option<&str>,
) -> Result<Socket, TransportError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| TransportError::Open(e.to_string()))?;

    let headers = request.headers_mut();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_err| TransportError::Rejected("token is not a valid header value".into()))?;
    headers.insert(AUTHORIZATION, bearer);
    if let Some(id) = last_message_id {
        if let Ok(value) = HeaderValue::from_str(id) {
            headers.insert(HeaderName::from_static(LAST_MESSAGE_ID_HEADER), value);
        }
    }

    sdk_log!(debug, "Opening gateway socket {} (resume: {:?})", config.url, last_message_id);
    match connect_async(request).await {
        Ok((socket, _response)) => Ok(socket),
        Err(tungstenite::Error::Http(response)) => Err(TransportError::Rejected(format!(
            "gateway answered HTTP {}",
            response.status()
        ))),
        Err(e) => Err(TransportError::Open(e.to_string())),
    }
}

fn classify(error: tungstenite::Error) -> DisconnectReason {
    match error {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            DisconnectReason::ConnectionLost("connection closed".into())
        }
        tungstenite::Error::Io(e) => DisconnectReason::ConnectionLost(e.to_string()),
        other => DisconnectReason::Error(other.to_string()),
    }
}

/// `s` field of an envelope, without decoding the payload.
fn message_id(text: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Sequence {
        #[serde(default)]
        s: Option<String>,
    }

    serde_json::from_str::<Sequence>(text).ok()?.s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_message_id_only() {
        assert_eq!(
            message_id(r#"{"op":0,"t":"X","s":"m-1","d":{"huge":[1,2,3]}}"#),
            Some("m-1".into())
        );
        assert_eq!(message_id(r#"{"op":1,"d":{}}"#), None);
        assert_eq!(message_id("not json"), None);
    }

    #[test]
    fn io_errors_are_connection_losses() {
        let err = tungstenite::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset));
        assert!(matches!(classify(err), DisconnectReason::ConnectionLost(_)));
        assert!(!classify(tungstenite::Error::ConnectionClosed).is_resumable());
    }

    #[test]
    fn debug_redacts_token() {
        let transport = WebSocketTransport::new("secret-token", WebSocketConfig::default());
        let debug = format!("{transport:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("redacted"));
    }

    #[tokio::test]
    async fn unreachable_gateway_fails_to_connect() {
        let config = WebSocketConfig {
            url: Url::parse("ws://127.0.0.1:9/").unwrap(),
            ..WebSocketConfig::default()
        };
        let transport = WebSocketTransport::new("t", config);

        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, TransportError::Open(_)), "Got: {err:?}");
    }
}
