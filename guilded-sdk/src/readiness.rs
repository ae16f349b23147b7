//! "Prepared" state of a client.
//!
//! A client is prepared once the gateway has sent a welcome, and stays prepared
//! until a disconnect that needs a fresh handshake. A heartbeat timeout
//! ([`DisconnectReason::NoMessageReceived`]) is recovered by resuming and does
//! not demote it.
//!
//! ```text
//!   Unprepared --welcome--> Prepared --disconnect (not NoMessageReceived)--> Unprepared
//!        ^                                                                     |
//!        +---------------------------------------------------------------------+
//! shutdown: any state --> terminal Unprepared (welcomes ignored)
//! ```
//!
//! The dispatch task and `shutdown` both write. The state lives in one atomic
//! and every transition is a compare-exchange, so a welcome that races a
//! shutdown can never leave the client prepared. The bot identity is kept in
//! an `ArcSwapOption`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use arc_swap::ArcSwapOption;

use crate::events::hub::{EventHub, EventStream};
use crate::events::payloads::Welcome;
use crate::models::BotUser;
use crate::sdk_log;
use crate::transport::DisconnectReason;

const UNPREPARED: u8 = 0;
const PREPARED: u8 = 1;
const SHUT_DOWN: u8 = 2;

/// Readiness of one client.
#[derive(Debug, Default)]
pub struct Readiness {
    state: AtomicU8,
    current_user: ArcSwapOption<BotUser>,
    prepared_hub: EventHub<BotUser>,
}

impl Readiness {
    /// A fresh, unprepared state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the welcome handshake completed and no disqualifying
    /// disconnect happened since.
    pub fn is_prepared(&self) -> bool {
        self.state.load(Ordering::Acquire) == PREPARED
    }

    /// Whether [`shutdown`](Self::shutdown) was called.
    pub fn is_shut_down(&self) -> bool {
        self.state.load(Ordering::Acquire) == SHUT_DOWN
    }

    /// The bot identity from the latest welcome.
    pub fn current_user(&self) -> Option<BotUser> {
        self.current_user.load_full().map(|user| user.as_ref().clone())
    }

    /// Stream yielding the bot identity on every Unprepared → Prepared transition.
    pub fn prepared(&self) -> EventStream<BotUser> {
        self.prepared_hub.subscribe()
    }

    /// Resolve once prepared. Returns immediately when already prepared and
    /// `None` if the client shuts down first.
    pub async fn wait_prepared(&self) -> Option<BotUser> {
        // Subscribe before checking, so a transition in between is not missed.
        let mut transitions = self.prepared();
        if self.is_prepared() {
            if let Some(user) = self.current_user() {
                return Some(user);
            }
        }
        transitions.recv().await
    }

    /// Record a welcome.
    pub fn on_welcome(&self, welcome: &Welcome) {
        if self.is_shut_down() {
            return;
        }
        // A redundant welcome overwrites the stored identity (last write wins);
        // the server gives no guarantee that it matches the previous one.
        self.current_user
            .store(Some(Arc::new(welcome.user.clone())));

        // Fails when already prepared or when a shutdown won the race.
        if self
            .state
            .compare_exchange(UNPREPARED, PREPARED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            sdk_log!(info, "Client prepared as {} ({})", welcome.user.name, welcome.user.id);
            self.prepared_hub.publish(welcome.user.clone());
        }
    }

    /// Record a disconnect.
    pub fn on_disconnect(&self, reason: &DisconnectReason) {
        if reason.is_resumable() {
            sdk_log!(debug, "Keeping prepared state across resumable disconnect");
            return;
        }
        if self
            .state
            .compare_exchange(PREPARED, UNPREPARED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            sdk_log!(info, "Client no longer prepared: {}", reason);
        }
    }

    /// Enter the terminal state: unprepared forever, prepared stream ended.
    pub fn shutdown(&self) {
        self.state.store(SHUT_DOWN, Ordering::Release);
        self.prepared_hub.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use futures_util::{FutureExt, StreamExt};

    use super::*;

    fn welcome(name: &str) -> Welcome {
        Welcome {
            heartbeat_interval_ms: 22_500,
            last_message_id: None,
            user: BotUser {
                id: "4WPbEZwd".into(),
                bot_id: "7ad1f6f3-2d4c-4d3e-bb52-0d1a6d2c0f55".into(),
                name: name.into(),
                created_by: "EdVMVKR4".into(),
                created_at: "2022-05-05T21:49:44.557Z".into(),
            },
        }
    }

    fn pending<T>(stream: &mut EventStream<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(Some(v)) = stream.next().now_or_never() {
            out.push(v);
        }
        out
    }

    #[test]
    fn welcome_prepares_and_fires_once() {
        let readiness = Readiness::new();
        let mut prepared = readiness.prepared();
        assert!(!readiness.is_prepared());
        assert!(readiness.current_user().is_none());

        readiness.on_welcome(&welcome("Gil"));
        assert!(readiness.is_prepared());
        assert_eq!(pending(&mut prepared).len(), 1);

        readiness.on_welcome(&welcome("Gil again"));
        assert!(readiness.is_prepared());
        assert!(pending(&mut prepared).is_empty());
        assert_eq!(readiness.current_user().unwrap().name, "Gil again");
    }

    #[test]
    fn heartbeat_timeout_keeps_prepared() {
        let readiness = Readiness::new();
        readiness.on_welcome(&welcome("Gil"));

        readiness.on_disconnect(&DisconnectReason::NoMessageReceived);
        assert!(readiness.is_prepared());
    }

    #[test]
    fn other_disconnects_demote_and_next_welcome_fires_again() {
        let reasons = [
            DisconnectReason::ConnectionLost("reset".into()),
            DisconnectReason::ServerClosed {
                code: 1001,
                reason: "going away".into(),
            },
            DisconnectReason::ClosedByClient,
            DisconnectReason::Error("tls".into()),
        ];

        for reason in reasons {
            let readiness = Readiness::new();
            let mut prepared = readiness.prepared();
            readiness.on_welcome(&welcome("Gil"));

            readiness.on_disconnect(&reason);
            assert!(!readiness.is_prepared(), "{reason:?}");

            readiness.on_welcome(&welcome("Gil"));
            assert!(readiness.is_prepared());
            assert_eq!(pending(&mut prepared).len(), 2, "{reason:?}");
        }
    }

    #[test]
    fn shutdown_is_terminal() {
        let readiness = Readiness::new();
        readiness.on_welcome(&welcome("Gil"));
        readiness.shutdown();
        assert!(!readiness.is_prepared());

        readiness.on_welcome(&welcome("Gil"));
        assert!(!readiness.is_prepared());
        assert!(readiness.is_shut_down());
    }

    #[test]
    fn shutdown_racing_welcome_never_leaves_prepared() {
        for _ in 0..2_000 {
            let readiness = Arc::new(Readiness::new());
            let start = Arc::new(Barrier::new(2));

            let welcomer = {
                let readiness = Arc::clone(&readiness);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    readiness.on_welcome(&welcome("Gil"));
                })
            };
            start.wait();
            readiness.shutdown();
            welcomer.join().unwrap();

            assert!(!readiness.is_prepared());
            assert!(readiness.is_shut_down());
        }
    }

    #[tokio::test]
    async fn wait_prepared_resolves_now_or_on_transition() {
        let readiness = Arc::new(Readiness::new());

        let waiter = {
            let readiness = Arc::clone(&readiness);
            tokio::spawn(async move { readiness.wait_prepared().await })
        };
        tokio::task::yield_now().await;
        readiness.on_welcome(&welcome("Gil"));

        assert_eq!(waiter.await.unwrap().unwrap().name, "Gil");
        assert_eq!(readiness.wait_prepared().await.unwrap().name, "Gil");
    }

    #[tokio::test]
    async fn wait_prepared_ends_on_shutdown() {
        let readiness = Arc::new(Readiness::new());
        let waiter = {
            let readiness = Arc::clone(&readiness);
            tokio::spawn(async move { readiness.wait_prepared().await })
        };
        tokio::task::yield_now().await;
        readiness.shutdown();

        assert!(waiter.await.unwrap().is_none());
    }
}
