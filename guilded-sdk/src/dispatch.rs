//! Turns raw gateway text into published typed events.
//!
//! The dispatcher is stateless apart from its diagnostics counters. Callers
//! feed it one message at a time; each message is resolved, transformed,
//! decoded and published before the call returns, so subscribers observe
//! events in receipt order.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::DispatchError;
use crate::events::hub::panic_message;
use crate::events::registry::EventRegistry;
use crate::events::{EventKey, Frame};
use crate::sdk_log;

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Decoded and published under `key` to `receivers` subscribers.
    Published {
        /// Registry key.
        key: EventKey,
        /// Subscribers that received the event.
        receivers: usize,
    },
    /// No registry entry for this frame.
    Ignored,
}

/// Counters describing the frames seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Frames decoded and published.
    pub published: u64,
    /// Frames without a registry entry.
    pub ignored: u64,
    /// Frames dropped because they failed to parse, transform or decode.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
}

/// Raw message decoder bound to one [`EventRegistry`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<EventRegistry>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Dispatcher over `registry`.
    pub fn new(registry: Arc<EventRegistry>) -> Self {
        Self {
            registry,
            counters: Arc::default(),
        }
    }

    /// The registry frames are resolved against.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// Counters since construction.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            published: self.counters.published.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Parse and dispatch one text message.
    ///
    /// # Errors
    /// [`DispatchError::Envelope`] for text that is not a gateway envelope,
    /// otherwise as [`dispatch`](Self::dispatch).
    pub fn dispatch_text(&self, text: &str) -> Result<Dispatched, DispatchError> {
        let frame = Frame::parse(text).map_err(|e| DispatchError::Envelope(Arc::new(e)))?;
        self.dispatch(&frame)
    }

    /// Dispatch one frame.
    ///
    /// # Errors
    /// [`DispatchError::Transform`] or [`DispatchError::Decode`] when the frame
    /// has an entry but its payload does not fit. Unknown keys are not errors.
    pub fn dispatch(&self, frame: &Frame) -> Result<Dispatched, DispatchError> {
        let Some(key) = frame.key() else {
            return Ok(Dispatched::Ignored);
        };
        let Some(descriptor) = self.registry.lookup(&key) else {
            return Ok(Dispatched::Ignored);
        };
        let receivers = descriptor.decode_and_publish(frame)?;
        Ok(Dispatched::Published { key, receivers })
    }

    /// Dispatch one text message, logging and counting the outcome instead of
    /// returning errors. This is what the connection loop runs.
    ///
    /// A panic raised by a transform or an observer counts as a failed frame.
    pub fn handle_text(&self, text: &str) -> Option<Dispatched> {
        let outcome = match catch_unwind(AssertUnwindSafe(|| self.dispatch_text(text))) {
            Ok(outcome) => outcome,
            Err(panic) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                sdk_log!(
                    warn,
                    "Dropping gateway frame: handler panicked: {}",
                    panic_message(panic.as_ref())
                );
                return None;
            }
        };

        match outcome {
            Ok(Dispatched::Ignored) => {
                self.counters.ignored.fetch_add(1, Ordering::Relaxed);
                sdk_log!(trace, "Ignoring gateway frame without a registered key");
                Some(Dispatched::Ignored)
            }
            Ok(published) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
                Some(published)
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                sdk_log!(warn, "Dropping gateway frame: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{FutureExt, StreamExt};
    use serde::Deserialize;
    use serde_json::Value;

    use super::*;
    use crate::errors::TransformError;
    use crate::events::hub::EventStream;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Item {
        id: i64,
    }

    fn dispatcher() -> (Dispatcher, EventStream<Item>, EventStream<Item>) {
        let mut registry = EventRegistry::new();
        let hub = registry.register::<Item>("X").unwrap();
        let first = hub.subscribe();
        let second = hub.subscribe();
        (Dispatcher::new(Arc::new(registry)), first, second)
    }

    fn ids(stream: &mut EventStream<Item>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(Some(item)) = stream.next().now_or_never() {
            out.push(item.id);
        }
        out
    }

    #[test]
    fn end_to_end_typed_delivery_and_unknown_keys() {
        let (dispatcher, mut stream, _second) = dispatcher();

        let outcome = dispatcher.dispatch_text(r#"{"op":0,"t":"X","d":{"id":7}}"#).unwrap();
        assert_eq!(
            outcome,
            Dispatched::Published {
                key: EventKey::name("X"),
                receivers: 2
            }
        );
        assert_eq!(ids(&mut stream), vec![7]);

        let outcome = dispatcher.dispatch_text(r#"{"op":0,"t":"Y","d":{"id":8}}"#).unwrap();
        assert_eq!(outcome, Dispatched::Ignored);
        assert!(ids(&mut stream).is_empty());
    }

    #[test]
    fn ordering_survives_dropped_frames() {
        let (dispatcher, mut first, mut second) = dispatcher();
        let frames = [
            r#"{"op":0,"t":"X","d":{"id":1}}"#,
            r#"{"op":0,"t":"X","d":{"id":"bad"}}"#,
            r#"{"op":0,"t":"Unknown","d":{}}"#,
            r#"{"op":0,"t":"X","d":{"id":2}}"#,
            "garbage",
            r#"{"op":0,"d":{"id":99}}"#,
            r#"{"op":0,"t":"X","d":{}}"#,
            r#"{"op":0,"t":"X","d":{"id":3}}"#,
        ];
        for frame in frames {
            dispatcher.handle_text(frame);
        }

        assert_eq!(ids(&mut first), vec![1, 2, 3]);
        assert_eq!(ids(&mut second), vec![1, 2, 3]);
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                published: 3,
                ignored: 2,
                failed: 3,
            }
        );
    }

    #[test]
    fn control_frames_resolve_by_opcode() {
        let mut registry = EventRegistry::new();
        let hub = registry.register::<Item>(2u8).unwrap();
        let mut stream = hub.subscribe();
        let dispatcher = Dispatcher::new(Arc::new(registry));

        dispatcher
            .dispatch_text(r#"{"op":2,"t":"X","d":{"id":5}}"#)
            .unwrap();
        assert_eq!(ids(&mut stream), vec![5]);
        assert_eq!(
            dispatcher.dispatch_text(r#"{"op":9,"d":{}}"#).unwrap(),
            Dispatched::Ignored
        );
    }

    #[test]
    fn panicking_transform_drops_only_its_frame() {
        let mut registry = EventRegistry::new();
        registry
            .register_with::<Item>(
                "Boom",
                Arc::new(|_: Value| -> Result<Value, TransformError> {
                    panic!("transform exploded")
                }),
            )
            .unwrap();
        let mut stream = registry.register::<Item>("X").unwrap().subscribe();
        let dispatcher = Dispatcher::new(Arc::new(registry));

        assert_eq!(dispatcher.handle_text(r#"{"op":0,"t":"Boom","d":{"id":1}}"#), None);
        assert!(dispatcher.handle_text(r#"{"op":0,"t":"X","d":{"id":2}}"#).is_some());

        assert_eq!(ids(&mut stream), vec![2]);
        assert_eq!(
            dispatcher.stats(),
            DispatchStats {
                published: 1,
                ignored: 0,
                failed: 1,
            }
        );
    }

    #[test]
    fn errors_are_typed() {
        let (dispatcher, _, _) = dispatcher();
        assert!(matches!(
            dispatcher.dispatch_text("{"),
            Err(DispatchError::Envelope(_))
        ));
        assert!(matches!(
            dispatcher.dispatch_text(r#"{"op":0,"t":"X","d":[]}"#),
            Err(DispatchError::Decode { .. })
        ));
    }
}
