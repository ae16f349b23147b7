//! Key → descriptor table.
//!
//! Each entry is a [`TypedDescriptor<T>`] that knows its concrete payload type,
//! so decoding and publishing need no runtime type checks. The table is filled
//! while a client is built and then shared read-only behind an `Arc`.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::hub::EventHub;
use super::transforms::Transform;
use super::{EventKey, Frame};
use crate::errors::{DispatchError, RegistryError};

/// Hook run on each decoded value before it is published.
pub type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Type-erased view of one registry entry.
pub trait Descriptor: Send + Sync + fmt::Debug {
    /// Key this entry is registered under.
    fn key(&self) -> &EventKey;

    /// Name of the payload type, for diagnostics.
    fn payload_type(&self) -> &'static str;

    /// Transform, deserialize and publish the payload of `frame`.
    ///
    /// Returns the number of subscribers that received the event.
    ///
    /// # Errors
    /// [`DispatchError::Transform`] or [`DispatchError::Decode`]; nothing is
    /// published in that case.
    fn decode_and_publish(&self, frame: &Frame) -> Result<usize, DispatchError>;

    /// Ends every stream of this entry.
    fn close(&self);

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

/// Registry entry for payload type `T`.
pub struct TypedDescriptor<T> {
    key: EventKey,
    transform: Option<Transform>,
    observer: Option<Observer<T>>,
    hub: EventHub<T>,
}

impl<T> TypedDescriptor<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Entry without transform or observer.
    pub fn new(key: impl Into<EventKey>) -> Self {
        Self {
            key: key.into(),
            transform: None,
            observer: None,
            hub: EventHub::new(),
        }
    }

    /// Rewrite the raw payload before it is decoded.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// See every decoded value before subscribers do.
    #[must_use]
    pub fn with_observer(mut self, observer: Observer<T>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The sink values are published on.
    pub fn hub(&self) -> &EventHub<T> {
        &self.hub
    }

    fn decode(&self, payload: &Value) -> Result<T, DispatchError> {
        let decoded = match &self.transform {
            Some(transform) => {
                let payload =
                    transform(payload.clone()).map_err(|source| DispatchError::Transform {
                        key: self.key.clone(),
                        source,
                    })?;
                T::deserialize(payload)
            }
            None => T::deserialize(payload),
        };
        decoded.map_err(|source| DispatchError::Decode {
            key: self.key.clone(),
            source: Arc::new(source),
        })
    }
}

impl<T> fmt::Debug for TypedDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedDescriptor")
            .field("key", &self.key)
            .field("payload_type", &type_name::<T>())
            .field("transform", &self.transform.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl<T> Descriptor for TypedDescriptor<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    fn key(&self) -> &EventKey {
        &self.key
    }

    fn payload_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn decode_and_publish(&self, frame: &Frame) -> Result<usize, DispatchError> {
        let value = self.decode(&frame.payload)?;
        if let Some(observer) = &self.observer {
            observer(&value);
        }
        Ok(self.hub.publish(value))
    }

    fn close(&self) {
        self.hub.close();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Immutable-after-build table of event descriptors.
#[derive(Debug, Default)]
pub struct EventRegistry {
    descriptors: HashMap<EventKey, Box<dyn Descriptor>>,
}

impl EventRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register payload type `T` under `key` and return its hub.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateKey`] if `key` is taken.
    pub fn register<T>(&mut self, key: impl Into<EventKey>) -> Result<EventHub<T>, RegistryError>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        self.insert(TypedDescriptor::new(key))
    }

    /// Register `T` under `key` with a payload transform.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateKey`] if `key` is taken.
    pub fn register_with<T>(
        &mut self,
        key: impl Into<EventKey>,
        transform: Transform,
    ) -> Result<EventHub<T>, RegistryError>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        self.insert(TypedDescriptor::new(key).with_transform(transform))
    }

    /// Register a fully configured descriptor.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateKey`] if its key is taken.
    pub fn insert<T>(&mut self, descriptor: TypedDescriptor<T>) -> Result<EventHub<T>, RegistryError>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        if self.descriptors.contains_key(&descriptor.key) {
            return Err(RegistryError::DuplicateKey(descriptor.key));
        }
        let hub = descriptor.hub.clone();
        self.descriptors
            .insert(descriptor.key.clone(), Box::new(descriptor));
        Ok(hub)
    }

    /// Find the entry for `key`. Unknown keys are not an error.
    pub fn lookup(&self, key: &EventKey) -> Option<&dyn Descriptor> {
        self.descriptors.get(key).map(|descriptor| &**descriptor)
    }

    /// Typed hub of the entry for `key`, if it exists and carries `T`.
    pub fn hub<T>(&self, key: &EventKey) -> Option<EventHub<T>>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        self.lookup(key)?
            .as_any()
            .downcast_ref::<TypedDescriptor<T>>()
            .map(|descriptor| descriptor.hub.clone())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &EventKey> {
        self.descriptors.keys()
    }

    /// End the streams of every entry.
    pub fn close_all(&self) {
        for descriptor in self.descriptors.values() {
            descriptor.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{FutureExt, StreamExt};
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::events::transforms;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Ping {
        id: u32,
    }

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut registry = EventRegistry::new();
        registry.register::<Ping>("Ping").unwrap();

        let err = registry.register::<Named>("Ping").unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKey(EventKey::name("Ping")));

        registry.register::<Ping>(7u8).unwrap();
        assert!(registry.register::<Ping>(7u8).is_err());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn lookups_return_the_registered_descriptor() {
        let mut registry = EventRegistry::new();
        let names: Vec<String> = (0..20).map(|i| format!("Event{i}")).collect();
        for name in &names {
            registry.register::<Ping>(name.clone()).unwrap();
        }
        registry.register::<Named>(3u8).unwrap();

        for name in &names {
            let key = EventKey::from(name.clone());
            let descriptor = registry.lookup(&key).unwrap();
            assert_eq!(descriptor.key(), &key);
            assert!(descriptor.payload_type().ends_with("Ping"));
        }
        let op = registry.lookup(&EventKey::opcode(3)).unwrap();
        assert!(op.payload_type().ends_with("Named"));

        assert!(registry.lookup(&EventKey::name("Unknown")).is_none());
        assert!(registry.lookup(&EventKey::opcode(4)).is_none());
    }

    #[test]
    fn typed_hub_requires_matching_type() {
        let mut registry = EventRegistry::new();
        registry.register::<Ping>("Ping").unwrap();

        assert!(registry.hub::<Ping>(&"Ping".into()).is_some());
        assert!(registry.hub::<Named>(&"Ping".into()).is_none());
        assert!(registry.hub::<Ping>(&"Pong".into()).is_none());
    }

    #[test]
    fn decode_and_publish_delivers_typed_value() {
        let mut registry = EventRegistry::new();
        let hub = registry.register::<Ping>("Ping").unwrap();
        let mut stream = hub.subscribe();

        let frame = Frame::new(0, Some("Ping"), json!({"id": 7}));
        let delivered = registry
            .lookup(&"Ping".into())
            .unwrap()
            .decode_and_publish(&frame)
            .unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(stream.next().now_or_never(), Some(Some(Ping { id: 7 })));
    }

    #[test]
    fn decode_failure_publishes_nothing() {
        let mut registry = EventRegistry::new();
        let hub = registry.register::<Ping>("Ping").unwrap();
        let mut stream = hub.subscribe();

        let frame = Frame::new(0, Some("Ping"), json!({"id": "seven"}));
        let err = registry
            .lookup(&"Ping".into())
            .unwrap()
            .decode_and_publish(&frame)
            .unwrap_err();

        assert!(matches!(err, DispatchError::Decode { .. }));
        assert!(stream.next().now_or_never().is_none());
    }

    #[test]
    fn transform_runs_before_decode_and_failures_are_reported() {
        let mut registry = EventRegistry::new();
        registry
            .register_with::<Named>("Named", transforms::copy_envelope_field("name", "inner"))
            .unwrap();
        let descriptor = registry.lookup(&"Named".into()).unwrap();

        let ok = Frame::new(0, Some("Named"), json!({"name": "n", "inner": {}}));
        assert_eq!(descriptor.decode_and_publish(&ok).unwrap(), 0);

        let bad = Frame::new(0, Some("Named"), json!({"inner": {}}));
        assert!(matches!(
            descriptor.decode_and_publish(&bad),
            Err(DispatchError::Transform { .. })
        ));
    }

    #[test]
    fn observer_sees_value_before_subscribers() {
        let (tx, rx) = flume::unbounded();
        let mut registry = EventRegistry::new();
        let observer: Observer<Ping> = Arc::new(move |ping: &Ping| {
            tx.send(ping.id).unwrap();
        });
        let hub = registry
            .insert(TypedDescriptor::<Ping>::new(1u8).with_observer(observer))
            .unwrap();
        let mut stream = hub.subscribe();

        registry
            .lookup(&EventKey::opcode(1))
            .unwrap()
            .decode_and_publish(&Frame::new(1, None, json!({"id": 1})))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap(), 1);
        assert_eq!(stream.next().now_or_never(), Some(Some(Ping { id: 1 })));
    }
}
