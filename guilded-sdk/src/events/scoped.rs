//! Identity-scoped views over a typed event stream.
//!
//! A scoped stream is recomputed per subscription: it subscribes to the global
//! stream and drops every event that does not belong to one entity. Nothing is
//! stored and nothing is replayed.

use std::future;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use super::hub::EventStream;

/// A narrowed event stream.
pub type ScopedStream<T> = BoxStream<'static, T>;

/// Keep only the events matching `predicate`, in their original order.
pub fn filtered<T, P>(stream: EventStream<T>, mut predicate: P) -> ScopedStream<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    stream
        .filter(move |event| future::ready(predicate(event)))
        .boxed()
}

/// Deliver the first event matching `predicate`, then complete.
///
/// Used for lifecycle events that can only happen once per entity, such as
/// deletions.
pub fn first_match<T, P>(stream: EventStream<T>, predicate: P) -> ScopedStream<T>
where
    T: Send + 'static,
    P: FnMut(&T) -> bool + Send + 'static,
{
    filtered(stream, predicate).take(1).boxed()
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;

    use super::*;
    use crate::events::hub::EventHub;

    #[derive(Debug, Clone, PartialEq)]
    struct Update {
        channel: &'static str,
        id: u32,
        rev: u32,
    }

    fn update(channel: &'static str, id: u32, rev: u32) -> Update {
        Update { channel, id, rev }
    }

    fn ready<T>(stream: &mut ScopedStream<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(Some(event)) = stream.next().now_or_never() {
            out.push(event);
        }
        out
    }

    #[test]
    fn filtered_keeps_only_matching_events_in_order() {
        let hub = EventHub::new();
        let mut scoped = filtered(hub.subscribe(), |u: &Update| u.channel == "c1" && u.id == 7);

        hub.publish(update("c1", 7, 1));
        hub.publish(update("c1", 8, 1));
        hub.publish(update("c2", 7, 1));
        hub.publish(update("c1", 7, 2));
        hub.publish(update("c1", 9, 1));
        hub.publish(update("c1", 7, 3));

        let revs: Vec<u32> = ready(&mut scoped).into_iter().map(|u| u.rev).collect();
        assert_eq!(revs, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn first_match_delivers_at_most_one_event() {
        let hub = EventHub::new();
        let mut deleted = first_match(hub.subscribe(), |u: &Update| u.id == 7);

        hub.publish(update("c1", 1, 1));
        hub.publish(update("c1", 7, 1));
        hub.publish(update("c1", 7, 2));

        assert_eq!(deleted.next().await, Some(update("c1", 7, 1)));
        assert_eq!(deleted.next().await, None);
    }

    #[test]
    fn scoped_streams_are_independent() {
        let hub = EventHub::new();
        let mut a = filtered(hub.subscribe(), |u: &Update| u.id == 1);
        let mut b = filtered(hub.subscribe(), |u: &Update| u.id == 2);

        hub.publish(update("c", 1, 1));
        hub.publish(update("c", 2, 1));

        assert_eq!(ready(&mut a), vec![update("c", 1, 1)]);
        assert_eq!(ready(&mut b), vec![update("c", 2, 1)]);
    }
}
