//! Subscriber handle and the sink seam replay delivers through.

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::{Event, EventId};

/// Destination for events delivered to one subscriber.
///
/// Delivery must not block: replay runs under the log's read lock and publish
/// runs on the publisher's task. The subscriber owns any buffering.
pub trait EventSink {
    /// Hand over one event. Returns `false` once the receiving side is gone.
    fn deliver(&self, event: Arc<Event>) -> bool;
}

impl EventSink for mpsc::UnboundedSender<Arc<Event>> {
    fn deliver(&self, event: Arc<Event>) -> bool {
        self.send(event).is_ok()
    }
}

/// A downstream listener identified by the last event id it has seen.
#[derive(Debug)]
pub struct Subscriber<S = mpsc::UnboundedSender<Arc<Event>>> {
    id: Uuid,
    last_event_id: EventId,
    sink: S,
}

impl<S: EventSink> Subscriber<S> {
    /// Attach a sink for a client that has already seen `last_event_id`.
    #[must_use]
    pub fn new(last_event_id: EventId, sink: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_event_id,
            sink,
        }
    }

    /// Identifier used in logs and for explicit unsubscription.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Lowest event id this subscriber still wants replayed.
    #[must_use]
    pub const fn last_event_id(&self) -> EventId {
        self.last_event_id
    }

    /// Borrow the underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Deliver one event; `false` means the receiver has gone away.
    pub fn deliver(&self, event: Arc<Event>) -> bool {
        self.sink.deliver(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_reports_closed_receiver() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriber = Subscriber::new(7, sender);
        assert_eq!(subscriber.last_event_id(), 7);
        assert!(subscriber.deliver(Arc::new(Event::new("a"))));

        drop(receiver);
        assert!(!subscriber.deliver(Arc::new(Event::new("b"))));
    }

    #[test]
    fn subscribers_get_distinct_ids() {
        let (sender, _receiver) = mpsc::unbounded_channel::<Arc<Event>>();
        let first = Subscriber::new(0, sender.clone());
        let second = Subscriber::new(0, sender);
        assert_ne!(first.id(), second.id());
    }
}
