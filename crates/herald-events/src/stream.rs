//! A named stream: one replay log plus its live subscribers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use herald_config::ReplayPolicy;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;
use uuid::Uuid;

use crate::error::EventLogResult;
use crate::event::{Event, EventId};
use crate::log::EventLog;
use crate::subscriber::Subscriber;

/// Stream wrapper used by subscribers that prefer `tokio_stream` combinators.
pub type EventStream = UnboundedReceiverStream<Arc<Event>>;

/// Publish/subscribe endpoint backed by a replay log.
#[derive(Debug)]
pub struct Stream {
    id: String,
    log: EventLog,
    auto_replay: bool,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl Stream {
    /// Create a stream whose log follows `policy`.
    ///
    /// With `auto_replay` off, published events are delivered live only and
    /// never retained.
    ///
    /// # Errors
    ///
    /// Propagates replay log construction failures.
    pub fn new(id: impl Into<String>, policy: ReplayPolicy, auto_replay: bool) -> EventLogResult<Self> {
        Ok(Self {
            id: id.into(),
            log: EventLog::new(policy)?,
            auto_replay,
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Stream identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether published events are retained for replay.
    #[must_use]
    pub const fn auto_replay(&self) -> bool {
        self.auto_replay
    }

    /// Replay log backing this stream.
    #[must_use]
    pub const fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Number of attached subscribers, including ones whose receivers were
    /// dropped since the last publish.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    /// Publish an event to the log and every live subscriber.
    ///
    /// Returns the delivered event, stamped with its id when auto replay is
    /// on, or `None` when the event had no content.
    pub fn publish(&self, event: Event) -> Option<Arc<Event>> {
        if !event.has_content() {
            return None;
        }

        let mut subscribers = self.lock_subscribers();
        let event = if self.auto_replay {
            self.log.add(event)?
        } else {
            Arc::new(event)
        };

        subscribers.retain(|subscriber| {
            let attached = subscriber.deliver(Arc::clone(&event));
            if !attached {
                debug!(stream = %self.id, subscriber = %subscriber.id(), "pruned detached subscriber");
            }
            attached
        });
        Some(event)
    }

    /// Attach a subscriber that has already seen `last_event_id`.
    ///
    /// With auto replay on, retained events from `last_event_id` onward are
    /// queued before any live event. Publishing is held off while the replay
    /// runs, so nothing is lost or duplicated at the hand-over.
    pub fn subscribe(&self, last_event_id: EventId) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriber = Subscriber::new(last_event_id, sender);
        let id = subscriber.id();

        let mut subscribers = self.lock_subscribers();
        let replayed = if self.auto_replay {
            self.log.replay(&subscriber)
        } else {
            0
        };
        subscribers.push(subscriber);
        debug!(stream = %self.id, subscriber = %id, last_event_id, replayed, "subscriber attached");

        Subscription {
            id,
            stream_id: self.id.clone(),
            receiver,
        }
    }

    /// Detach a subscriber; its subscription ends once drained.
    pub fn unsubscribe(&self, subscriber_id: Uuid) -> bool {
        let mut subscribers = self.lock_subscribers();
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id() != subscriber_id);
        before != subscribers.len()
    }

    /// Stop the log's sweep and detach every subscriber.
    pub fn close(&self) {
        self.log.close();
        let detached = std::mem::take(&mut *self.lock_subscribers());
        debug!(stream = %self.id, detached = detached.len(), "stream closed");
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Receiving side of a stream subscription.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
    stream_id: String,
    receiver: mpsc::UnboundedReceiver<Arc<Event>>,
}

impl Subscription {
    /// Subscriber identifier, usable with [`Stream::unsubscribe`].
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Stream this subscription is attached to.
    #[must_use]
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Receive the next event, replayed backlog first. `None` once the
    /// stream has detached this subscriber and the queue is drained.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.recv().await
    }

    /// Take an already queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.try_recv().ok()
    }

    /// Convert into a `tokio_stream` stream.
    #[must_use]
    pub fn into_stream(self) -> EventStream {
        UnboundedReceiverStream::new(self.receiver)
    }
}
