//! Event payload carried through replay logs and streams.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordinal identifier assigned to each event accepted by a replay log.
pub type EventId = u64;

/// A single published message.
///
/// The payload fields are owned by the publisher and never interpreted by the
/// log. The `id` and `timestamp` are stamped by the log when the event is
/// accepted; the id travels as its decimal string, which is what clients echo
/// back through `Last-Event-ID`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    /// Message body.
    #[serde(default)]
    pub data: Vec<u8>,
    /// Optional event name used by clients to dispatch on.
    #[serde(default)]
    pub event: String,
    /// Reconnection delay hint for clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<Duration>,
    /// Comment line, typically used as a keep-alive.
    #[serde(default)]
    pub comment: String,
}

impl Event {
    /// Create an event carrying `data`.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Set the event name.
    #[must_use]
    pub fn with_event(mut self, name: impl Into<String>) -> Self {
        self.event = name.into();
        self
    }

    /// Set the reconnection hint.
    #[must_use]
    pub const fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the comment line.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Whether the event carries anything worth publishing.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.data.is_empty()
            || !self.event.is_empty()
            || self.retry.is_some()
            || !self.comment.is_empty()
    }

    /// Identifier assigned by the log, if the event has been accepted by one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identifier parsed as an ordinal. `None` when unassigned or malformed.
    #[must_use]
    pub fn sequence(&self) -> Option<EventId> {
        self.id.as_deref()?.parse().ok()
    }

    /// Wall-clock acceptance time assigned by the log.
    #[must_use]
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub(crate) fn stamp(&mut self, id: EventId, timestamp: DateTime<Utc>) {
        self.id = Some(id.to_string());
        self.timestamp = Some(timestamp);
    }

    #[cfg(test)]
    pub(crate) fn with_raw_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_event_has_no_content() {
        assert!(!Event::default().has_content());
        assert!(!Event::new(Vec::new()).has_content());
    }

    #[test]
    fn any_framing_field_counts_as_content() {
        assert!(Event::new("ping").has_content());
        assert!(Event::default().with_event("update").has_content());
        assert!(Event::default().with_comment("keep-alive").has_content());
        assert!(
            Event::default()
                .with_retry(Duration::from_secs(3))
                .has_content()
        );
    }

    #[test]
    fn stamp_assigns_decimal_id() {
        let mut event = Event::new("ping");
        assert_eq!(event.id(), None);
        assert_eq!(event.sequence(), None);

        let now = Utc::now();
        event.stamp(42, now);
        assert_eq!(event.id(), Some("42"));
        assert_eq!(event.sequence(), Some(42));
        assert_eq!(event.timestamp(), Some(now));
    }

    #[test]
    fn malformed_id_has_no_sequence() {
        let event = Event::new("ping").with_raw_id("not-a-number");
        assert_eq!(event.id(), Some("not-a-number"));
        assert_eq!(event.sequence(), None);
    }

    #[test]
    fn serialized_event_omits_unassigned_fields() -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(Event::new("hi").with_event("greeting"))?;
        assert!(value.get("id").is_none());
        assert!(value.get("timestamp").is_none());
        assert_eq!(value["event"], "greeting");
        Ok(())
    }
}
