//! Registry of named streams sharing one set of defaults.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use herald_config::ServerConfig;
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::event::{Event, EventId};
use crate::stream::{Stream, Subscription};

/// Stream registry used by the transport layer.
#[derive(Debug, Default)]
pub struct Server {
    config: ServerConfig,
    streams: RwLock<HashMap<String, Arc<Stream>>>,
}

impl Server {
    /// Construct an empty registry.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Defaults applied to streams created by this registry.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Create a stream, or return the existing one with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::CreateStream`] when the replay log cannot be
    /// constructed.
    pub fn create_stream(&self, stream_id: &str) -> ServerResult<Arc<Stream>> {
        let mut streams = self.write_streams();
        if let Some(existing) = streams.get(stream_id) {
            return Ok(Arc::clone(existing));
        }

        let stream = Stream::new(stream_id, self.config.replay, self.config.auto_replay)
            .map_err(|source| ServerError::CreateStream {
                stream_id: stream_id.to_string(),
                source,
            })?;
        let stream = Arc::new(stream);
        streams.insert(stream_id.to_string(), Arc::clone(&stream));
        info!(stream = stream_id, "stream created");
        Ok(stream)
    }

    /// Remove and close a stream. Returns `false` if it was not registered.
    pub fn remove_stream(&self, stream_id: &str) -> bool {
        let Some(stream) = self.write_streams().remove(stream_id) else {
            return false;
        };
        stream.close();
        info!(stream = stream_id, "stream removed");
        true
    }

    /// Whether a stream with this id is registered.
    #[must_use]
    pub fn stream_exists(&self, stream_id: &str) -> bool {
        self.read_streams().contains_key(stream_id)
    }

    /// Look up a registered stream.
    #[must_use]
    pub fn stream(&self, stream_id: &str) -> Option<Arc<Stream>> {
        self.read_streams().get(stream_id).cloned()
    }

    /// Identifiers of every registered stream, sorted.
    #[must_use]
    pub fn stream_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read_streams().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Publish to a registered stream.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownStream`] when the stream does not exist.
    pub fn publish(&self, stream_id: &str, event: Event) -> ServerResult<Option<Arc<Event>>> {
        let stream = self.stream(stream_id).ok_or_else(|| ServerError::UnknownStream {
            stream_id: stream_id.to_string(),
        })?;
        Ok(stream.publish(event))
    }

    /// Publish if the stream exists; otherwise drop the event.
    pub fn try_publish(&self, stream_id: &str, event: Event) -> Option<Arc<Event>> {
        self.stream(stream_id)?.publish(event)
    }

    /// Subscribe to a stream, creating it first when `auto_stream` is on.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownStream`] for an unknown stream when
    /// `auto_stream` is off, or a creation error.
    pub fn subscribe(&self, stream_id: &str, last_event_id: EventId) -> ServerResult<Subscription> {
        let stream = match self.stream(stream_id) {
            Some(stream) => stream,
            None if self.config.auto_stream => self.create_stream(stream_id)?,
            None => {
                return Err(ServerError::UnknownStream {
                    stream_id: stream_id.to_string(),
                });
            }
        };
        Ok(stream.subscribe(last_event_id))
    }

    /// Remove and close every stream.
    pub fn close(&self) {
        let streams = std::mem::take(&mut *self.write_streams());
        for stream in streams.values() {
            stream.close();
        }
        info!(closed = streams.len(), "stream registry closed");
    }

    fn read_streams(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Stream>>> {
        self.streams.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_streams(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Stream>>> {
        self.streams.write().unwrap_or_else(PoisonError::into_inner)
    }
}
