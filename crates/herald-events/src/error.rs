//! Error primitives for replay logs and the stream registry.

use herald_config::ConfigError;
use thiserror::Error;

/// Result alias for replay log construction.
pub type EventLogResult<T> = Result<T, EventLogError>;

/// Result alias for stream registry operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while constructing a replay log.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// The supplied retention limits were invalid.
    #[error("invalid replay policy")]
    InvalidPolicy {
        /// Source configuration error.
        source: ConfigError,
    },
    /// An expiring log needs an async runtime to host its sweep task.
    #[error("no tokio runtime available to schedule the expiry sweep")]
    RuntimeUnavailable,
}

/// Errors raised by the stream registry.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The named stream is not registered.
    #[error("unknown stream '{stream_id}'")]
    UnknownStream {
        /// Identifier that failed to resolve.
        stream_id: String,
    },
    /// Creating a stream's replay log failed.
    #[error("failed to create stream '{stream_id}'")]
    CreateStream {
        /// Identifier of the stream being created.
        stream_id: String,
        /// Source replay log error.
        source: EventLogError,
    },
}

impl ServerError {
    /// Identifier of the stream tied to the failure.
    #[must_use]
    pub fn stream_id(&self) -> &str {
        match self {
            Self::UnknownStream { stream_id } | Self::CreateStream { stream_id, .. } => stream_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn server_error_exposes_stream_id() {
        let unknown = ServerError::UnknownStream {
            stream_id: "messages".into(),
        };
        assert_eq!(unknown.stream_id(), "messages");
        assert_eq!(unknown.to_string(), "unknown stream 'messages'");

        let create = ServerError::CreateStream {
            stream_id: "ticks".into(),
            source: EventLogError::RuntimeUnavailable,
        };
        assert_eq!(create.stream_id(), "ticks");
        assert!(create.source().is_some());
    }
}
