//! # Design
//!
//! - Centralize application-level errors for bootstrap and the demo run.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: herald_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: herald_telemetry::TelemetryError,
    },
    /// Stream registry operations failed.
    #[error("stream registry operation failed")]
    Server {
        /// Operation identifier.
        operation: &'static str,
        /// Source registry error.
        source: herald_events::ServerError,
    },
    /// A spawned task panicked or was cancelled.
    #[error("background task failed")]
    Join {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
    /// Configuration values were invalid.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Field name that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Optional value associated with the failure.
        value: Option<String>,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: herald_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: herald_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn server(operation: &'static str, source: herald_events::ServerError) -> Self {
        Self::Server { operation, source }
    }

    pub(crate) const fn join(operation: &'static str, source: tokio::task::JoinError) -> Self {
        Self::Join { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn constructors_keep_operation_and_source() {
        let err = AppError::server(
            "server.subscribe",
            herald_events::ServerError::UnknownStream {
                stream_id: "messages".into(),
            },
        );
        assert_eq!(err.to_string(), "stream registry operation failed");
        assert!(matches!(
            err,
            AppError::Server {
                operation: "server.subscribe",
                ..
            }
        ));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_config_has_no_source() {
        let err = AppError::InvalidConfig {
            field: "demo_run_ms",
            reason: "zero",
            value: Some("0".into()),
        };
        assert_eq!(err.to_string(), "invalid configuration");
        assert!(err.source().is_none());
    }
}
