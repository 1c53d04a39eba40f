//! Global tracing subscriber installation for Herald binaries.
//!
//! Output is either one JSON object per line or the human-readable fmt
//! layout. `RUST_LOG` wins over the configured level when it is set.

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{TelemetryError, TelemetryResult};

/// Level directive used when neither `RUST_LOG` nor an override is given.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Build identifier reported when none is baked into the binary.
pub const UNKNOWN_BUILD: &str = "dev";

/// Install the global tracing subscriber described by `config`.
///
/// The first event emitted through the new subscriber records the build
/// identifier and chosen format.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] when a global subscriber is
/// already in place.
pub fn init_logging(config: &LoggingConfig) -> TelemetryResult<()> {
    let filter = env_filter(config.level);
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })?;

    info!(
        build_sha = config.build_sha,
        format = config.format.as_str(),
        "logging initialised"
    );
    Ok(())
}

/// Inputs for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Fallback filter directive, e.g. `info` or `herald_events=debug`.
    pub level: &'a str,
    /// Line format.
    pub format: LogFormat,
    /// Build identifier included in the startup event.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: UNKNOWN_BUILD,
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON, one object per line.
    Json,
    /// Human-readable fmt output.
    Pretty,
}

impl LogFormat {
    /// Pretty output for debug builds, JSON for release builds.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Resolve a configured format name. Unrecognised names fall back to
    /// [`LogFormat::infer`]; `None` means nothing was configured.
    #[must_use]
    pub fn from_name(value: Option<&str>) -> Option<Self> {
        value.map(|name| match name.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            _ => Self::infer(),
        })
    }

    /// Name accepted by [`LogFormat::from_name`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
