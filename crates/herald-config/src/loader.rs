//! Environment-backed configuration loading.
//!
//! # Design
//! - Every lookup goes through a caller-supplied function so tests never touch
//!   the process environment.
//! - Absent variables fall back to [`ServerConfig::default`]; present but
//!   invalid variables are errors rather than silent defaults.

use tracing::debug;

use crate::error::ConfigResult;
use crate::model::{ReplayPolicy, ServerConfig};
use crate::validate::{parse_flag, parse_integer};

/// Retention window for replayed events, in milliseconds (`0` keeps forever).
pub const ENV_EVENT_TTL_MS: &str = "HERALD_EVENT_TTL_MS";
/// Soft cap on retained events per stream (`0` is unlimited).
pub const ENV_MAX_CAPACITY: &str = "HERALD_MAX_CAPACITY";
/// Toggle for retaining and replaying events to late subscribers.
pub const ENV_AUTO_REPLAY: &str = "HERALD_AUTO_REPLAY";
/// Toggle for creating streams on first subscription.
pub const ENV_AUTO_STREAM: &str = "HERALD_AUTO_STREAM";

/// Load the server configuration from the process environment.
///
/// # Errors
///
/// Returns a [`crate::ConfigError`] when a variable is present but invalid.
pub fn load_from_env() -> ConfigResult<ServerConfig> {
    load_with(|key| std::env::var(key).ok())
}

/// Load the server configuration through an arbitrary key lookup.
///
/// # Errors
///
/// Returns a [`crate::ConfigError`] when a value is present but invalid.
pub fn load_with<F>(lookup: F) -> ConfigResult<ServerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ServerConfig::default();

    let ttl_ms = lookup(ENV_EVENT_TTL_MS)
        .map(|raw| parse_integer("event_ttl_ms", &raw))
        .transpose()?
        .unwrap_or(0);
    let max_capacity = lookup(ENV_MAX_CAPACITY)
        .map(|raw| parse_integer("max_capacity", &raw))
        .transpose()?
        .unwrap_or(0);
    let auto_replay = lookup(ENV_AUTO_REPLAY)
        .map(|raw| parse_flag("auto_replay", &raw))
        .transpose()?
        .unwrap_or(defaults.auto_replay);
    let auto_stream = lookup(ENV_AUTO_STREAM)
        .map(|raw| parse_flag("auto_stream", &raw))
        .transpose()?
        .unwrap_or(defaults.auto_stream);

    let config = ServerConfig {
        replay: ReplayPolicy::from_raw(ttl_ms, max_capacity)?,
        auto_replay,
        auto_stream,
    };
    debug!(
        event_ttl_ms = ttl_ms,
        max_capacity,
        auto_replay,
        auto_stream,
        "loaded server configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() -> ConfigResult<()> {
        let config = load_with(|_| None)?;
        assert_eq!(config, ServerConfig::default());
        Ok(())
    }

    #[test]
    fn values_are_read_from_lookup() -> ConfigResult<()> {
        let config = load_with(lookup_from(&[
            (ENV_EVENT_TTL_MS, "100"),
            (ENV_MAX_CAPACITY, "3"),
            (ENV_AUTO_REPLAY, "off"),
            (ENV_AUTO_STREAM, "yes"),
        ]))?;
        assert_eq!(config.replay.ttl(), Duration::from_millis(100));
        assert_eq!(config.replay.max_capacity(), 3);
        assert!(!config.auto_replay);
        assert!(config.auto_stream);
        Ok(())
    }

    #[test]
    fn negative_capacity_fails_loading() {
        let err = load_with(lookup_from(&[(ENV_MAX_CAPACITY, "-1")]))
            .err()
            .expect("negative capacity must fail");
        assert_eq!(err.field(), Some("max_capacity"));
    }

    #[test]
    fn malformed_flag_fails_loading() {
        let err = load_with(lookup_from(&[(ENV_AUTO_STREAM, "sometimes")]))
            .err()
            .expect("malformed flag must fail");
        assert_eq!(err.field(), Some("auto_stream"));
    }
}
