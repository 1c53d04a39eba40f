//! Typed configuration models for replay policy and stream defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::validate::{capacity_from_raw, ttl_from_millis};

/// Multiplier applied to the event TTL to derive the background sweep period.
pub const SWEEP_PERIOD_FACTOR: u32 = 3;

const NANOS_PER_MILLI: u32 = 1_000_000;

/// Retention policy for a single replay log.
///
/// A zero `ttl` retains events forever; a zero `max_capacity` leaves the log
/// unbounded. Both limits are validated on construction so a policy in hand is
/// always usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "ReplayPolicyDocument", into = "ReplayPolicyDocument")]
pub struct ReplayPolicy {
    ttl: Duration,
    max_capacity: usize,
}

impl ReplayPolicy {
    /// Policy that never expires and never trims entries.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            ttl: Duration::ZERO,
            max_capacity: 0,
        }
    }

    /// Build a policy from typed limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the sweep period derived from
    /// `ttl` cannot be represented, or when `ttl` is not a whole number of
    /// milliseconds that fits the serialized `event_ttl_ms` field.
    pub fn new(ttl: Duration, max_capacity: usize) -> ConfigResult<Self> {
        if ttl.checked_mul(SWEEP_PERIOD_FACTOR).is_none() {
            return Err(ConfigError::invalid(
                "event_ttl",
                format!("{ttl:?}"),
                "sweep period overflows",
            ));
        }
        if ttl.subsec_nanos() % NANOS_PER_MILLI != 0 || i64::try_from(ttl.as_millis()).is_err() {
            return Err(ConfigError::invalid(
                "event_ttl",
                format!("{ttl:?}"),
                "must be a whole number of milliseconds",
            ));
        }
        Ok(Self { ttl, max_capacity })
    }

    /// Build a policy from signed raw values, as read from the environment or
    /// a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for negative values.
    pub fn from_raw(event_ttl_ms: i64, max_capacity: i64) -> ConfigResult<Self> {
        let ttl = ttl_from_millis("event_ttl_ms", event_ttl_ms)?;
        let max_capacity = capacity_from_raw("max_capacity", max_capacity)?;
        Self::new(ttl, max_capacity)
    }

    /// Retention window; zero means infinite retention.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Soft bound on the number of retained entries; zero means unlimited.
    #[must_use]
    pub const fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Whether entries ever expire by age.
    #[must_use]
    pub const fn expires(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Period of the background expiry sweep, if one is needed.
    #[must_use]
    pub fn sweep_period(&self) -> Option<Duration> {
        if self.expires() {
            self.ttl.checked_mul(SWEEP_PERIOD_FACTOR)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
struct ReplayPolicyDocument {
    event_ttl_ms: i64,
    max_capacity: i64,
}

impl TryFrom<ReplayPolicyDocument> for ReplayPolicy {
    type Error = ConfigError;

    fn try_from(document: ReplayPolicyDocument) -> ConfigResult<Self> {
        Self::from_raw(document.event_ttl_ms, document.max_capacity)
    }
}

impl From<ReplayPolicy> for ReplayPolicyDocument {
    fn from(policy: ReplayPolicy) -> Self {
        Self {
            event_ttl_ms: i64::try_from(policy.ttl.as_millis()).unwrap_or(i64::MAX),
            max_capacity: i64::try_from(policy.max_capacity).unwrap_or(i64::MAX),
        }
    }
}

/// Defaults applied by the stream registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Replay policy handed to every stream created by the registry.
    pub replay: ReplayPolicy,
    /// Whether streams retain published events and replay them to new
    /// subscribers.
    pub auto_replay: bool,
    /// Whether subscribing to an unknown stream creates it on the fly.
    pub auto_stream: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            replay: ReplayPolicy::unbounded(),
            auto_replay: true,
            auto_stream: false,
        }
    }
}

impl ServerConfig {
    /// Parse a JSON configuration document, applying defaults for absent keys.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed or a
    /// replay limit is invalid.
    pub fn from_json(document: &str) -> ConfigResult<Self> {
        serde_json::from_str(document).map_err(|source| ConfigError::Parse { source })
    }
}
