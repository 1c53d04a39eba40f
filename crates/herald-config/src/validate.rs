//! Validation helpers and parsing utilities for raw configuration values.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

pub(crate) fn parse_integer(field: &'static str, raw: &str) -> ConfigResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::invalid(field, raw, "must be an integer"))
}

pub(crate) fn parse_flag(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, raw, "must be a boolean flag")),
    }
}

pub(crate) fn ttl_from_millis(field: &'static str, millis: i64) -> ConfigResult<Duration> {
    let millis =
        u64::try_from(millis).map_err(|_| ConfigError::invalid(field, millis, "must not be negative"))?;
    Ok(Duration::from_millis(millis))
}

pub(crate) fn capacity_from_raw(field: &'static str, capacity: i64) -> ConfigResult<usize> {
    if capacity < 0 {
        return Err(ConfigError::invalid(field, capacity, "must not be negative"));
    }
    usize::try_from(capacity)
        .map_err(|_| ConfigError::invalid(field, capacity, "exceeds the platform word size"))
}
