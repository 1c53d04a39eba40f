use std::time::Duration;

use herald_config::{ConfigError, ReplayPolicy, ServerConfig};
use serde_json::json;

#[test]
fn json_document_round_trips_through_policy_validation() -> anyhow::Result<()> {
    let config = ServerConfig::from_json(
        r#"{ "replay": { "event_ttl_ms": 100, "max_capacity": 3 }, "auto_stream": true }"#,
    )?;
    assert_eq!(config.replay, ReplayPolicy::new(Duration::from_millis(100), 3)?);
    assert!(config.auto_replay, "absent keys keep their defaults");
    assert!(config.auto_stream);

    let rendered = serde_json::to_value(config)?;
    assert_eq!(
        rendered,
        json!({
            "replay": { "event_ttl_ms": 100, "max_capacity": 3 },
            "auto_replay": true,
            "auto_stream": true,
        })
    );
    Ok(())
}

#[test]
fn json_document_with_negative_ttl_is_rejected() {
    let err = ServerConfig::from_json(r#"{ "replay": { "event_ttl_ms": -10 } }"#)
        .err()
        .expect("negative ttl must fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn empty_document_is_default() -> anyhow::Result<()> {
    assert_eq!(ServerConfig::from_json("{}")?, ServerConfig::default());
    Ok(())
}
