//! Environment loading and service wiring for the `herald` binary.

use herald_config::load_from_env;
use herald_events::Server;
use herald_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, UNKNOWN_BUILD, init_logging};
use tracing::info;

use crate::demo::{DemoSettings, run_demo};
use crate::error::{AppError, AppResult};

/// Log level override; `RUST_LOG` still takes precedence.
pub const ENV_LOG_LEVEL: &str = "HERALD_LOG_LEVEL";
/// Log format selection (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "HERALD_LOG_FORMAT";

/// Load configuration, install logging, and run the replay demo to completion.
///
/// # Errors
///
/// Returns an error if logging cannot be installed, the configuration is
/// invalid, or the demo run fails.
pub async fn run_app() -> AppResult<()> {
    let level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
    let logging = LoggingConfig {
        level: &level,
        format: LogFormat::from_name(std::env::var(ENV_LOG_FORMAT).ok().as_deref())
            .unwrap_or_else(LogFormat::infer),
        build_sha: option_env!("HERALD_BUILD_SHA").unwrap_or(UNKNOWN_BUILD),
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init_logging", err))?;

    let config = load_from_env().map_err(|err| AppError::config("config.load_from_env", err))?;
    let settings = DemoSettings::from_lookup(|key| std::env::var(key).ok())?;
    info!(
        event_ttl = ?config.replay.ttl(),
        max_capacity = config.replay.max_capacity(),
        auto_replay = config.auto_replay,
        stream = %settings.stream_id,
        "starting replay demo"
    );

    let server = Server::new(config);
    let report = run_demo(&server, &settings).await?;
    server.close();

    info!(difference = report.difference(), "shutdown complete");
    Ok(())
}
