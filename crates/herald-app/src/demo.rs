//! Early/late subscriber replay demonstration.
//!
//! A publisher pings one stream at a fixed cadence. One subscriber attaches
//! straight away, a second joins late with `Last-Event-ID: 0`; with an
//! expiring policy the late one only gets the retained window replayed
//! before it catches up with the live feed.

use std::sync::Arc;
use std::time::Duration;

use herald_events::{Event, Server, Stream, Subscription};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep, sleep_until, timeout_at};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Stream name used by the demo.
pub const ENV_DEMO_STREAM: &str = "HERALD_DEMO_STREAM";
/// Publish cadence in milliseconds.
pub const ENV_DEMO_PUBLISH_MS: &str = "HERALD_DEMO_PUBLISH_MS";
/// Delay before the late subscriber joins, in milliseconds.
pub const ENV_DEMO_LATE_JOIN_MS: &str = "HERALD_DEMO_LATE_JOIN_MS";
/// Total run time in milliseconds.
pub const ENV_DEMO_RUN_MS: &str = "HERALD_DEMO_RUN_MS";

/// Knobs for one demo run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoSettings {
    /// Stream to publish on.
    pub stream_id: String,
    /// Interval between published events.
    pub publish_interval: Duration,
    /// Delay before the late subscriber attaches.
    pub late_join_delay: Duration,
    /// Total duration of the run.
    pub run_for: Duration,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            stream_id: "messages".to_string(),
            publish_interval: Duration::from_millis(1),
            late_join_delay: Duration::from_millis(300),
            run_for: Duration::from_secs(1),
        }
    }
}

impl DemoSettings {
    /// Read settings through `lookup`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidConfig`] for non-numeric or zero durations,
    /// or a late join that would happen after the run ends.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            stream_id: lookup(ENV_DEMO_STREAM).unwrap_or(defaults.stream_id),
            publish_interval: millis(&lookup, ENV_DEMO_PUBLISH_MS, "demo_publish_ms")?
                .unwrap_or(defaults.publish_interval),
            late_join_delay: millis(&lookup, ENV_DEMO_LATE_JOIN_MS, "demo_late_join_ms")?
                .unwrap_or(defaults.late_join_delay),
            run_for: millis(&lookup, ENV_DEMO_RUN_MS, "demo_run_ms")?.unwrap_or(defaults.run_for),
        };

        if settings.late_join_delay >= settings.run_for {
            return Err(AppError::InvalidConfig {
                field: "demo_late_join_ms",
                reason: "must be shorter than the run",
                value: Some(settings.late_join_delay.as_millis().to_string()),
            });
        }
        Ok(settings)
    }
}

fn millis<F>(lookup: &F, key: &str, field: &'static str) -> AppResult<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(AppError::InvalidConfig {
            field,
            reason: "zero",
            value: Some(raw),
        }),
        Ok(value) => Ok(Some(Duration::from_millis(value))),
        Err(_) => Err(AppError::InvalidConfig {
            field,
            reason: "not a positive integer",
            value: Some(raw),
        }),
    }
}

/// Outcome of a demo run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoReport {
    /// Events accepted by the stream.
    pub published: u64,
    /// Events received by the subscriber that joined first.
    pub early: u64,
    /// Events received by the late subscriber, replay included.
    pub late: u64,
}

impl DemoReport {
    /// How many more events the early subscriber saw.
    #[must_use]
    pub const fn difference(&self) -> u64 {
        self.early.saturating_sub(self.late)
    }
}

/// Run the demo against `server`, removing the stream afterwards.
///
/// # Errors
///
/// Returns an error when the stream cannot be created or subscribed to, or
/// when a demo task fails.
pub async fn run_demo(server: &Server, settings: &DemoSettings) -> AppResult<DemoReport> {
    let policy = server.config().replay;
    if !policy.expires() {
        warn!("replay policy never expires events; the late subscriber will see full history");
    }

    let stream = server
        .create_stream(&settings.stream_id)
        .map_err(|err| AppError::server("server.create_stream", err))?;
    let deadline = Instant::now() + settings.run_for;

    let early = server
        .subscribe(&settings.stream_id, 0)
        .map_err(|err| AppError::server("server.subscribe_early", err))?;
    let early_task = tokio::spawn(count_until(early, deadline));
    let publisher = tokio::spawn(publish_until(
        Arc::clone(&stream),
        settings.publish_interval,
        deadline,
    ));

    sleep(settings.late_join_delay).await;
    let late = server
        .subscribe(&settings.stream_id, 0)
        .map_err(|err| AppError::server("server.subscribe_late", err))?;
    info!(
        retained = stream.event_log().len(),
        "late subscriber attached"
    );
    let late_task = tokio::spawn(count_until(late, deadline));

    let published = publisher
        .await
        .map_err(|err| AppError::join("demo.publisher", err))?;
    let early = early_task
        .await
        .map_err(|err| AppError::join("demo.early_subscriber", err))?;
    let late = late_task
        .await
        .map_err(|err| AppError::join("demo.late_subscriber", err))?;
    server.remove_stream(&settings.stream_id);

    let report = DemoReport {
        published,
        early,
        late,
    };
    info!(
        published = report.published,
        early = report.early,
        late = report.late,
        difference = report.difference(),
        "replay demo finished"
    );
    Ok(report)
}

async fn publish_until(stream: Arc<Stream>, every: Duration, deadline: Instant) -> u64 {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut published = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if stream.publish(Event::new("ping")).is_some() {
                    published += 1;
                }
            }
            () = sleep_until(deadline) => break,
        }
    }
    published
}

async fn count_until(mut subscription: Subscription, deadline: Instant) -> u64 {
    let mut received = 0;
    while let Ok(Some(_)) = timeout_at(deadline, subscription.recv()).await {
        received += 1;
    }
    received
}
