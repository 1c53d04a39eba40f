use std::sync::Arc;
use std::time::Duration;

use herald_events::{
    Event, EventId, EventLog, ReplayPolicy, Server, ServerConfig, Subscriber, Subscription,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, advance, sleep};

fn drain_ids(subscription: &mut Subscription) -> Vec<EventId> {
    let mut ids = Vec::new();
    while let Some(event) = subscription.try_recv() {
        ids.extend(event.sequence());
    }
    ids
}

async fn settle(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        sleep(Duration::from_millis(5)).await;
    }
    done()
}

#[tokio::test(start_paused = true)]
async fn late_subscriber_receives_only_the_retained_window() -> anyhow::Result<()> {
    let server = Server::new(ServerConfig {
        replay: ReplayPolicy::new(Duration::from_millis(100), 0)?,
        ..ServerConfig::default()
    });
    let _ = server.create_stream("messages")?;
    let mut early = server.subscribe("messages", 0)?;

    for n in 0..300 {
        let _ = server.publish("messages", Event::new(format!("ping {n}")))?;
        advance(Duration::from_millis(1)).await;
    }

    let mut late = server.subscribe("messages", 0)?;
    let _ = server.publish("messages", Event::new("after"))?;

    let early_ids = drain_ids(&mut early);
    let late_ids = drain_ids(&mut late);

    assert_eq!(early_ids, (0..=300).collect::<Vec<_>>());
    assert_eq!(
        late_ids,
        (200..=300).collect::<Vec<_>>(),
        "only the last 100ms of events plus the live one"
    );
    assert!(early_ids.len() - late_ids.len() >= 200);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn capacity_scenario_settles_at_three() -> anyhow::Result<()> {
    let log = EventLog::with_limits(Duration::from_secs(10), 3)?;
    for n in 0..3 {
        let _ = log.add(Event::new(format!("{n}")));
    }
    assert_eq!(log.len(), 3);

    let _ = log.add(Event::new("3"));
    sleep(Duration::from_millis(10)).await;
    assert_eq!(log.len(), 3);
    assert_eq!(
        log.snapshot().first().and_then(|event| event.sequence()),
        Some(1)
    );

    for n in 4..8 {
        let _ = log.add(Event::new(format!("{n}")));
    }
    sleep(Duration::from_millis(10)).await;
    assert_eq!(log.len(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ttl_scenario_expires_after_window() -> anyhow::Result<()> {
    let log = EventLog::with_limits(Duration::from_millis(100), 0)?;
    let _ = log.add(Event::new("only"));

    advance(Duration::from_millis(50)).await;
    log.clean_up();
    assert_eq!(log.len(), 1);

    advance(Duration::from_millis(100)).await;
    log.clean_up();
    assert_eq!(log.len(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_publishers_settle_under_capacity() -> anyhow::Result<()> {
    const CAPACITY: usize = 50;
    let log = EventLog::with_limits(Duration::from_secs(60), CAPACITY)?;

    let mut publishers = Vec::new();
    for publisher in 0..4 {
        let log = log.clone();
        publishers.push(tokio::spawn(async move {
            for n in 0..500 {
                let _ = log.add(Event::new(format!("{publisher}-{n}")));
                if n % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
        }));
    }

    let mut readers = Vec::new();
    for _ in 0..4 {
        let log = log.clone();
        readers.push(tokio::spawn(async move {
            let mut orderly = true;
            for _ in 0..20 {
                let (sender, mut receiver) = mpsc::unbounded_channel::<Arc<Event>>();
                log.replay(&Subscriber::new(0, sender));
                let mut previous = None;
                while let Ok(event) = receiver.try_recv() {
                    let id = event.sequence();
                    orderly &= previous < id;
                    previous = id;
                }
                tokio::task::yield_now().await;
            }
            orderly
        }));
    }

    for publisher in publishers {
        publisher.await?;
    }
    for reader in readers {
        assert!(reader.await?, "replay must deliver ascending ids");
    }

    assert!(settle(|| log.len() <= CAPACITY).await, "len {}", log.len());
    assert_eq!(log.last_event_id(), Some(1_999));
    Ok(())
}

#[tokio::test]
async fn subscription_stream_yields_backlog_then_live() -> anyhow::Result<()> {
    use tokio_stream::StreamExt;

    let server = Server::new(ServerConfig::default());
    let stream = server.create_stream("ticks")?;
    let _ = stream.publish(Event::new("a"));
    let _ = stream.publish(Event::new("b"));

    let mut events = server.subscribe("ticks", 1)?.into_stream();
    let _ = stream.publish(Event::new("c"));

    let mut received = Vec::new();
    for _ in 0..2 {
        if let Some(event) = events.next().await {
            received.push(event.data.clone());
        }
    }
    assert_eq!(received, vec![b"b".to_vec(), b"c".to_vec()]);
    Ok(())
}
