//! Time- and count-bounded replay log for a single stream.
//!
//! # Design
//! - Entries sit in a `VecDeque` in acceptance order, so the front is always
//!   the oldest entry and both expiry and trimming only ever pop the front.
//! - Capacity is a soft bound. An `add` that reaches the cap schedules a trim
//!   on the runtime and returns; several queued trims may each drop one entry.
//! - Expiring logs own a re-arming sweep task. The task only holds a weak
//!   reference, and is aborted by [`EventLog::close`] or when the last handle
//!   is dropped.

use std::collections::VecDeque;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};
use std::time::Duration;

use chrono::Utc;
use herald_config::ReplayPolicy;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

use crate::error::{EventLogError, EventLogResult};
use crate::event::{Event, EventId};
use crate::subscriber::{EventSink, Subscriber};

#[derive(Debug)]
struct Entry {
    event: Arc<Event>,
    accepted_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.accepted_at) > ttl
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: VecDeque<Entry>,
    next_id: EventId,
}

#[derive(Debug)]
struct Shared {
    policy: ReplayPolicy,
    state: RwLock<LogState>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    fn read_state(&self) -> RwLockReadGuard<'_, LogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sweeper(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.sweeper.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clean_up(&self) -> usize {
        let mut state = self.write_state();
        self.remove_expired(&mut state.entries, Instant::now())
    }

    /// Pops expired entries off the front, stopping at the first live one.
    fn remove_expired(&self, entries: &mut VecDeque<Entry>, now: Instant) -> usize {
        if !self.policy.expires() {
            return 0;
        }
        let ttl = self.policy.ttl();
        let mut removed = 0;
        while entries
            .front()
            .is_some_and(|entry| entry.is_expired(now, ttl))
        {
            entries.pop_front();
            removed += 1;
        }
        removed
    }

    fn enforce_capacity(&self) {
        let mut state = self.write_state();
        let expired = self.remove_expired(&mut state.entries, Instant::now());
        if state.entries.len() > self.policy.max_capacity()
            && let Some(evicted) = state.entries.pop_front()
        {
            debug!(
                evicted_id = evicted.event.id().unwrap_or_default(),
                expired,
                len = state.entries.len(),
                "replay log over capacity; evicted oldest entry"
            );
        } else if expired > 0 {
            trace!(expired, "capacity check freed space by expiry");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let sweeper = self
            .sweeper
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = sweeper {
            handle.abort();
        }
    }
}

async fn run_sweeper(shared: Weak<Shared>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let removed = shared.clean_up();
        if removed > 0 {
            debug!(removed, "expiry sweep removed replay entries");
        }
    }
}

/// Bounded log of recently published events for one stream.
///
/// Cloning yields another handle to the same log.
#[derive(Debug, Clone)]
pub struct EventLog {
    shared: Arc<Shared>,
}

impl EventLog {
    /// Create an empty log governed by `policy`.
    ///
    /// When the policy expires entries, a sweep task is spawned on the current
    /// tokio runtime with a period of three times the TTL.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::RuntimeUnavailable`] when an expiring log is
    /// created outside a tokio runtime.
    pub fn new(policy: ReplayPolicy) -> EventLogResult<Self> {
        let shared = Arc::new(Shared {
            policy,
            state: RwLock::new(LogState::default()),
            sweeper: Mutex::new(None),
        });

        if let Some(period) = policy.sweep_period() {
            let runtime = Handle::try_current().map_err(|_| EventLogError::RuntimeUnavailable)?;
            let handle = runtime.spawn(run_sweeper(Arc::downgrade(&shared), period));
            *shared.lock_sweeper() = Some(handle);
            debug!(?period, ttl = ?policy.ttl(), "scheduled replay expiry sweep");
        }

        Ok(Self { shared })
    }

    /// Create a log from bare limits.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::InvalidPolicy`] when the limits are rejected,
    /// or any error from [`EventLog::new`].
    pub fn with_limits(ttl: Duration, max_capacity: usize) -> EventLogResult<Self> {
        let policy = ReplayPolicy::new(ttl, max_capacity)
            .map_err(|source| EventLogError::InvalidPolicy { source })?;
        Self::new(policy)
    }

    /// Retention policy governing this log.
    #[must_use]
    pub fn policy(&self) -> ReplayPolicy {
        self.shared.policy
    }

    /// Accept an event, stamping its id and timestamp.
    ///
    /// Events without content are discarded and `None` is returned. Reaching
    /// the capacity cap schedules a background trim; the call itself never
    /// waits for it.
    pub fn add(&self, mut event: Event) -> Option<Arc<Event>> {
        if !event.has_content() {
            return None;
        }

        let (event, len) = {
            let mut state = self.shared.write_state();
            let accepted_at = Instant::now();
            let id = state.next_id;
            state.next_id += 1;
            event.stamp(id, Utc::now());
            let event = Arc::new(event);
            state.entries.push_back(Entry {
                event: Arc::clone(&event),
                accepted_at,
            });
            (event, state.entries.len())
        };

        let max_capacity = self.shared.policy.max_capacity();
        if max_capacity > 0 && len >= max_capacity {
            self.schedule_trim();
        }
        Some(event)
    }

    fn schedule_trim(&self) {
        let shared = Arc::clone(&self.shared);
        match Handle::try_current() {
            Ok(runtime) => {
                drop(runtime.spawn(async move { shared.enforce_capacity() }));
            }
            Err(_) => shared.enforce_capacity(),
        }
    }

    /// Discard every entry. Ids restart from zero.
    pub fn clear(&self) {
        let mut state = self.shared.write_state();
        *state = LogState::default();
    }

    /// Remove expired entries now, returning how many were dropped.
    pub fn clean_up(&self) -> usize {
        self.shared.clean_up()
    }

    /// Deliver retained events with `id >= subscriber.last_event_id()` in
    /// acceptance order, returning how many were delivered.
    ///
    /// Entries past their TTL but not yet swept are skipped, as are entries
    /// whose id does not parse. Replay stops early if the sink reports its
    /// receiver is gone.
    pub fn replay<S: EventSink>(&self, subscriber: &Subscriber<S>) -> usize {
        let state = self.shared.read_state();
        let policy = self.shared.policy;
        let now = Instant::now();
        let mut delivered = 0;

        for entry in &state.entries {
            let Some(id) = entry.event.sequence() else {
                trace!(
                    id = entry.event.id().unwrap_or_default(),
                    "skipping replay entry with unparsable id"
                );
                continue;
            };
            if id < subscriber.last_event_id() {
                continue;
            }
            if policy.expires() && entry.is_expired(now, policy.ttl()) {
                continue;
            }
            if !subscriber.deliver(Arc::clone(&entry.event)) {
                debug!(subscriber = %subscriber.id(), delivered, "subscriber detached during replay");
                break;
            }
            delivered += 1;
        }
        delivered
    }

    /// Number of retained entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.read_state().entries.len()
    }

    /// Whether the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.read_state().entries.is_empty()
    }

    /// Id of the newest retained entry.
    #[must_use]
    pub fn last_event_id(&self) -> Option<EventId> {
        self.shared
            .read_state()
            .entries
            .back()
            .and_then(|entry| entry.event.sequence())
    }

    /// Retained events, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.shared
            .read_state()
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.event))
            .collect()
    }

    /// Stop the background expiry sweep. Entries are kept; `clean_up` still
    /// works on demand.
    pub fn close(&self) {
        if let Some(handle) = self.shared.lock_sweeper().take() {
            handle.abort();
            debug!("replay expiry sweep stopped");
        }
    }

    /// Whether a background expiry sweep is still scheduled.
    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.shared
            .lock_sweeper()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    #[cfg(test)]
    fn push_raw(&self, event: Event) {
        self.shared.write_state().entries.push_back(Entry {
            event: Arc::new(event),
            accepted_at: Instant::now(),
        });
    }
}
