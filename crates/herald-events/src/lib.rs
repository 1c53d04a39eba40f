#![forbid(unsafe_code)]
#![warn(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Replay buffer and stream registry for server-push event broadcasting.
//!
//! Each stream keeps an [`EventLog`] of recently published events so a client
//! reconnecting with `Last-Event-ID` can be replayed what it missed. Retention
//! is bounded by age (the TTL, swept periodically) and softly by count (the
//! capacity, trimmed in the background after an overflowing publish).
//!
//! Layout: `event.rs` (payload), `log.rs` (replay log), `subscriber.rs`
//! (delivery seam), `stream.rs` (log plus live subscribers), `server.rs`
//! (stream registry), `error.rs`.

pub mod error;
pub mod event;
pub mod log;
pub mod server;
pub mod stream;
pub mod subscriber;

pub use error::{EventLogError, EventLogResult, ServerError, ServerResult};
pub use event::{Event, EventId};
pub use herald_config::{ReplayPolicy, ServerConfig};
pub use log::EventLog;
pub use server::Server;
pub use stream::{EventStream, Stream, Subscription};
pub use subscriber::{EventSink, Subscriber};
