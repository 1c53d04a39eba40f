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

//! Configuration for the Herald replay broadcaster.
//!
//! Layout: `model.rs` (typed policy and server settings), `validate.rs`
//! (raw value parsing), `loader.rs` (environment loading), `error.rs`.

pub mod error;
pub mod loader;
pub mod model;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    ENV_AUTO_REPLAY, ENV_AUTO_STREAM, ENV_EVENT_TTL_MS, ENV_MAX_CAPACITY, load_from_env, load_with,
};
pub use model::{ReplayPolicy, SWEEP_PERIOD_FACTOR, ServerConfig};
