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

//! Herald application bootstrap wiring.
//!
//! Layout: `bootstrap.rs` (environment and logging), `demo.rs` (early/late
//! subscriber replay run), `error.rs`.

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Replay demonstration driven by the binary.
pub mod demo;
/// Application error types.
pub mod error;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
