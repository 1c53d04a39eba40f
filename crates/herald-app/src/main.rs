#![forbid(unsafe_code)]

//! Binary entrypoint that loads configuration and runs the replay demo.

use herald_app::{AppResult, run_app};

/// Bootstraps the Herald demo and blocks until it finishes.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
