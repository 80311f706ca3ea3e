//! Tracing initialization for binary consumers (§10.1). Library crates
//! in this workspace never install a global subscriber — only this
//! facade does, and only when a consumer opts in by calling this.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing-subscriber` `EnvFilter` subscriber reading from
/// `RUST_LOG` (falling back to `info`). Call once, near the top of
/// `main`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
