//! Logging setup for binaries.
//!
//! The library itself only emits `tracing` events inside the spans its
//! components were given; installing a subscriber is the caller's choice.

use tracing_subscriber::EnvFilter;

use crate::errors::{Result, StoreError};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"` or `"dynostore=debug"`).
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .map_err(|e| StoreError::Config(format!("cannot install tracing subscriber: {}", e)))
}
