//! Tracing initialization.
//!
//! Structured, async-aware logging via `tracing` and `tracing-subscriber`.
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! log level.

use crate::error::{AppResult, DoorcamError};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Safe to call once per process; a second call reports an error rather than
/// panicking so tests can share a process.
pub fn init(default_level: &str) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| DoorcamError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| DoorcamError::Logging(e.to_string()))
}
