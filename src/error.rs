//! Custom error types for the application.
//!
//! `DoorcamError` consolidates the failure sources the controller can see
//! locally: configuration loading, logging setup, and corrupt persisted
//! records. Collaborator traits (`hardware::capabilities`) use
//! `anyhow::Result` at the boundary instead. Nothing propagates an error
//! across a task boundary: transient failures are handled where they occur
//! and fatal conditions resolve to a device restart.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DoorcamError>;

#[derive(Error, Debug)]
pub enum DoorcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Logging initialization error: {0}")]
    Logging(String),

    #[error("Corrupt gallery slot {slot}: {reason}")]
    CorruptSlot { slot: usize, reason: String },
}
