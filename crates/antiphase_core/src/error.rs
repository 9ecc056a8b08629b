//! Engine Error Types
//!
//! Only configuration and thread management can fail. The frame callback and
//! the analysis reads always produce a value.

use thiserror::Error;

/// Errors that can occur in the audio session
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Session configuration error: {0}")]
    ConfigError(String),

    #[error("Cannot reconfigure a running session - stop it first")]
    ReconfigureWhileRunning,

    #[error("Frame source already running")]
    AlreadyRunning,

    #[error("Invalid buffer slot: {0} (must be 0 or 1)")]
    InvalidSlot(usize),

    #[error("Failed to spawn thread: {0}")]
    ThreadSpawnError(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
