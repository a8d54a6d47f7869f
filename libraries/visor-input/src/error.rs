//! Error types for input backends

use thiserror::Error;

/// Input backend failures.
#[derive(Debug, Error)]
pub enum InputError {
    /// The backend could not be started (missing hardware, port in use, ...)
    #[error("backend failed to start: {0}")]
    StartFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;
