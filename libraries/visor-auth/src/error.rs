//! Error types for the authentication gate

use std::time::Duration;
use thiserror::Error;

/// Why an authentication attempt was refused.
///
/// Every variant's `Display` is safe to show on the HUD as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The device is locked out from earlier failures; the attempt was not
    /// consumed.
    #[error("locked out, try again in {} min", minutes_ceil(.0))]
    LockedOut(Duration),

    /// No PIN is configured for this device. Unknown devices are rejected,
    /// never waved through.
    #[error("no PIN configured for this device")]
    PinNotConfigured,

    /// Wrong PIN, attempts remaining before lockout.
    #[error("invalid PIN ({0} attempts left)")]
    InvalidPin(u32),

    /// Wrong PIN and the attempt budget is spent; lockout starts now.
    #[error("too many attempts, locked for {} min", minutes_ceil(.0))]
    AttemptsExhausted(Duration),

    /// No token stored for this device.
    #[error("no token configured")]
    TokenNotStored,
}

fn minutes_ceil(d: &Duration) -> u64 {
    d.as_secs().div_ceil(60)
}

/// Result type for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;
