//! Visor HUD - Authentication Gate
//!
//! Decides whether a scanned device link requires a credential challenge
//! and validates PIN/token attempts against it.
//!
//! Security posture is fail-closed throughout:
//! - A device with no configured PIN is rejected; there is no
//!   accept-anything fallback for unknown devices.
//! - Unknown auth methods never reach this crate (the link parser rejects
//!   them outright).
//! - PIN attempts are rate limited per device id: 5 consecutive failures
//!   lock the device out for 15 minutes. Lockouts are independent between
//!   devices and expire lazily.
//!
//! Tokens are pre-shared and not guessable, so token validation carries no
//! rate limit.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use visor_auth::AuthGate;
//! use visor_link::parse;
//!
//! let link = parse("visor://v1/pump-7/mqtt/10.0.0.5:1883?auth=pin").unwrap();
//! let mut gate = AuthGate::new()
//!     .with_pins(HashMap::from([("pump-7".to_string(), "4242".to_string())]));
//!
//! assert!(gate.needs_auth(&link));
//! assert!(gate.validate_pin(&link, "0000").is_err());
//! assert!(gate.validate_pin(&link, "4242").is_ok());
//! ```

pub mod error;
pub mod gate;

pub use error::{AuthError, Result};
pub use gate::{AuthGate, AuthPolicy};
