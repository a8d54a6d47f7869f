//! The authentication gate: PIN/token validation with per-device lockout

use crate::error::{AuthError, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use visor_link::LinkDescriptor;

/// Rate-limiting knobs for PIN validation.
#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    /// Consecutive failures allowed before lockout
    pub max_attempts: u32,
    /// How long a locked-out device stays locked
    pub lockout: Duration,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout: Duration::from_secs(15 * 60),
        }
    }
}

/// Per-device failure tracking. Created lazily on the first failed
/// attempt, removed on success or lockout expiry.
#[derive(Debug)]
struct AttemptState {
    failures: u32,
    locked_until: Option<Instant>,
}

/// Decides whether a descriptor needs a credential challenge and validates
/// PIN/token attempts against it.
///
/// All state is per device id and lives for the process lifetime only.
/// There is no accept-any fallback: a device with no configured PIN fails
/// closed.
#[derive(Debug)]
pub struct AuthGate {
    policy: AuthPolicy,
    /// PINs provisioned from the config file
    config_pins: HashMap<String, String>,
    /// Runtime overrides, take precedence over config
    runtime_pins: HashMap<String, String>,
    /// Pre-shared tokens stored at runtime
    tokens: HashMap<String, String>,
    attempts: HashMap<String, AttemptState>,
}

impl Default for AuthGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGate {
    /// Gate with the default policy and no provisioned PINs.
    pub fn new() -> Self {
        Self::with_policy(AuthPolicy::default())
    }

    /// Gate with a custom rate-limiting policy.
    pub fn with_policy(policy: AuthPolicy) -> Self {
        Self {
            policy,
            config_pins: HashMap::new(),
            runtime_pins: HashMap::new(),
            tokens: HashMap::new(),
            attempts: HashMap::new(),
        }
    }

    /// Provision configured PINs (device id -> PIN), builder style.
    pub fn with_pins(mut self, pins: HashMap<String, String>) -> Self {
        self.config_pins = pins;
        self
    }

    /// Whether this descriptor requires a credential challenge.
    pub fn needs_auth(&self, link: &LinkDescriptor) -> bool {
        link.auth().requires_credential()
    }

    /// Whether the device is currently locked out. Expired lockouts are
    /// cleared (failure counter included) as a side effect.
    pub fn is_locked_out(&mut self, device_id: &str) -> bool {
        self.active_lockout(device_id).is_some()
    }

    /// Time left on the device's lockout, zero when not locked out.
    pub fn lockout_remaining(&mut self, device_id: &str) -> Duration {
        self.active_lockout(device_id).unwrap_or(Duration::ZERO)
    }

    /// Validate a PIN attempt for the device named by the descriptor.
    ///
    /// Returns the candidate as the credential on success. Order of checks:
    /// lockout (does not consume an attempt), configured-PIN lookup
    /// (runtime override wins), match, then failure accounting.
    pub fn validate_pin(&mut self, link: &LinkDescriptor, candidate: &str) -> Result<String> {
        let id = link.id();

        if let Some(remaining) = self.active_lockout(id) {
            warn!(device = %id, remaining_secs = remaining.as_secs(), "PIN attempt while locked out");
            return Err(AuthError::LockedOut(remaining));
        }

        let Some(expected) = self
            .runtime_pins
            .get(id)
            .or_else(|| self.config_pins.get(id))
        else {
            warn!(device = %id, "no PIN configured, rejecting");
            return Err(AuthError::PinNotConfigured);
        };

        if candidate == expected {
            info!(device = %id, "PIN accepted");
            self.attempts.remove(id);
            return Ok(candidate.to_string());
        }

        let state = self.attempts.entry(id.to_string()).or_insert(AttemptState {
            failures: 0,
            locked_until: None,
        });
        state.failures += 1;
        warn!(
            device = %id,
            attempt = state.failures,
            max = self.policy.max_attempts,
            "invalid PIN"
        );

        if state.failures >= self.policy.max_attempts {
            state.locked_until = Some(Instant::now() + self.policy.lockout);
            warn!(
                device = %id,
                lockout_secs = self.policy.lockout.as_secs(),
                "device locked out after repeated failures"
            );
            return Err(AuthError::AttemptsExhausted(self.policy.lockout));
        }

        Err(AuthError::InvalidPin(
            self.policy.max_attempts - state.failures,
        ))
    }

    /// Validate the stored token for the device named by the descriptor.
    ///
    /// Tokens are pre-shared, not guessable, so there is no rate limiting.
    pub fn validate_token(&mut self, link: &LinkDescriptor) -> Result<String> {
        match self.tokens.get(link.id()) {
            Some(token) => {
                info!(device = %link.id(), "stored token found");
                Ok(token.clone())
            }
            None => {
                warn!(device = %link.id(), "no token stored");
                Err(AuthError::TokenNotStored)
            }
        }
    }

    /// Store a runtime PIN override for a device, effective immediately.
    pub fn store_pin(&mut self, device_id: impl Into<String>, pin: impl Into<String>) {
        self.runtime_pins.insert(device_id.into(), pin.into());
    }

    /// Store a token for a device, effective immediately.
    pub fn store_token(&mut self, device_id: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(device_id.into(), token.into());
    }

    /// Remaining lockout for the device, lazily clearing expired entries.
    fn active_lockout(&mut self, device_id: &str) -> Option<Duration> {
        let until = self.attempts.get(device_id)?.locked_until?;
        let now = Instant::now();
        if now < until {
            Some(until - now)
        } else {
            debug!(device = %device_id, "lockout expired, clearing failure counter");
            self.attempts.remove(device_id);
            None
        }
    }
}
