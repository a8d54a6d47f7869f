//! Input event vocabulary
//!
//! Every input source (keyboard, remote control, wearable controller)
//! produces [`InputEvent`]s; the session state machine consumes them
//! uniformly regardless of origin.

use std::time::Instant;

/// What an input event means, independent of which backend produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // Navigation
    NavUp,
    NavDown,
    NavLeft,
    NavRight,
    Confirm,
    Cancel,
    Home,

    // PIN/numeric entry
    /// Increment the selected digit
    DigitUp,
    /// Decrement the selected digit
    DigitDown,
    /// Move to the next digit
    DigitNext,
    /// Move to the previous digit
    DigitPrev,
    /// Submit the full number
    DigitSubmit,
    /// Direct digit entry (numpad-style)
    Digit(u8),
    /// Zero the selected digit and move back
    Backspace,

    // Device management
    NextDevice,
    PrevDevice,

    // System
    /// A link URL was scanned or pasted; the payload carries it
    LinkScanned,
    /// Out-of-band credential accepted (e.g. phone biometric confirm)
    AuthBypass,
    Quit,
}

/// One event from one backend, timestamped at creation.
#[derive(Debug, Clone)]
pub struct InputEvent {
    /// What happened
    pub kind: EventKind,
    /// Event-specific data (e.g. the scanned URL for [`EventKind::LinkScanned`])
    pub payload: Option<String>,
    /// Name of the backend that produced the event
    pub source: &'static str,
    /// Monotonic creation time
    pub at: Instant,
}

impl InputEvent {
    /// Event without a payload.
    pub fn new(kind: EventKind, source: &'static str) -> Self {
        Self {
            kind,
            payload: None,
            source,
            at: Instant::now(),
        }
    }

    /// Event carrying a payload string.
    pub fn with_payload(kind: EventKind, payload: impl Into<String>, source: &'static str) -> Self {
        Self {
            kind,
            payload: Some(payload.into()),
            source,
            at: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_travels_with_the_event() {
        let event = InputEvent::with_payload(
            EventKind::LinkScanned,
            "visor://v1/dev/mqtt/host:1883",
            "test",
        );
        assert_eq!(event.kind, EventKind::LinkScanned);
        assert_eq!(event.payload.as_deref(), Some("visor://v1/dev/mqtt/host:1883"));
        assert_eq!(event.source, "test");
    }
}
