//! Digit-by-digit PIN entry working state
//!
//! Models the numeric challenge UI: a row of digits, a cursor, and an
//! error line after a rejected attempt. Navigation events move the cursor
//! and spin digit values; numpad-style backends enter digits directly.

use visor_input::EventKind;

/// In-progress PIN entry while the session is authenticating.
#[derive(Debug)]
pub struct PinEntry {
    digits: Vec<u8>,
    cursor: usize,
    error: Option<String>,
    device: String,
    hint: Option<String>,
}

impl PinEntry {
    /// Fresh entry of `length` digits, all zero, cursor on the first.
    pub fn new(length: usize, device: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            digits: vec![0; length.max(1)],
            cursor: 0,
            error: None,
            device: device.into(),
            hint,
        }
    }

    /// Feed one input event into the entry.
    ///
    /// Returns `true` when the event submits the PIN; cursor/digit events
    /// mutate the entry and return `false`. Events outside the numeric
    /// vocabulary are ignored.
    pub fn apply(&mut self, kind: EventKind) -> bool {
        let last = self.digits.len() - 1;
        match kind {
            EventKind::Digit(n) if n <= 9 => {
                self.digits[self.cursor] = n;
                self.cursor = (self.cursor + 1).min(last);
                self.error = None;
            }
            EventKind::Backspace => {
                self.digits[self.cursor] = 0;
                self.cursor = self.cursor.saturating_sub(1);
                self.error = None;
            }
            EventKind::DigitUp | EventKind::NavUp => {
                self.digits[self.cursor] = (self.digits[self.cursor] + 1) % 10;
                self.error = None;
            }
            EventKind::DigitDown | EventKind::NavDown => {
                self.digits[self.cursor] = (self.digits[self.cursor] + 9) % 10;
                self.error = None;
            }
            EventKind::DigitNext | EventKind::NavRight => {
                self.cursor = (self.cursor + 1).min(last);
            }
            EventKind::DigitPrev | EventKind::NavLeft => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            EventKind::DigitSubmit | EventKind::Confirm => return true,
            _ => {}
        }
        false
    }

    /// The entered PIN as a digit string.
    pub fn value(&self) -> String {
        self.digits.iter().map(|d| char::from(b'0' + d)).collect()
    }

    /// Reject the attempt: show the error and reset digits for a retry.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.digits.fill(0);
        self.cursor = 0;
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Display name of the device being unlocked.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Device-provided auth hint, if any.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> PinEntry {
        PinEntry::new(4, "dev", None)
    }

    #[test]
    fn starts_zeroed() {
        let entry = entry();
        assert_eq!(entry.value(), "0000");
        assert_eq!(entry.cursor(), 0);
        assert_eq!(entry.error(), None);
    }

    #[test]
    fn rotary_entry_wraps_digits() {
        let mut entry = entry();
        assert!(!entry.apply(EventKind::DigitUp));
        assert_eq!(entry.value(), "1000");

        entry.apply(EventKind::DigitDown);
        entry.apply(EventKind::DigitDown);
        assert_eq!(entry.value(), "9000");
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut entry = entry();
        entry.apply(EventKind::DigitPrev);
        assert_eq!(entry.cursor(), 0);

        for _ in 0..6 {
            entry.apply(EventKind::DigitNext);
        }
        assert_eq!(entry.cursor(), 3);
    }

    #[test]
    fn direct_digits_advance_the_cursor() {
        let mut entry = entry();
        for n in [1, 2, 3, 4] {
            entry.apply(EventKind::Digit(n));
        }
        assert_eq!(entry.value(), "1234");
        // Cursor stays on the last digit; another digit overwrites it.
        entry.apply(EventKind::Digit(9));
        assert_eq!(entry.value(), "1239");
    }

    #[test]
    fn backspace_zeroes_and_retreats() {
        let mut entry = entry();
        entry.apply(EventKind::Digit(1));
        entry.apply(EventKind::Digit(2));
        entry.apply(EventKind::Backspace);
        assert_eq!(entry.value(), "1000");
        assert_eq!(entry.cursor(), 1);
    }

    #[test]
    fn submit_via_confirm_or_digit_submit() {
        let mut entry = entry();
        assert!(entry.apply(EventKind::Confirm));
        assert!(entry.apply(EventKind::DigitSubmit));
        assert!(!entry.apply(EventKind::NavLeft));
    }

    #[test]
    fn reject_resets_for_retry() {
        let mut entry = entry();
        for n in [1, 2, 3, 4] {
            entry.apply(EventKind::Digit(n));
        }
        entry.reject("invalid PIN (4 attempts left)");

        assert_eq!(entry.value(), "0000");
        assert_eq!(entry.cursor(), 0);
        assert_eq!(entry.error(), Some("invalid PIN (4 attempts left)"));

        // The next edit clears the error line.
        entry.apply(EventKind::DigitUp);
        assert_eq!(entry.error(), None);
    }

    #[test]
    fn nav_events_double_as_digit_events() {
        let mut entry = entry();
        entry.apply(EventKind::NavUp);
        entry.apply(EventKind::NavRight);
        entry.apply(EventKind::NavUp);
        assert_eq!(entry.value(), "1100");
    }
}
