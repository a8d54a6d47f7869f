//! Stdin keyboard backend
//!
//! Line-based dev input: type a command character (or several) and press
//! enter. A dedicated thread does the blocking reads and feeds a channel
//! the session loop polls.
//!
//! Key map (mirrors the wearable controller's pad layout):
//!   w/a/s/d   navigate (or spin/select digits in numeric mode)
//!   enter     confirm / submit
//!   x         cancel / back
//!   h         device list
//!   n / p     next / previous device
//!   0-9       direct digit entry (numeric mode)
//!   q         quit

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use visor_input::{EventKind, InputBackend, InputEvent};

const SOURCE: &str = "keyboard";

pub struct KeyboardBackend {
    events: Option<mpsc::UnboundedReceiver<InputEvent>>,
    numeric: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
}

impl KeyboardBackend {
    pub fn new() -> Self {
        Self {
            events: None,
            numeric: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for KeyboardBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBackend for KeyboardBackend {
    fn name(&self) -> &'static str {
        "keyboard"
    }

    fn start(&mut self) -> visor_input::Result<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(rx);
        self.running.store(true, Ordering::SeqCst);

        let numeric = Arc::clone(&self.numeric);
        let running = Arc::clone(&self.running);
        std::thread::Builder::new()
            .name("keyboard-stdin".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    let Ok(line) = line else { break };
                    for event in map_line(&line, numeric.load(Ordering::SeqCst)) {
                        debug!(kind = ?event.kind, "keyboard event");
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
            })?;
        Ok(())
    }

    fn stop(&mut self) {
        // The reader thread may be blocked in read_line; flag it stopped
        // and let it exit on its next line. Its queue is dropped here.
        self.running.store(false, Ordering::SeqCst);
        self.events = None;
    }

    fn poll(&mut self) -> Option<InputEvent> {
        self.events.as_mut()?.try_recv().ok()
    }

    fn is_available(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_numeric_mode(&mut self, enabled: bool) {
        self.numeric.store(enabled, Ordering::SeqCst);
    }
}

/// Map one typed line to events. An empty line is the enter key.
fn map_line(line: &str, numeric: bool) -> Vec<InputEvent> {
    if line.is_empty() {
        return vec![InputEvent::new(EventKind::Confirm, SOURCE)];
    }
    line.chars()
        .filter_map(|c| map_char(c, numeric))
        .map(|kind| InputEvent::new(kind, SOURCE))
        .collect()
}

fn map_char(c: char, numeric: bool) -> Option<EventKind> {
    if numeric {
        if let Some(digit) = c.to_digit(10) {
            return Some(EventKind::Digit(digit as u8));
        }
        return match c {
            'w' => Some(EventKind::DigitUp),
            's' => Some(EventKind::DigitDown),
            'a' => Some(EventKind::DigitPrev),
            'd' => Some(EventKind::DigitNext),
            'x' => Some(EventKind::Cancel),
            'q' => Some(EventKind::Quit),
            _ => None,
        };
    }
    match c {
        'w' => Some(EventKind::NavUp),
        's' => Some(EventKind::NavDown),
        'a' => Some(EventKind::NavLeft),
        'd' => Some(EventKind::NavRight),
        'x' => Some(EventKind::Cancel),
        'h' => Some(EventKind::Home),
        'n' => Some(EventKind::NextDevice),
        'p' => Some(EventKind::PrevDevice),
        'q' => Some(EventKind::Quit),
        _ => None,
    }
}
