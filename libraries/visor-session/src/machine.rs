//! The session state machine
//!
//! One cooperative loop ties the whole HUD together: poll one input event,
//! apply at most one transition, render the current state, 20 times a
//! second. Everything long-lived (the wire, input listeners) runs in its
//! own background worker and feeds this loop through queues; the only
//! state a worker writes directly is the mutex-guarded latest sample.

use crate::frame::{DeviceSummary, Frame, LinkSource, Renderer};
use crate::pin::PinEntry;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use visor_auth::AuthGate;
use visor_input::{EventKind, InputEvent, InputManager};
use visor_link::{parse, AuthMethod, LinkDescriptor};
use visor_transport::{ConnectionManager, DataCallback, MetaCallback};

/// Session loop knobs.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Foreground loop period
    pub tick: Duration,
    /// Digits in the PIN challenge
    pub pin_length: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            pin_length: 4,
        }
    }
}

/// The session protocol states. Exactly one value is live at a time;
/// state-specific working data travels inside the variant.
#[derive(Debug)]
pub enum SessionState {
    /// Waiting for a link scan
    Scanning,
    /// Credential challenge for `pending` before it may connect
    Authenticating {
        pending: LinkDescriptor,
        entry: PinEntry,
    },
    /// Wire handshake in progress (transient within a tick)
    Connecting { device: String },
    /// Live data from the active device
    Streaming,
    /// Browsing known devices; selection is clamped, no wraparound
    DeviceList { selected: usize },
    /// Blocking error; confirm/cancel resumes at `return_to`
    Error {
        message: String,
        return_to: Box<SessionState>,
    },
}

impl SessionState {
    /// Stable variant name for logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Scanning => "scanning",
            SessionState::Authenticating { .. } => "authenticating",
            SessionState::Connecting { .. } => "connecting",
            SessionState::Streaming => "streaming",
            SessionState::DeviceList { .. } => "device-list",
            SessionState::Error { .. } => "error",
        }
    }
}

enum AuthAction {
    Stay,
    Cancel,
    Proceed,
}

/// The session controller: orchestrates connection management, the auth
/// gate and merged input against the state protocol, and drives the
/// renderer.
pub struct Session {
    conn: ConnectionManager,
    auth: AuthGate,
    input: InputManager,
    renderer: Box<dyn Renderer>,
    scanner: Option<Box<dyn LinkSource>>,
    state: SessionState,
    latest: Arc<Mutex<Option<Value>>>,
    running: bool,
    config: SessionConfig,
}

impl Session {
    pub fn new(
        conn: ConnectionManager,
        auth: AuthGate,
        input: InputManager,
        renderer: Box<dyn Renderer>,
        config: SessionConfig,
    ) -> Self {
        Self {
            conn,
            auth,
            input,
            renderer,
            scanner: None,
            state: SessionState::Scanning,
            latest: Arc::new(Mutex::new(None)),
            running: true,
            config,
        }
    }

    /// Attach a link source polled while scanning (builder style).
    pub fn with_link_source(mut self, scanner: Box<dyn LinkSource>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Current state (read-only; transitions happen only inside the loop).
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Skip scanning and start the connect flow for a known descriptor
    /// (demo mode). Runs the same auth gate as a scanned link.
    pub async fn start_with(&mut self, link: LinkDescriptor) {
        self.initiate(link).await;
    }

    /// Run the session loop until quit, then tear everything down.
    pub async fn run(&mut self) {
        self.input.start();
        let mut ticker = tokio::time::interval(self.config.tick);

        while self.running {
            ticker.tick().await;
            self.step().await;
        }

        info!("session loop ended, shutting down");
        self.input.stop();
        self.conn.disconnect().await;
    }

    /// One tick: at most one event, at most one transition, one render.
    ///
    /// Bursts of input drain one event per tick by design; ticks are never
    /// coalesced.
    pub async fn step(&mut self) {
        let scanned = if matches!(self.state, SessionState::Scanning) {
            self.scanner.as_mut().and_then(|s| s.poll_link())
        } else {
            None
        };

        if let Some(raw) = scanned {
            self.handle_scanned(raw).await;
        } else if let Some(event) = self.input.poll() {
            self.handle_event(event).await;
        }

        self.render();
    }

    // -- Connection flow --

    async fn handle_scanned(&mut self, raw: String) {
        match parse(&raw) {
            Ok(link) => {
                info!(device = %link.id(), transport = %link.transport(), "link scanned");
                self.initiate(link).await;
            }
            Err(e) => {
                self.enter_error(format!("Invalid link: {e}"), SessionState::Scanning);
            }
        }
    }

    /// Route a descriptor through the auth gate, then connect.
    async fn initiate(&mut self, link: LinkDescriptor) {
        if !self.auth.needs_auth(&link) {
            self.do_connect(link).await;
            return;
        }

        match link.auth() {
            // Tokens are pre-shared; no challenge screen.
            AuthMethod::Token => match self.auth.validate_token(&link) {
                Ok(_) => self.do_connect(link).await,
                Err(e) => {
                    self.enter_error(format!("Auth failed: {e}"), SessionState::Scanning);
                }
            },
            method => {
                info!(device = %link.id(), method = %method, "credential challenge required");
                let entry = PinEntry::new(
                    self.config.pin_length,
                    link.display_name(),
                    link.meta().auth_hint.clone(),
                );
                self.input.set_numeric_mode(true);
                self.state = SessionState::Authenticating {
                    pending: link,
                    entry,
                };
            }
        }
    }

    /// Establish the connection. May stall the loop up to the transport's
    /// handshake timeout; only ever reached from an explicit user action.
    async fn do_connect(&mut self, link: LinkDescriptor) {
        let device = link.display_name().to_string();
        let endpoint = link.endpoint();
        self.state = SessionState::Connecting {
            device: device.clone(),
        };
        self.renderer.show(&Frame::Connecting { device });

        *lock_latest(&self.latest) = None;

        let latest = Arc::clone(&self.latest);
        let on_data: DataCallback = Arc::new(move |sample| {
            // Last value wins; the loop only ever renders the newest.
            *lock_latest(&latest) = Some(sample);
        });
        let on_meta: MetaCallback = Arc::new(|update| {
            debug!(name = ?update.name, device_type = ?update.device_type, "device metadata");
        });

        match self.conn.connect(link, on_data, on_meta).await {
            Ok(()) => {
                info!("streaming started");
                self.state = SessionState::Streaming;
            }
            Err(e) => {
                self.enter_error(
                    format!("Cannot connect to {endpoint}: {e}"),
                    SessionState::Scanning,
                );
            }
        }
    }

    // -- Event handling --

    async fn handle_event(&mut self, event: InputEvent) {
        if event.kind == EventKind::Quit {
            info!(source = event.source, "quit requested");
            self.running = false;
            return;
        }

        // Events with no meaning in the current state fall through the
        // per-state handlers and are silently ignored.
        match self.state {
            SessionState::Scanning => self.on_scanning_event(event).await,
            SessionState::Authenticating { .. } => self.on_auth_event(event).await,
            SessionState::Connecting { .. } => {}
            SessionState::Streaming => self.on_streaming_event(event).await,
            SessionState::DeviceList { .. } => self.on_device_list_event(event).await,
            SessionState::Error { .. } => self.on_error_event(event),
        }
    }

    async fn on_scanning_event(&mut self, event: InputEvent) {
        if event.kind == EventKind::LinkScanned {
            match event.payload {
                Some(raw) => self.handle_scanned(raw).await,
                None => warn!(source = event.source, "link event without a payload"),
            }
        }
    }

    async fn on_auth_event(&mut self, event: InputEvent) {
        let action = {
            let SessionState::Authenticating { pending, entry } = &mut self.state else {
                return;
            };
            match event.kind {
                EventKind::Cancel => AuthAction::Cancel,
                // Out-of-band credential accepted (e.g. phone biometric).
                EventKind::AuthBypass => {
                    info!(device = %pending.id(), source = event.source, "out-of-band credential accepted");
                    AuthAction::Proceed
                }
                kind => {
                    if entry.apply(kind) {
                        match self.auth.validate_pin(pending, &entry.value()) {
                            Ok(_) => AuthAction::Proceed,
                            Err(e) => {
                                entry.reject(e.to_string());
                                AuthAction::Stay
                            }
                        }
                    } else {
                        AuthAction::Stay
                    }
                }
            }
        };

        match action {
            AuthAction::Stay => {}
            AuthAction::Cancel => {
                info!("credential entry cancelled");
                self.input.set_numeric_mode(false);
                self.state = SessionState::Scanning;
            }
            AuthAction::Proceed => {
                self.input.set_numeric_mode(false);
                let state = std::mem::replace(&mut self.state, SessionState::Scanning);
                let SessionState::Authenticating { pending, .. } = state else {
                    return;
                };
                self.do_connect(pending).await;
            }
        }
    }

    async fn on_streaming_event(&mut self, event: InputEvent) {
        match event.kind {
            EventKind::NextDevice => {
                if let Some(target) = self.conn.switch_next() {
                    info!(device = %target.id(), "switching to next device");
                    self.initiate(target).await;
                }
            }
            EventKind::PrevDevice => {
                if let Some(target) = self.conn.switch_prev() {
                    info!(device = %target.id(), "switching to previous device");
                    self.initiate(target).await;
                }
            }
            EventKind::Home => {
                if self.conn.device_count() > 0 {
                    self.state = SessionState::DeviceList { selected: 0 };
                }
            }
            EventKind::Cancel => {
                info!("disconnect requested");
                self.conn.disconnect().await;
                self.state = SessionState::Scanning;
            }
            _ => {}
        }
    }

    async fn on_device_list_event(&mut self, event: InputEvent) {
        let count = self.conn.device_count();
        let SessionState::DeviceList { selected } = &mut self.state else {
            return;
        };
        match event.kind {
            EventKind::NavUp => *selected = selected.saturating_sub(1),
            EventKind::NavDown => {
                *selected = (*selected + 1).min(count.saturating_sub(1));
            }
            EventKind::Confirm => {
                let index = *selected;
                if let Some(target) = self.conn.known_devices().get(index).cloned() {
                    self.initiate(target).await;
                }
            }
            EventKind::Cancel => self.state = SessionState::Streaming,
            _ => {}
        }
    }

    fn on_error_event(&mut self, event: InputEvent) {
        if matches!(event.kind, EventKind::Confirm | EventKind::Cancel) {
            let state = std::mem::replace(&mut self.state, SessionState::Scanning);
            let SessionState::Error { return_to, .. } = state else {
                return;
            };
            debug!(state = return_to.name(), "error acknowledged");
            self.state = *return_to;
        }
    }

    fn enter_error(&mut self, message: String, return_to: SessionState) {
        error!(message = %message, "session error");
        self.state = SessionState::Error {
            message,
            return_to: Box::new(return_to),
        };
    }

    // -- Rendering --

    fn render(&mut self) {
        let frame = match &self.state {
            SessionState::Scanning => Frame::Scanning,
            SessionState::Authenticating { entry, .. } => Frame::PinEntry {
                device: entry.device().to_string(),
                hint: entry.hint().map(str::to_string),
                digits: entry.digits().to_vec(),
                cursor: entry.cursor(),
                error: entry.error().map(str::to_string),
            },
            SessionState::Connecting { device } => Frame::Connecting {
                device: device.clone(),
            },
            SessionState::Streaming => {
                // Hold the sample lock only for the clone, never across
                // the render call.
                let sample = lock_latest(&self.latest).clone();
                match self.conn.active_descriptor() {
                    Some(descriptor) => Frame::Streaming { descriptor, sample },
                    None => Frame::Scanning,
                }
            }
            SessionState::DeviceList { selected } => {
                let devices: Vec<DeviceSummary> = self
                    .conn
                    .known_devices()
                    .iter()
                    .map(DeviceSummary::from_link)
                    .collect();
                Frame::DeviceList {
                    devices,
                    selected: *selected,
                    active: self.conn.active_descriptor().map(|d| d.id().to_string()),
                }
            }
            SessionState::Error { message, .. } => Frame::Error {
                message: message.clone(),
            },
        };
        self.renderer.show(&frame);
    }
}

fn lock_latest(latest: &Arc<Mutex<Option<Value>>>) -> std::sync::MutexGuard<'_, Option<Value>> {
    latest.lock().unwrap_or_else(PoisonError::into_inner)
}
