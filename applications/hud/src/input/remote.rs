//! Remote-control backend
//!
//! A TCP listener speaking a JSON-per-line protocol so a phone or another
//! machine can drive the HUD:
//!
//! ```text
//! -> {"type":"input","event":"nav_up"}
//! -> {"type":"link","url":"visor://v1/dev/mqtt/host:1883?t=a/b"}
//! <- {"type":"mode","numeric":true}
//! ```
//!
//! Hardening at the edge: oversized lines are rejected by the codec, link
//! URLs are length- and scheme-checked before they become events, and each
//! client is capped at 30 messages per second.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn};
use visor_input::{EventKind, InputBackend, InputEvent, InputError};
use visor_link::LINK_SCHEME;

const SOURCE: &str = "remote";

/// Upper bound on one protocol line.
const MAX_LINE_LEN: usize = 4096;

/// Per-client message budget per second; excess is dropped.
const MAX_MESSAGES_PER_SEC: usize = 30;

/// Queued events before the listener starts dropping.
const QUEUE_DEPTH: usize = 64;

pub struct RemoteBackend {
    port: u16,
    events: Option<mpsc::Receiver<InputEvent>>,
    shutdown: Option<watch::Sender<bool>>,
    numeric: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl RemoteBackend {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            events: None,
            shutdown: None,
            numeric: None,
            task: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl InputBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn start(&mut self) -> visor_input::Result<()> {
        // Bind synchronously so a busy port fails the start, not the task.
        let listener = std::net::TcpListener::bind(("0.0.0.0", self.port))
            .map_err(|e| InputError::StartFailed(format!("bind port {}: {e}", self.port)))?;
        listener.set_nonblocking(true)?;

        let (event_tx, event_rx) = mpsc::channel(QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (numeric_tx, numeric_rx) = watch::channel(false);

        self.events = Some(event_rx);
        self.shutdown = Some(shutdown_tx);
        self.numeric = Some(numeric_tx);
        self.running.store(true, Ordering::SeqCst);

        info!(port = self.port, "remote control listening");
        self.task = Some(tokio::spawn(accept_loop(
            listener,
            event_tx,
            numeric_rx,
            shutdown_rx,
        )));
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(task) = self.task.take() {
            // The accept loop exits on the shutdown signal; aborting here
            // just bounds the teardown.
            task.abort();
        }
        self.events = None;
        self.numeric = None;
    }

    fn poll(&mut self) -> Option<InputEvent> {
        self.events.as_mut()?.try_recv().ok()
    }

    fn is_available(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_numeric_mode(&mut self, enabled: bool) {
        if let Some(numeric) = &self.numeric {
            let _ = numeric.send(enabled);
        }
    }
}

async fn accept_loop(
    listener: std::net::TcpListener,
    event_tx: mpsc::Sender<InputEvent>,
    numeric_rx: watch::Receiver<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let listener = match tokio::net::TcpListener::from_std(listener) {
        Ok(l) => l,
        Err(e) => {
            warn!(error = %e, "remote listener setup failed");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!(client = %addr, "remote client connected");
                    tokio::spawn(serve_client(
                        stream,
                        addr,
                        event_tx.clone(),
                        numeric_rx.clone(),
                        shutdown_rx.clone(),
                    ));
                }
                Err(e) => warn!(error = %e, "accept failed"),
            },
        }
    }
}

async fn serve_client(
    stream: TcpStream,
    addr: SocketAddr,
    event_tx: mpsc::Sender<InputEvent>,
    mut numeric_rx: watch::Receiver<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LEN));
    let (mut sink, mut lines) = framed.split();
    let mut stamps: VecDeque<Instant> = VecDeque::with_capacity(MAX_MESSAGES_PER_SEC);

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = numeric_rx.changed() => {
                let numeric = *numeric_rx.borrow();
                let msg = serde_json::json!({"type": "mode", "numeric": numeric}).to_string();
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            line = lines.next() => {
                let Some(line) = line else { break };
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(client = %addr, error = %e, "dropping client");
                        break;
                    }
                };

                let now = Instant::now();
                while stamps
                    .front()
                    .is_some_and(|t| now.duration_since(*t) > Duration::from_secs(1))
                {
                    stamps.pop_front();
                }
                if stamps.len() >= MAX_MESSAGES_PER_SEC {
                    warn!(client = %addr, "rate limit exceeded, dropping message");
                    continue;
                }
                stamps.push_back(now);

                if let Some(event) = parse_message(&line) {
                    debug!(client = %addr, kind = ?event.kind, "remote event");
                    if event_tx.try_send(event).is_err() {
                        warn!(client = %addr, "input queue full, dropping event");
                    }
                }
            }
        }
    }
    info!(client = %addr, "remote client disconnected");
}

#[derive(Deserialize)]
struct RemoteMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// One protocol line to one event, or nothing for anything malformed.
fn parse_message(raw: &str) -> Option<InputEvent> {
    let message: RemoteMessage = serde_json::from_str(raw).ok()?;
    match message.kind.as_str() {
        "input" => {
            let name = message.event?;
            match map_event_name(&name) {
                Some(kind) => Some(InputEvent::new(kind, SOURCE)),
                None => {
                    warn!(event = %name, "unknown remote event");
                    None
                }
            }
        }
        "link" => {
            let url = message.url?;
            if url.len() > visor_link::MAX_LINK_LEN {
                warn!(len = url.len(), "link too long, rejected");
                return None;
            }
            if !url.starts_with(LINK_SCHEME) {
                warn!("link with wrong scheme, rejected");
                return None;
            }
            Some(InputEvent::with_payload(EventKind::LinkScanned, url, SOURCE))
        }
        _ => None,
    }
}

fn map_event_name(name: &str) -> Option<EventKind> {
    if let Some(digit) = name.strip_prefix("digit_").and_then(|d| d.parse::<u8>().ok()) {
        if digit <= 9 {
            return Some(EventKind::Digit(digit));
        }
    }
    match name {
        "nav_up" => Some(EventKind::NavUp),
        "nav_down" => Some(EventKind::NavDown),
        "nav_left" => Some(EventKind::NavLeft),
        "nav_right" => Some(EventKind::NavRight),
        "confirm" => Some(EventKind::Confirm),
        "cancel" => Some(EventKind::Cancel),
        "home" => Some(EventKind::Home),
        "digit_up" => Some(EventKind::DigitUp),
        "digit_down" => Some(EventKind::DigitDown),
        "digit_next" => Some(EventKind::DigitNext),
        "digit_prev" => Some(EventKind::DigitPrev),
        "digit_submit" => Some(EventKind::DigitSubmit),
        "digit_backspace" => Some(EventKind::Backspace),
        "auth_bypass" => Some(EventKind::AuthBypass),
        "next_device" => Some(EventKind::NextDevice),
        "prev_device" => Some(EventKind::PrevDevice),
        "quit" => Some(EventKind::Quit),
        _ => None,
    }
}
