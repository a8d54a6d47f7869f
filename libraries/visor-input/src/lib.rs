//! Visor HUD - Input Merging
//!
//! One ordered event stream out of N independent input sources.
//!
//! Each source (local keyboard, wearable controller, remote-control
//! client) implements [`InputBackend`]; the [`InputManager`] polls them in
//! registration order and hands the session loop at most one
//! [`InputEvent`] per tick. Backends that fail to start are logged and
//! skipped for the rest of the run.
//!
//! This crate has no opinion about where events come from - concrete
//! backends live with the application, which is also where platform
//! concerns (stdin, sockets, BLE) belong.

pub mod backend;
pub mod error;
pub mod events;
pub mod manager;

pub use backend::InputBackend;
pub use error::{InputError, Result};
pub use events::{EventKind, InputEvent};
pub use manager::InputManager;
