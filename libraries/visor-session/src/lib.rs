//! Visor HUD - Session State Machine
//!
//! The finite-state controller mediating scan -> auth -> connect ->
//! stream -> list -> error. One cooperative 20 Hz loop polls merged input,
//! applies at most one transition per tick and hands the renderer a
//! [`Frame`] describing the current screen.
//!
//! The session owns the other core pieces - a
//! [`visor_transport::ConnectionManager`], a [`visor_auth::AuthGate`] and
//! a [`visor_input::InputManager`] - and treats the renderer, link source
//! and input backends as swappable collaborators behind traits.
//!
//! # States
//!
//! | State | Leaves on |
//! |---|---|
//! | Scanning | valid link -> Authenticating or Connecting |
//! | Authenticating | valid PIN / bypass -> Connecting; cancel -> Scanning |
//! | Connecting | success -> Streaming; failure -> Error |
//! | Streaming | switch -> auth flow; home -> DeviceList; cancel -> Scanning |
//! | DeviceList | confirm -> auth flow; cancel -> Streaming |
//! | Error | confirm/cancel -> recorded return state |
//!
//! A quit event ends the loop from any state; events with no meaning in
//! the current state are silently ignored.

pub mod frame;
pub mod machine;
pub mod pin;

pub use frame::{DeviceSummary, Frame, LinkSource, Renderer};
pub use machine::{Session, SessionConfig, SessionState};
pub use pin::PinEntry;
