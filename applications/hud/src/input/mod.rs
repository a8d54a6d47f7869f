//! Concrete input backends for the desktop build

pub mod keyboard;
pub mod remote;

pub use keyboard::KeyboardBackend;
pub use remote::RemoteBackend;
