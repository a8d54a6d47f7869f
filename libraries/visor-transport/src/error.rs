//! Error types for transports and connection management

use std::time::Duration;
use thiserror::Error;
use visor_link::TransportKind;

/// Transport and connection failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The link names a transport kind with no live implementation
    #[error("transport kind {0:?} is not implemented")]
    Unsupported(TransportKind),

    /// The broker handshake did not complete within the timeout
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// The broker refused or dropped the connection during the handshake
    #[error("connection refused by {0}")]
    Refused(String),

    /// A client request (subscribe, disconnect) failed
    #[error("client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
