//! Error types for link parsing

use thiserror::Error;

/// Link parse failures, one variant per validation rule.
///
/// Parsing is fail-closed: any rule violation rejects the whole link and
/// no partial descriptor is ever constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkParseError {
    /// Input does not start with the `visor://` scheme
    #[error("not a visor:// link")]
    WrongScheme,

    /// Input exceeds the maximum accepted link length
    #[error("link too long ({0} bytes)")]
    TooLong(usize),

    /// Version segment is not `v` followed by digits
    #[error("malformed version segment {0:?}")]
    MalformedVersion(String),

    /// Version is valid but not the one this implementation speaks
    #[error("unsupported protocol version v{0}")]
    UnsupportedVersion(u32),

    /// Fewer path segments than the grammar requires
    #[error("missing link segments")]
    MissingSegments,

    /// Device id segment is empty
    #[error("empty device id")]
    EmptyDeviceId,

    /// Transport segment is not in the supported set
    #[error("unknown transport kind {0:?}")]
    UnknownTransport(String),

    /// Endpoint segment has no `:port` suffix
    #[error("endpoint missing port")]
    MissingPort,

    /// Port is present but not a valid u16
    #[error("invalid port {0:?}")]
    InvalidPort(String),

    /// Host part of the endpoint is empty
    #[error("empty host")]
    EmptyHost,

    /// `auth=` query value is not in the supported set.
    ///
    /// Unknown methods reject the link instead of degrading to `open`.
    #[error("unknown auth method {0:?}")]
    UnknownAuthMethod(String),
}

/// Result type for link parsing
pub type Result<T> = std::result::Result<T, LinkParseError>;
