//! Device descriptor: connection identity plus device-reported metadata

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scheme prefix every link must carry.
pub const LINK_SCHEME: &str = "visor://";

/// The single protocol version this implementation speaks.
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum accepted raw link length in bytes.
pub const MAX_LINK_LEN: usize = 512;

/// Transport kinds a link may name.
///
/// Closed set; only `Mqtt` is implemented today. The others parse so that
/// a newer device's QR code fails at connect time with a clear message
/// rather than at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Mqtt,
    Http,
    Ws,
    Ble,
    Mdns,
}

impl TransportKind {
    /// All supported kinds, in link-token order.
    pub const ALL: [TransportKind; 5] = [
        TransportKind::Mqtt,
        TransportKind::Http,
        TransportKind::Ws,
        TransportKind::Ble,
        TransportKind::Mdns,
    ];

    /// The token used in link URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Mqtt => "mqtt",
            TransportKind::Http => "http",
            TransportKind::Ws => "ws",
            TransportKind::Ble => "ble",
            TransportKind::Mdns => "mdns",
        }
    }

    /// Parse a link token. Returns `None` for anything outside the set.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "mqtt" => Some(TransportKind::Mqtt),
            "http" => Some(TransportKind::Http),
            "ws" => Some(TransportKind::Ws),
            "ble" => Some(TransportKind::Ble),
            "mdns" => Some(TransportKind::Mdns),
            _ => None,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential scheme a device requires before it will be streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// No credential required
    Open,
    /// Numeric PIN entered on the HUD
    Pin,
    /// Pre-shared token stored on the HUD
    Token,
    /// Mutual TLS (parses; flow not yet implemented)
    Mtls,
    /// Multi-factor (parses; flow not yet implemented)
    Mfa,
}

impl AuthMethod {
    /// The token used in link URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::Open => "open",
            AuthMethod::Pin => "pin",
            AuthMethod::Token => "token",
            AuthMethod::Mtls => "mtls",
            AuthMethod::Mfa => "mfa",
        }
    }

    /// Parse a link token. Returns `None` for anything outside the set.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "open" => Some(AuthMethod::Open),
            "pin" => Some(AuthMethod::Pin),
            "token" => Some(AuthMethod::Token),
            "mtls" => Some(AuthMethod::Mtls),
            "mfa" => Some(AuthMethod::Mfa),
            _ => None,
        }
    }

    /// Whether this method requires a credential challenge.
    pub fn requires_credential(self) -> bool {
        self != AuthMethod::Open
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field display schema reported by the device.
///
/// Drives unit labels, gauge ranges and alert thresholds on the renderer
/// side. All fields optional; devices report what they know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Unit label, e.g. `"°C"` or `"rpm"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Expected `[min, max]` value range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,

    /// Alert when the value rises above this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_above: Option<f64>,

    /// Alert when the value falls below this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_below: Option<f64>,

    /// Enumerated values for discrete fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

/// Device-reported metadata.
///
/// Populated after connect from the retained metadata message; every field
/// may be overwritten again by a later message. Absent until then.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMeta {
    /// Human-readable device name
    pub name: Option<String>,
    /// Dotted device type, e.g. `"medical.patient_monitor"`
    pub device_type: Option<String>,
    /// Icon hint for the renderer
    pub icon: Option<String>,
    /// Suggested refresh interval in milliseconds
    pub refresh_ms: u64,
    /// Layout hint for the renderer
    pub layout: String,
    /// Free-form hint shown during the credential challenge
    pub auth_hint: Option<String>,
    /// Field name -> display schema
    pub schema: HashMap<String, FieldSchema>,
}

impl Default for DeviceMeta {
    fn default() -> Self {
        Self {
            name: None,
            device_type: None,
            icon: None,
            refresh_ms: 2000,
            layout: "auto".to_string(),
            auth_hint: None,
            schema: HashMap::new(),
        }
    }
}

/// One metadata message as it arrives off the wire.
///
/// Partial by design: keys the device did not send stay `None` and leave
/// the descriptor's current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub device_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<HashMap<String, FieldSchema>>,
}

/// Parsed, validated device link.
///
/// Identity fields (everything encoded in the URL) are fixed at parse time
/// and only readable through accessors. Metadata is filled in later from
/// the device's retained metadata message via [`apply_metadata`].
///
/// [`apply_metadata`]: LinkDescriptor::apply_metadata
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDescriptor {
    version: u32,
    id: String,
    transport: TransportKind,
    host: String,
    port: u16,
    auth: AuthMethod,
    topic: Option<String>,
    meta: DeviceMeta,
}

impl LinkDescriptor {
    /// Build a descriptor directly, bypassing the URL grammar.
    ///
    /// Used by demo mode and tests; scanned links go through [`crate::parse`].
    pub fn new(
        id: impl Into<String>,
        transport: TransportKind,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            id: id.into(),
            transport,
            host: host.into(),
            port,
            auth: AuthMethod::Open,
            topic: None,
            meta: DeviceMeta::default(),
        }
    }

    /// Set the auth method (builder style).
    pub fn with_auth(mut self, auth: AuthMethod) -> Self {
        self.auth = auth;
        self
    }

    /// Set the data topic (builder style).
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub(crate) fn from_parts(
        version: u32,
        id: String,
        transport: TransportKind,
        host: String,
        port: u16,
        auth: AuthMethod,
        topic: Option<String>,
    ) -> Self {
        Self {
            version,
            id,
            transport,
            host,
            port,
            auth,
            topic,
            meta: DeviceMeta::default(),
        }
    }

    /// Protocol version the link was encoded with.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Stable device id, unique per device.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Transport kind named by the link.
    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    /// Endpoint host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Endpoint port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Auth method the device requests.
    pub fn auth(&self) -> AuthMethod {
        self.auth
    }

    /// Data topic, if the link carries one.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Device-reported metadata (defaults until the first metadata message).
    pub fn meta(&self) -> &DeviceMeta {
        &self.meta
    }

    /// `host:port` as one string.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Retained metadata topic derived from the data topic.
    pub fn meta_topic(&self) -> Option<String> {
        self.topic.as_deref().map(|t| format!("{t}/$meta"))
    }

    /// Best available display name: metadata name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or(&self.id)
    }

    /// Merge one metadata message into the descriptor.
    ///
    /// Keys absent from the update keep their current values, so repeated
    /// partial updates accumulate rather than reset.
    pub fn apply_metadata(&mut self, update: &MetadataUpdate) {
        if let Some(name) = &update.name {
            self.meta.name = Some(name.clone());
        }
        if let Some(device_type) = &update.device_type {
            self.meta.device_type = Some(device_type.clone());
        }
        if let Some(icon) = &update.icon {
            self.meta.icon = Some(icon.clone());
        }
        if let Some(refresh_ms) = update.refresh_ms {
            self.meta.refresh_ms = refresh_ms;
        }
        if let Some(layout) = &update.layout {
            self.meta.layout = layout.clone();
        }
        if let Some(auth_hint) = &update.auth_hint {
            self.meta.auth_hint = Some(auth_hint.clone());
        }
        if let Some(schema) = &update.schema {
            self.meta.schema = schema.clone();
        }
    }

}

impl fmt::Display for LinkDescriptor {
    /// Re-serialize the identity fields as a link URL.
    ///
    /// `parse(descriptor.to_string())` round-trips on identity fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}v{}/{}/{}/{}:{}",
            LINK_SCHEME, self.version, self.id, self.transport, self.host, self.port
        )?;
        match (self.auth.requires_credential(), &self.topic) {
            (true, Some(t)) => write!(f, "?auth={}&t={}", self.auth, t),
            (true, None) => write!(f, "?auth={}", self.auth),
            (false, Some(t)) => write!(f, "?t={t}"),
            (false, None) => Ok(()),
        }
    }
}
