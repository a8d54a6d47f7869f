//! HUD configuration
//!
//! Loaded from a TOML file (`visor.toml` by default) with `VISOR_`-prefixed
//! environment overrides. Every section has working defaults so the binary
//! runs with no file at all.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct HudConfig {
    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Foreground loop period in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Digits in the PIN challenge
    #[serde(default = "default_pin_length")]
    pub pin_length: usize,

    /// Broker handshake bound in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    /// Whether to run the remote-control listener
    #[serde(default = "default_remote_enabled")]
    pub enabled: bool,

    /// TCP port for the remote-control line protocol
    #[serde(default = "default_remote_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSettings {
    /// Device id -> expected PIN
    #[serde(default)]
    pub pins: HashMap<String, String>,

    /// Device id -> pre-shared token
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_pin_length() -> usize {
    4
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_remote_enabled() -> bool {
    true
}

fn default_remote_port() -> u16 {
    8765
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            pin_length: default_pin_length(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: default_remote_enabled(),
            port: default_remote_port(),
        }
    }
}

impl HudConfig {
    /// Load from an explicit file, or `visor.toml` next to the binary if
    /// present, then apply `VISOR_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("visor").required(false)),
        };
        builder
            .add_source(Environment::with_prefix("VISOR").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> HudConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = from_toml("");
        assert_eq!(config.session.tick_ms, 50);
        assert_eq!(config.session.pin_length, 4);
        assert_eq!(config.session.connect_timeout_secs, 5);
        assert!(config.remote.enabled);
        assert_eq!(config.remote.port, 8765);
        assert!(config.auth.pins.is_empty());
    }

    #[test]
    fn pins_and_overrides_parse() {
        let config = from_toml(
            r#"
            [session]
            tick_ms = 100

            [remote]
            enabled = false

            [auth.pins]
            "pump-7" = "4242"
            "bed-12" = "1111"
            "#,
        );
        assert_eq!(config.session.tick_ms, 100);
        assert!(!config.remote.enabled);
        assert_eq!(config.auth.pins["pump-7"], "4242");
        assert_eq!(config.auth.pins.len(), 2);
    }
}
