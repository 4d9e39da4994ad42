//! Endpoint configuration.
//!
//! # Configuration File Format
//!
//! ```toml
//! bind_address = "0.0.0.0"   # local IPv4; "0.0.0.0" = all interfaces
//! port = 59152               # RSI default port
//! timeout_ms = 1000          # liveness watchdog; 0 disables it
//! verbose = false            # per-event diagnostics
//! ```
//!
//! Every field has a default, so an empty file (or
//! [`RsiConfig::default()`]) yields a working endpoint on 0.0.0.0:59152
//! with a one second watchdog.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// Default RSI port on the robot controller side.
pub const DEFAULT_PORT: u16 = 59152;

/// Default liveness timeout.
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Immutable startup options.
///
/// Built by the caller and copied into the endpoint at init; never mutated
/// thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct RsiConfig {
    /// Local IPv4 address to bind.
    ///
    /// **Format**: numeric IPv4 ("0.0.0.0" listens on all interfaces)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Local UDP port the robot controller sends to.
    ///
    /// **Default**: 59152, the port the RSI Ethernet configuration ships
    /// with on the robot side.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Liveness watchdog interval.
    ///
    /// **Units**: milliseconds
    /// **Default**: 1000
    ///
    /// The connection is declared lost after this long without a datagram.
    /// 0 disables the watchdog.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,

    /// Emit per-event diagnostics (late responses, socket tuning failures,
    /// watchdog fires).
    #[serde(default)]
    pub verbose: bool,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            verbose: false,
        }
    }
}

impl RsiConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            log::error!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            );
            Error::InitFailed
        })?;

        let config: RsiConfig = basic_toml::from_str(&content).map_err(|e| {
            log::error!("Failed to parse config: {}", e);
            Error::InitFailed
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the bind address is numeric IPv4.
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.parse::<Ipv4Addr>().is_err() {
            log::error!(
                "bind_address {:?} is not a numeric IPv4 address",
                self.bind_address
            );
            return Err(Error::InvalidParam);
        }
        Ok(())
    }

    /// The parsed bind address ("0.0.0.0" is the wildcard).
    pub(crate) fn bind_ip(&self) -> Result<Ipv4Addr> {
        self.bind_address.parse().map_err(|_| Error::InvalidParam)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RsiConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 59152);
        assert_eq!(config.timeout_ms, 1000);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: RsiConfig = basic_toml::from_str("").unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_full_toml() {
        let config: RsiConfig = basic_toml::from_str(
            "bind_address = \"192.168.1.50\"\nport = 49152\ntimeout_ms = 0\nverbose = true\n",
        )
        .unwrap();
        assert_eq!(config.bind_address, "192.168.1.50");
        assert_eq!(config.port, 49152);
        assert_eq!(config.timeout_ms, 0);
        assert!(config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hostname_rejected() {
        let config = RsiConfig {
            bind_address: "robot.local".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidParam));
    }
}
