// ============================================
// File: crates/robolink-initiator/src/config.rs
// ============================================
//! # Initiator Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the initiator console and its
//! key directory, supporting TOML files and environment variables.
//!
//! ## Configuration Sections
//! - `network`: responder address
//! - `directory`: key directory listener
//! - `limits`: read/write timeouts and message size
//! - `key_exchange`: private scalar range
//! - `signing`: nonce policy
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! responder_addr = "bob:8888"
//!
//! [directory]
//! listen_addr = "0.0.0.0:10002"
//! connections = 1
//!
//! [signing]
//! nonce_policy = "per-signature"
//! ```
//!
//! ## Environment Overrides
//! - `ROBOLINK_RESPONDER_ADDR` replaces `network.responder_addr`
//!
//! ## ⚠️ Important Note for Next Developer
//! - `nonce_policy` defaults to `per-signer`, which matches deployed
//!   robots and leaks the signing key after two commands
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use robolink_core::crypto::{NoncePolicy, ScalarRange};
use robolink_transport::FrameLimits;

use crate::error::{InitiatorError, Result};

/// Environment variable overriding `network.responder_addr`.
pub const ENV_RESPONDER_ADDR: &str = "ROBOLINK_RESPONDER_ADDR";

// ============================================
// InitiatorConfig
// ============================================

/// Main initiator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitiatorConfig {
    /// Responder connection.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Key directory listener.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// I/O limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Key-exchange scalar range.
    #[serde(default)]
    pub key_exchange: ScalarRange,

    /// Command signing.
    #[serde(default)]
    pub signing: SigningConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl InitiatorConfig {
    /// Loads configuration from a TOML file and applies environment
    /// overrides.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| InitiatorError::config_load(&path_str, e.to_string()))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| InitiatorError::config_load(&path_str, e.to_string()))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if parsing or validation fails.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| InitiatorError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ROBOLINK_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(ENV_RESPONDER_ADDR) {
            if !addr.trim().is_empty() {
                info!(addr = %addr, "Responder address overridden from environment");
                self.network.responder_addr = addr.trim().to_string();
            }
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !self.network.responder_addr.contains(':') {
            return Err(InitiatorError::config_invalid(
                "network.responder_addr",
                "must be host:port",
            ));
        }
        if self.network.connect_timeout_ms == 0 {
            return Err(InitiatorError::config_invalid(
                "network.connect_timeout_ms",
                "must be greater than 0",
            ));
        }
        if self.limits.read_timeout_secs == 0 || self.limits.write_timeout_secs == 0 {
            return Err(InitiatorError::config_invalid(
                "limits",
                "timeouts must be greater than 0",
            ));
        }
        if self.limits.max_message_size < 256 {
            return Err(InitiatorError::config_invalid(
                "limits.max_message_size",
                "must be at least 256",
            ));
        }
        ScalarRange::new(self.key_exchange.min, self.key_exchange.max)
            .map_err(|e| InitiatorError::config_invalid("key_exchange", e.to_string()))?;
        Ok(())
    }
}

// ============================================
// Sections
// ============================================

/// Responder connection section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Responder address, `host:port`.
    #[serde(default = "default_responder_addr")]
    pub responder_addr: String,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_responder_addr() -> String {
    "localhost:8888".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

impl NetworkConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            responder_addr: default_responder_addr(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Key directory listener section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Listen address.
    #[serde(default = "default_directory_addr")]
    pub listen_addr: SocketAddr,

    /// Connections to serve before closing; 0 serves forever.
    #[serde(default = "default_connections")]
    pub connections: usize,
}

fn default_directory_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 10002))
}

fn default_connections() -> usize {
    1
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_directory_addr(),
            connections: default_connections(),
        }
    }
}

/// I/O limits section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Write timeout in seconds.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Largest accepted JSON document in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

fn default_read_timeout_secs() -> u64 {
    300
}

fn default_write_timeout_secs() -> u64 {
    10
}

fn default_max_message_size() -> usize {
    65536
}

impl LimitsConfig {
    /// Converts to transport limits.
    #[must_use]
    pub const fn frame_limits(&self) -> FrameLimits {
        FrameLimits {
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            max_message_size: self.max_message_size,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
            max_message_size: default_max_message_size(),
        }
    }
}

/// Command signing section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Nonce selection policy.
    #[serde(default)]
    pub nonce_policy: NoncePolicy,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================
