// ============================================
// File: crates/robolink-responder/src/config.rs
// ============================================
//! # Responder Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the responder, supporting TOML
//! files and environment variables.
//!
//! ## Main Functionality
//! - `ResponderConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Configuration validation
//! - Default values matching the deployed robot endpoint
//!
//! ## Configuration Sections
//! - `network`: command listener address
//! - `directory`: where to fetch the initiator's verification key
//! - `limits`: read/write timeouts and message size
//! - `key_exchange`: private scalar range
//! - `admin`: source of the admin secret
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "0.0.0.0:8888"
//!
//! [directory]
//! addr = "alice:10002"
//! retries = 3
//! retry_delay_ms = 2000
//!
//! [limits]
//! read_timeout_secs = 300
//!
//! [admin]
//! flag_file = "/etc/robolink/flag"
//! ```
//!
//! ## Environment Overrides
//! - `ROBOLINK_DIRECTORY_ADDR` replaces `directory.addr`
//!
//! ## ⚠️ Important Note for Next Developer
//! - At most one of `admin.flag`, `admin.flag_file`, `admin.flag_env`
//!   may be set; none means admin_login answers with an error
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use robolink_core::crypto::ScalarRange;
use robolink_transport::FrameLimits;

use crate::dispatch::{EnvFlag, FileFlag, FlagProvider, MissingFlag, StaticFlag};
use crate::error::{ResponderError, Result};

/// Environment variable overriding `directory.addr`.
pub const ENV_DIRECTORY_ADDR: &str = "ROBOLINK_DIRECTORY_ADDR";

// ============================================
// ResponderConfig
// ============================================

/// Main responder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Key directory client configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// I/O limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Key-exchange scalar range.
    #[serde(default)]
    pub key_exchange: ScalarRange,

    /// Admin secret source.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ResponderConfig {
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
            .map_err(|e| ResponderError::config_load(&path_str, e.to_string()))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| ResponderError::config_load(&path_str, e.to_string()))?;

        config.apply_env_overrides();
        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string (useful for testing).
    ///
    /// # Errors
    /// Returns error if parsing or validation fails.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ResponderError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ROBOLINK_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(ENV_DIRECTORY_ADDR) {
            if !addr.trim().is_empty() {
                info!(addr = %addr, "Directory address overridden from environment");
                self.directory.addr = addr.trim().to_string();
            }
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `ConfigInvalid` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.directory.validate()?;
        self.limits.validate()?;
        ScalarRange::new(self.key_exchange.min, self.key_exchange.max)
            .map_err(|e| ResponderError::config_invalid("key_exchange", e.to_string()))?;
        self.admin.validate()?;
        Ok(())
    }

    /// Serializes configuration to TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Command listener address.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8888))
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.listen_addr.port() == 0 {
            return Err(ResponderError::config_invalid(
                "network.listen_addr",
                "port cannot be 0",
            ));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

// ============================================
// DirectoryConfig
// ============================================

/// Key directory client section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory address, `host:port`.
    #[serde(default = "default_directory_addr")]
    pub addr: String,

    /// Connect timeout per attempt in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Extra attempts after the first failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_directory_addr() -> String {
    "localhost:10002".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl DirectoryConfig {
    fn validate(&self) -> Result<()> {
        if !self.addr.contains(':') {
            return Err(ResponderError::config_invalid(
                "directory.addr",
                "must be host:port",
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ResponderError::config_invalid(
                "directory.connect_timeout_ms",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the pause between attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            addr: default_directory_addr(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

// ============================================
// LimitsConfig
// ============================================

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
    fn validate(&self) -> Result<()> {
        if self.read_timeout_secs == 0 {
            return Err(ResponderError::config_invalid(
                "limits.read_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.write_timeout_secs == 0 {
            return Err(ResponderError::config_invalid(
                "limits.write_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.max_message_size < 256 {
            return Err(ResponderError::config_invalid(
                "limits.max_message_size",
                "must be at least 256",
            ));
        }
        Ok(())
    }

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

// ============================================
// AdminConfig
// ============================================

/// Admin secret section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Literal secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,

    /// File holding the secret, read on each admin_login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_file: Option<PathBuf>,

    /// Environment variable holding the secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_env: Option<String>,
}

impl AdminConfig {
    fn validate(&self) -> Result<()> {
        let sources = [
            self.flag.is_some(),
            self.flag_file.is_some(),
            self.flag_env.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();
        if sources > 1 {
            return Err(ResponderError::config_invalid(
                "admin",
                "set only one of flag, flag_file, flag_env",
            ));
        }
        Ok(())
    }

    /// Builds the configured secret provider.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn FlagProvider> {
        if let Some(flag) = &self.flag {
            Arc::new(StaticFlag::new(flag.clone()))
        } else if let Some(path) = &self.flag_file {
            Arc::new(FileFlag::new(path.clone()))
        } else if let Some(var) = &self.flag_env {
            Arc::new(EnvFlag::new(var.clone()))
        } else {
            Arc::new(MissingFlag)
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResponderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.listen_addr.port(), 8888);
        assert_eq!(config.directory.addr, "localhost:10002");
        assert_eq!(config.key_exchange, ScalarRange::default());
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [network]
            listen_addr = "127.0.0.1:9999"

            [directory]
            addr = "alice:10002"
            connect_timeout_ms = 1000
            retries = 5
            retry_delay_ms = 250

            [limits]
            read_timeout_secs = 30
            max_message_size = 4096

            [key_exchange]
            min = 1000
            max = 2000

            [admin]
            flag = "FLAG{test}"

            [logging]
            level = "debug"
        "#;

        let config = ResponderConfig::from_str(toml).unwrap();
        assert_eq!(config.network.listen_addr.port(), 9999);
        assert_eq!(config.directory.retries, 5);
        assert_eq!(config.directory.retry_delay(), Duration::from_millis(250));
        assert_eq!(config.limits.frame_limits().max_message_size, 4096);
        assert_eq!(config.limits.write_timeout_secs, 10);
        assert_eq!(config.key_exchange.max, 2000);
        assert_eq!(config.admin.provider().flag().unwrap(), "FLAG{test}");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ResponderConfig::from_str("[network]\nlisten_addr = \"0.0.0.0:0\"").is_err());
        assert!(ResponderConfig::from_str("[directory]\naddr = \"nohost\"").is_err());
        assert!(ResponderConfig::from_str("[limits]\nread_timeout_secs = 0").is_err());
        assert!(ResponderConfig::from_str("[key_exchange]\nmin = 10\nmax = 10").is_err());

        let both = "[admin]\nflag = \"a\"\nflag_env = \"B\"";
        let err = ResponderConfig::from_str(both).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_missing_flag_provider() {
        let config = ResponderConfig::default();
        assert!(config.admin.provider().flag().is_err());
    }

    #[test]
    fn test_to_toml_reparses() {
        let config = ResponderConfig::default();
        let text = config.to_toml();
        let back = ResponderConfig::from_str(&text).unwrap();
        assert_eq!(back.network.listen_addr, config.network.listen_addr);
    }
}
