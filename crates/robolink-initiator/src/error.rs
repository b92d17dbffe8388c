// ============================================
// File: crates/robolink-initiator/src/error.rs
// ============================================
//! # Initiator Error Types
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use robolink_common::error::CommonError;
use robolink_core::error::CoreError;
use robolink_transport::error::TransportError;

/// Result type for initiator operations.
pub type Result<T> = std::result::Result<T, InitiatorError>;

/// Initiator error types.
#[derive(Error, Debug)]
pub enum InitiatorError {
    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// Path of the file
        path: String,
        /// What went wrong
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Dotted field name
        field: String,
        /// Why it is invalid
        reason: String,
    },

    /// The signing key publisher went away before publishing.
    #[error("Signing key was never published")]
    KeyNotPublished,

    /// The responder handshake failed.
    #[error("Handshake with {addr} failed: {reason}")]
    Handshake {
        /// Responder address
        addr: String,
        /// Why
        reason: String,
    },

    /// Operator input could not be used.
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput {
        /// Prompt or field name
        field: String,
        /// Why
        reason: String,
    },

    /// Console I/O failed.
    #[error("Console I/O error: {0}")]
    Console(#[from] std::io::Error),

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Error from core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Error from transport crate.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl InitiatorError {
    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Handshake` error.
    pub fn handshake(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Handshake {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for configuration problems.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` if the console should report "Input Error" and keep
    /// going.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::Common(_) | Self::Core(_)
        )
    }

    /// Returns `true` if the responder connection is gone.
    #[must_use]
    pub const fn is_disconnected(&self) -> bool {
        matches!(self, Self::Transport(TransportError::ConnectionClosed))
    }
}
