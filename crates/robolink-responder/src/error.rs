// ============================================
// File: crates/robolink-responder/src/error.rs
// ============================================
//! # Responder Error Types
//!
//! ## Creation Reason
//! Two layers of failure: `ResponderError` for startup, configuration and
//! the accept loop, and `SessionError` for one command session. Session
//! errors decide whether the peer gets an encrypted error reply or the
//! connection is dropped.
//!
//! ## Session Error Handling
//! ```text
//! ┌───────────────────────┬──────────────┬─────────────────────────────┐
//! │ Error                 │ Recoverable  │ Peer sees                   │
//! ├───────────────────────┼──────────────┼─────────────────────────────┤
//! │ Handshake             │ no           │ connection closed           │
//! │ Verification          │ yes          │ "Signature verification..." │
//! │ DirectoryUnavailable  │ yes          │ "No verification key..."    │
//! │ Decrypt / Padding     │ yes          │ error text, encrypted       │
//! │ MalformedCommand      │ yes          │ error text, encrypted       │
//! │ Dispatch              │ yes          │ "Unknown command"           │
//! │ AdminSecret           │ yes          │ error text, encrypted       │
//! │ Transport             │ no           │ connection closed           │
//! └───────────────────────┴──────────────┴─────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::net::SocketAddr;

use thiserror::Error;

use robolink_common::error::CommonError;
use robolink_core::error::CoreError;
use robolink_core::protocol::command::{
    MSG_NO_VERIFICATION_KEY, MSG_SIGNATURE_FAILED, MSG_UNKNOWN_COMMAND,
};
use robolink_transport::error::TransportError;

/// Result type for responder operations.
pub type Result<T> = std::result::Result<T, ResponderError>;

// ============================================
// ResponderError
// ============================================

/// Responder error types.
#[derive(Error, Debug)]
pub enum ResponderError {
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

    /// The listener could not be set up.
    #[error("Responder failed to start: {reason}")]
    StartupFailed {
        /// What went wrong
        reason: String,
    },

    /// The public-key directory did not produce a usable key.
    #[error("Key directory {addr} unavailable: {reason}")]
    DirectoryUnavailable {
        /// Directory address as configured
        addr: String,
        /// Last failure
        reason: String,
    },

    /// The admin secret could not be obtained.
    #[error("Admin secret unavailable: {reason}")]
    AdminSecret {
        /// What went wrong
        reason: String,
    },

    /// A session ended with a fatal error.
    #[error("Session with {peer} failed: {source}")]
    Session {
        /// Remote address
        peer: SocketAddr,
        /// Cause
        #[source]
        source: SessionError,
    },

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

impl ResponderError {
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

    /// Creates a `StartupFailed` error.
    pub fn startup_failed(reason: impl Into<String>) -> Self {
        Self::StartupFailed {
            reason: reason.into(),
        }
    }

    /// Creates a `DirectoryUnavailable` error.
    pub fn directory_unavailable(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DirectoryUnavailable {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `AdminSecret` error.
    pub fn admin_secret(reason: impl Into<String>) -> Self {
        Self::AdminSecret {
            reason: reason.into(),
        }
    }

    /// Returns `true` for configuration problems.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::ConfigInvalid { .. })
    }

    /// Returns `true` if the responder cannot keep running.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. } | Self::ConfigInvalid { .. } | Self::StartupFailed { .. }
        )
    }
}

// ============================================
// SessionError
// ============================================

/// Failure inside one command session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Key exchange could not complete.
    #[error("Handshake failed: {reason}")]
    Handshake {
        /// Why
        reason: String,
    },

    /// Command signature did not verify.
    #[error("Signature verification failed")]
    Verification,

    /// No initiator key was obtained for this connection.
    #[error("No verification key available")]
    DirectoryUnavailable,

    /// Ciphertext or IV unusable.
    #[error("Decryption failed: {reason}")]
    Decrypt {
        /// Why
        reason: String,
    },

    /// PKCS#7 padding invalid after decryption.
    #[error("Padding error")]
    Padding,

    /// Envelope or decrypted command is not the expected JSON.
    #[error("Malformed command: {reason}")]
    MalformedCommand {
        /// Why
        reason: String,
    },

    /// Action outside the vocabulary.
    #[error("Unknown command: {action}")]
    Dispatch {
        /// Action as received
        action: String,
    },

    /// Admin secret lookup failed.
    #[error("Admin secret unavailable: {reason}")]
    AdminSecret {
        /// Why
        reason: String,
    },

    /// Socket-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Creates a `Handshake` error.
    pub fn handshake(reason: impl Into<String>) -> Self {
        Self::Handshake {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedCommand` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCommand {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the session continues after replying.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Handshake { .. } | Self::Transport(_))
    }

    /// Returns `true` for failures that suggest a forged or tampered
    /// command rather than a broken peer.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(self, Self::Verification | Self::Padding)
    }

    /// Message placed in the encrypted error response.
    #[must_use]
    pub fn response_message(&self) -> String {
        match self {
            Self::Verification => MSG_SIGNATURE_FAILED.to_string(),
            Self::DirectoryUnavailable => MSG_NO_VERIFICATION_KEY.to_string(),
            Self::Dispatch { .. } => MSG_UNKNOWN_COMMAND.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<CoreError> for SessionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SignatureVerification => Self::Verification,
            CoreError::Padding => Self::Padding,
            CoreError::Decryption { reason } => Self::Decrypt { reason },
            CoreError::InvalidPoint { .. } | CoreError::KeyExchange { .. } => {
                Self::handshake(err.to_string())
            }
            other => Self::malformed(other.to_string()),
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
    fn test_error_display() {
        let err = ResponderError::config_load("/etc/robolink/responder.toml", "file not found");
        assert!(err.to_string().contains("/etc/robolink/responder.toml"));

        let err = ResponderError::directory_unavailable("127.0.0.1:10002", "refused");
        assert!(err.to_string().contains("10002"));
    }

    #[test]
    fn test_responder_error_classification() {
        let config_err = ResponderError::config_invalid("network.listen_addr", "port cannot be 0");
        assert!(config_err.is_config_error());
        assert!(config_err.is_fatal());
        assert!(!ResponderError::admin_secret("missing").is_fatal());
    }

    #[test]
    fn test_core_error_mapping() {
        assert!(matches!(
            SessionError::from(CoreError::SignatureVerification),
            SessionError::Verification
        ));
        assert!(matches!(
            SessionError::from(CoreError::Padding),
            SessionError::Padding
        ));
        assert!(matches!(
            SessionError::from(CoreError::decryption("bad iv")),
            SessionError::Decrypt { .. }
        ));
        assert!(matches!(
            SessionError::from(CoreError::invalid_point("robolink-kex", "off curve")),
            SessionError::Handshake { .. }
        ));
        assert!(matches!(
            SessionError::from(CoreError::malformed("not json")),
            SessionError::MalformedCommand { .. }
        ));
    }

    #[test]
    fn test_session_error_recoverability() {
        assert!(SessionError::Verification.is_recoverable());
        assert!(SessionError::Padding.is_recoverable());
        assert!(SessionError::Dispatch { action: "fly".into() }.is_recoverable());
        assert!(!SessionError::handshake("off curve").is_recoverable());
        assert!(!SessionError::from(TransportError::ConnectionClosed).is_recoverable());
    }

    #[test]
    fn test_response_messages() {
        assert_eq!(
            SessionError::Verification.response_message(),
            "Signature verification failed"
        );
        assert_eq!(
            SessionError::DirectoryUnavailable.response_message(),
            "No verification key available"
        );
        assert_eq!(
            SessionError::Dispatch { action: "fly".into() }.response_message(),
            "Unknown command"
        );
        assert_eq!(SessionError::Padding.response_message(), "Padding error");
    }
}
