// ============================================
// File: crates/robolink-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines the errors raised by curve arithmetic, key exchange, signing,
//! the symmetric channel and wire-message parsing.
//!
//! ## Error Categories
//! 1. **Curve Errors**: off-curve points, unusable scalars
//! 2. **Crypto Errors**: key exchange, signing, verification, decryption
//! 3. **Protocol Errors**: malformed wire messages
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - `Padding` and `Decryption` stay separate: callers report them
//!   differently to the peer
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use robolink_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for protocol and cryptographic operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Curve Errors
    // ========================================

    /// Coordinates do not describe a point of the named curve.
    #[error("Invalid point on {curve}: {reason}")]
    InvalidPoint {
        /// Curve the point was checked against
        curve: &'static str,
        /// What is wrong with the coordinates
        reason: String,
    },

    /// Scalar cannot be used for the requested operation.
    #[error("Invalid scalar: {reason}")]
    InvalidScalar {
        /// Why the scalar was rejected
        reason: String,
    },

    // ========================================
    // Cryptographic Errors
    // ========================================

    /// Key exchange could not produce a shared secret.
    #[error("Key exchange failed: {reason}")]
    KeyExchange {
        /// Why key exchange failed
        reason: String,
    },

    /// Signature creation failed.
    #[error("Failed to create signature: {reason}")]
    SignatureCreation {
        /// Why signing failed
        reason: String,
    },

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerification,

    /// Two signatures cannot be used for nonce-reuse recovery.
    #[error("Nonce recovery impossible: {reason}")]
    NonceRecovery {
        /// Why the pair is unusable
        reason: String,
    },

    /// Ciphertext decrypted but the block padding is malformed.
    #[error("Padding error")]
    Padding,

    /// Ciphertext or IV is structurally unusable.
    #[error("Decryption failed: {reason}")]
    Decryption {
        /// What is wrong with the input
        reason: String,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates an `InvalidPoint` error.
    pub fn invalid_point(curve: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPoint {
            curve,
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidScalar` error.
    pub fn invalid_scalar(reason: impl Into<String>) -> Self {
        Self::InvalidScalar {
            reason: reason.into(),
        }
    }

    /// Creates a `KeyExchange` error.
    pub fn key_exchange(reason: impl Into<String>) -> Self {
        Self::KeyExchange {
            reason: reason.into(),
        }
    }

    /// Creates a `SignatureCreation` error.
    pub fn signature_creation(reason: impl Into<String>) -> Self {
        Self::SignatureCreation {
            reason: reason.into(),
        }
    }

    /// Creates a `NonceRecovery` error.
    pub fn nonce_recovery(reason: impl Into<String>) -> Self {
        Self::NonceRecovery {
            reason: reason.into(),
        }
    }

    /// Creates a `Decryption` error.
    pub fn decryption(reason: impl Into<String>) -> Self {
        Self::Decryption {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::KeyExchange { .. }
                | Self::SignatureCreation { .. }
                | Self::SignatureVerification
                | Self::Padding
                | Self::Decryption { .. }
        )
    }

    /// Returns `true` if the peer sent something unusable.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidPoint { .. } | Self::MalformedMessage { .. } | Self::Common(_)
        )
    }

    /// Returns `true` if this error might indicate tampering.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::SignatureVerification | Self::Padding | Self::InvalidPoint { .. }
        )
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
        let err = CoreError::invalid_point("robolink-kex", "not on curve");
        assert!(err.to_string().contains("robolink-kex"));
        assert!(err.to_string().contains("not on curve"));

        assert_eq!(CoreError::Padding.to_string(), "Padding error");
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::SignatureVerification.is_crypto_error());
        assert!(CoreError::SignatureVerification.is_suspicious());
        assert!(CoreError::Padding.is_crypto_error());

        let malformed = CoreError::malformed("missing field");
        assert!(malformed.is_protocol_error());
        assert!(!malformed.is_crypto_error());
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_input("iv", "bad");
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
        assert!(core.is_protocol_error());
    }
}
