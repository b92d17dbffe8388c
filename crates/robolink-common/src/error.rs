// ============================================
// File: crates/robolink-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Base error enum shared by the RoboLink crates. Each crate defines its
//! own error type and wraps `CommonError` transparently.
//!
//! ## Main Functionality
//! - `CommonError`: validation, encoding and timeout failures
//! - `Result<T>`: alias using `CommonError`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include scalars, session keys or flags in error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across RoboLink crates.
///
/// # Example
/// ```
/// use robolink_common::error::{CommonError, Result};
///
/// fn require_hex(field: &str, value: &str) -> Result<Vec<u8>> {
///     hex::decode(value).map_err(|e| CommonError::decoding(field, e.to_string()))
/// }
///
/// assert!(require_hex("iv", "zz").is_err());
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    // ========================================
    // Validation Errors
    // ========================================

    /// Invalid input data provided.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Name of the field or parameter
        field: String,
        /// Description of what's wrong
        reason: String,
    },

    /// Data length doesn't match expected size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    // ========================================
    // Encoding Errors
    // ========================================

    /// Failed to encode/serialize data.
    #[error("Encoding error: {context}: {details}")]
    Encoding {
        /// What was being encoded
        context: String,
        /// Error details
        details: String,
    },

    /// Failed to decode/deserialize data.
    #[error("Decoding error: {context}: {details}")]
    Decoding {
        /// What was being decoded
        context: String,
        /// Error details
        details: String,
    },

    // ========================================
    // Timing Errors
    // ========================================

    /// Operation timed out.
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout {
        /// What operation timed out
        operation: String,
        /// How long we waited
        duration_ms: u64,
    },
}

impl CommonError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidLength` error.
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }

    /// Creates an `Encoding` error.
    pub fn encoding(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Encoding {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Creates a `Decoding` error.
    pub fn decoding(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Decoding {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Returns `true` if this error was caused by malformed peer input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::InvalidLength { .. } | Self::Decoding { .. }
        )
    }

    /// Returns `true` if retrying the operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<hex::FromHexError> for CommonError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Decoding {
            context: "hex decode".into(),
            details: err.to_string(),
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
        let err = CommonError::invalid_input("iv", "must be 16 bytes");
        assert!(err.to_string().contains("iv"));
        assert!(err.to_string().contains("16 bytes"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CommonError::invalid_length(16, 3).is_client_error());
        assert!(!CommonError::invalid_length(16, 3).is_retryable());

        let timeout = CommonError::timeout("recv", 5000);
        assert!(timeout.is_retryable());
        assert!(!timeout.is_client_error());
        assert!(timeout.to_string().contains("5000ms"));
    }

    #[test]
    fn test_hex_error_conversion() {
        let err: CommonError = hex::decode("abc").unwrap_err().into();
        assert!(matches!(err, CommonError::Decoding { .. }));
        assert!(err.is_client_error());
    }
}
