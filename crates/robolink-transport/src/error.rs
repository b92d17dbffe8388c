// ============================================
// File: crates/robolink-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types for socket setup, JSON framing and timed I/O.
//!
//! ## Main Functionality
//! - `TransportError`: Primary error enum for transport operations
//! - Error conversion from system errors
//! - Categorization of retryable vs fatal errors
//!
//! ## Error Categories
//! 1. **Network Errors**: bind, connect, send and receive failures
//! 2. **Framing Errors**: oversized or malformed JSON documents
//! 3. **Configuration Errors**: unparseable addresses
//! 4. **Lifecycle Errors**: peer closed the connection, timeouts
//!
//! ## ⚠️ Important Note for Next Developer
//! - `ConnectionClosed` is the normal end of a session, not a failure;
//!   callers log it at `info!`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use robolink_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// Failed to bind to address.
    #[error("Failed to bind to {addr}: {reason}")]
    BindFailed {
        /// Address we tried to bind to
        addr: SocketAddr,
        /// Why binding failed
        reason: String,
    },

    /// Address already in use.
    #[error("Address {addr} already in use")]
    AddressInUse {
        /// The address that's in use
        addr: SocketAddr,
    },

    /// Outbound connection failed.
    #[error("Failed to connect to {addr}: {reason}")]
    ConnectFailed {
        /// Target address as configured
        addr: String,
        /// Why the connection failed
        reason: String,
    },

    /// Send operation failed.
    #[error("Failed to send to {peer}: {reason}")]
    SendFailed {
        /// Peer address
        peer: SocketAddr,
        /// Why send failed
        reason: String,
    },

    /// Receive operation failed.
    #[error("Failed to receive: {reason}")]
    ReceiveFailed {
        /// Why receive failed
        reason: String,
    },

    /// Peer closed the connection between messages.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    // ========================================
    // Framing Errors
    // ========================================

    /// Buffered message exceeds the configured limit.
    #[error("Message of {size} bytes exceeds limit of {limit}")]
    MessageTooLarge {
        /// Bytes buffered so far
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// Bytes on the wire are not a JSON object.
    #[error("Malformed frame: {reason}")]
    MalformedFrame {
        /// What was wrong
        reason: String,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Invalid socket address.
    #[error("Invalid address: {addr}")]
    InvalidAddress {
        /// The invalid address string
        addr: String,
    },

    // ========================================
    // Lifecycle Errors
    // ========================================

    /// Operation timed out.
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout {
        /// What operation timed out
        operation: String,
        /// How long we waited
        duration_ms: u64,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// I/O error from the system.
    #[error("I/O error: {context}")]
    Io {
        /// What was happening when the error occurred
        context: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `BindFailed` error.
    pub fn bind_failed(addr: SocketAddr, reason: impl Into<String>) -> Self {
        Self::BindFailed {
            addr,
            reason: reason.into(),
        }
    }

    /// Creates a `ConnectFailed` error.
    pub fn connect_failed(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            addr: addr.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedFrame` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
        }
    }

    /// Creates an `Io` error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this error is transient and retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectFailed { .. } => true,
            Self::Io { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::WouldBlock
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::ConnectionRefused
            ),
            _ => false,
        }
    }

    /// Returns `true` if this is a network-related error.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::BindFailed { .. }
                | Self::AddressInUse { .. }
                | Self::ConnectFailed { .. }
                | Self::SendFailed { .. }
                | Self::ReceiveFailed { .. }
        )
    }

    /// Returns `true` if the peer sent bytes that cannot be framed.
    #[must_use]
    pub const fn is_framing_error(&self) -> bool {
        matches!(
            self,
            Self::MessageTooLarge { .. } | Self::MalformedFrame { .. }
        )
    }

    /// Returns `true` if the peer closed the connection cleanly.
    #[must_use]
    pub const fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            context: "unspecified I/O operation".into(),
            source: err,
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
        let err = TransportError::bind_failed("127.0.0.1:8888".parse().unwrap(), "denied");
        assert!(err.to_string().contains("127.0.0.1:8888"));
        assert!(err.to_string().contains("denied"));

        let err = TransportError::MessageTooLarge {
            size: 70_000,
            limit: 65_536,
        };
        assert!(err.to_string().contains("65536"));
    }

    #[test]
    fn test_error_classification() {
        let connect = TransportError::connect_failed("localhost:10002", "refused");
        assert!(connect.is_network_error());
        assert!(connect.is_retryable());

        let framing = TransportError::malformed("not json");
        assert!(framing.is_framing_error());
        assert!(!framing.is_retryable());

        assert!(TransportError::ConnectionClosed.is_connection_closed());
        assert!(TransportError::timeout("recv", 10).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: TransportError = io_err.into();
        assert!(err.is_retryable());
    }
}
