// ============================================
// File: crates/robolink-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Main Functionality
//! - `ConnectionId`: random tag assigned to every accepted or dialed
//!   connection, carried as a `tracing` field so that all log lines of
//!   one session can be grepped together
//!
//! ## ⚠️ Important Note for Next Developer
//! - `ConnectionId` is NOT a security token; it never appears on the wire
//!
//! ## Last Modified
//! v0.1.0 - Initial type definitions

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

// ============================================
// Constants
// ============================================

/// Size of ConnectionId in bytes.
pub const CONNECTION_ID_SIZE: usize = 8;

// ============================================
// ConnectionId
// ============================================

/// Identifier for one TCP connection, used only for log correlation.
///
/// # Example
/// ```
/// use robolink_common::types::ConnectionId;
///
/// let id = ConnectionId::generate();
/// let restored: ConnectionId = id.to_string().parse().unwrap();
/// assert_eq!(id, restored);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId([u8; CONNECTION_ID_SIZE]);

impl ConnectionId {
    /// Generates a new random `ConnectionId`.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = [0u8; CONNECTION_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut id);
        Self(id)
    }

    /// Creates a `ConnectionId` from raw bytes.
    ///
    /// Returns `None` unless exactly 8 bytes are given.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let id: [u8; CONNECTION_ID_SIZE] = bytes.try_into().ok()?;
        Some(Self(id))
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CONNECTION_ID_SIZE] {
        &self.0
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", hex::encode(self.0))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ConnectionId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
            .ok_or_else(|| CommonError::invalid_length(CONNECTION_ID_SIZE, bytes.len()))
    }
}

impl Serialize for ConnectionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ConnectionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_generation() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_connection_id_parse_rejects_wrong_length() {
        let err = "abcd".parse::<ConnectionId>().unwrap_err();
        assert!(matches!(err, CommonError::InvalidLength { expected: 8, actual: 2 }));
    }

    #[test]
    fn test_connection_id_serialization() {
        let id = ConnectionId::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"0102030405060708\"");

        let restored: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }
}
