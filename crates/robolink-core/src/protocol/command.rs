// ============================================
// File: crates/robolink-core/src/protocol/command.rs
// ============================================
//! # Command & Response Payloads
//!
//! ## Creation Reason
//! Defines the plaintext JSON carried inside the encrypted envelopes:
//! `{"action": ...}` from the initiator and
//! `{"status": ..., "msg": ..., ...}` from the responder.
//!
//! ## Main Functionality
//! - `Action`: fixed command vocabulary plus `Unknown`
//! - `CommandPayload`: the decrypted command
//! - `ResponsePayload`: status, message and action-specific fields
//!
//! ## Action Wire Strings
//! | Action | Emitted | Also accepted |
//! |--------|---------|---------------|
//! | Connect | `connect` | |
//! | Check | `check` | |
//! | GetPublicKey | `get public key` | `get-public-key` |
//! | Build1 | `build 1` | `build-1` |
//! | Build2 | `build 2` | `build-2` |
//! | AdminLogin | `admin_login` | `admin-login` |
//!
//! ## Last Modified
//! v0.1.0 - Initial payload definitions

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::wire_int::WireInt;

// ============================================
// Response Messages
// ============================================

/// Reply to `connect`.
pub const MSG_CONNECT_SUCCESS: &str = "Connect Success";

/// Reply to `check`.
pub const MSG_CONNECTING: &str = "Connecting";

/// Reply to `get public key`.
pub const MSG_PUBLIC_KEY: &str = "Bob's Public key";

/// Prefix of the `admin_login` reply; the flag follows.
pub const MSG_ADMIN_PREFIX: &str = "Hello, admin!";

/// Reply to an action outside the vocabulary.
pub const MSG_UNKNOWN_COMMAND: &str = "Unknown command";

/// Reply when the command signature does not verify.
pub const MSG_SIGNATURE_FAILED: &str = "Signature verification failed";

/// Reply when no verification key could be fetched.
pub const MSG_NO_VERIFICATION_KEY: &str = "No verification key available";

// ============================================
// Action
// ============================================

/// Command requested by the initiator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Open the robot session.
    Connect,
    /// Liveness check.
    Check,
    /// Ask for the responder's key-exchange point.
    GetPublicKey,
    /// Run build line 1.
    Build1,
    /// Run build line 2.
    Build2,
    /// Privileged login returning the admin secret.
    AdminLogin,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Action {
    /// Parses a wire string, accepting hyphenated aliases.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "connect" => Self::Connect,
            "check" => Self::Check,
            "get public key" | "get-public-key" => Self::GetPublicKey,
            "build 1" | "build-1" => Self::Build1,
            "build 2" | "build-2" => Self::Build2,
            "admin_login" | "admin-login" => Self::AdminLogin,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns the canonical wire string.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Connect => "connect",
            Self::Check => "check",
            Self::GetPublicKey => "get public key",
            Self::Build1 => "build 1",
            Self::Build2 => "build 2",
            Self::AdminLogin => "admin_login",
            Self::Unknown(raw) => raw,
        }
    }

    /// Returns the build line number for build actions.
    #[must_use]
    pub const fn build_line(&self) -> Option<u8> {
        match self {
            Self::Build1 => Some(1),
            Self::Build2 => Some(2),
            _ => None,
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for Action {
    /// Never fails on a well-formed JSON value: non-strings become
    /// `Unknown` carrying their JSON text.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => Self::from_wire(&s),
            other => Self::Unknown(other.to_string()),
        })
    }
}

// ============================================
// CommandPayload
// ============================================

/// Decrypted command body: `{"action": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    /// Requested action; missing means `Unknown("")`
    #[serde(default)]
    pub action: Action,
}

impl CommandPayload {
    /// Creates a payload for `action`.
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self { action }
    }
}

// ============================================
// ResponsePayload
// ============================================

/// Outcome marker of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Command executed
    Ok,
    /// Command rejected or failed
    Error,
}

/// Decrypted response body.
///
/// Optional fields are omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Outcome
    pub status: Status,
    /// Human-readable message
    pub msg: String,
    /// Responder key-exchange x (get public key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<WireInt>,
    /// Responder key-exchange y (get public key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<WireInt>,
    /// Echo of the received ciphertext hex (build)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    /// IV of this response, hex (build)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// Echo of the received `r` as `0x` hex (build)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_r: Option<String>,
    /// Echo of the received `s` as `0x` hex (build)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_s: Option<String>,
}

impl ResponsePayload {
    fn with_status(status: Status, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
            x: None,
            y: None,
            cipher: None,
            iv: None,
            sig_r: None,
            sig_s: None,
        }
    }

    /// Successful response with a message only.
    #[must_use]
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::with_status(Status::Ok, msg)
    }

    /// Error response with a message only.
    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self::with_status(Status::Error, msg)
    }

    /// Attaches a point's coordinates.
    #[must_use]
    pub fn with_point(mut self, x: WireInt, y: WireInt) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Attaches the build echo fields.
    #[must_use]
    pub fn with_build_echo(
        mut self,
        cipher_hex: String,
        iv_hex: String,
        sig_r: &WireInt,
        sig_s: &WireInt,
    ) -> Self {
        self.cipher = Some(cipher_hex);
        self.iv = Some(iv_hex);
        self.sig_r = Some(sig_r.to_hex_string());
        self.sig_s = Some(sig_s.to_hex_string());
        self
    }

    /// Returns `true` for `status == "ok"`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_strings() {
        for action in [
            Action::Connect,
            Action::Check,
            Action::GetPublicKey,
            Action::Build1,
            Action::Build2,
            Action::AdminLogin,
        ] {
            assert_eq!(Action::from_wire(action.as_wire()), action);
        }
        assert_eq!(Action::GetPublicKey.as_wire(), "get public key");
        assert_eq!(Action::AdminLogin.as_wire(), "admin_login");
    }

    #[test]
    fn test_action_aliases() {
        assert_eq!(Action::from_wire("get-public-key"), Action::GetPublicKey);
        assert_eq!(Action::from_wire("build-1"), Action::Build1);
        assert_eq!(Action::from_wire("admin-login"), Action::AdminLogin);
        assert_eq!(
            Action::from_wire("Connect"),
            Action::Unknown("Connect".into())
        );
    }

    #[test]
    fn test_command_payload_json() {
        let json = serde_json::to_string(&CommandPayload::new(Action::Build2)).unwrap();
        assert_eq!(json, r#"{"action":"build 2"}"#);

        let parsed: CommandPayload = serde_json::from_str(r#"{"action": "check"}"#).unwrap();
        assert_eq!(parsed.action, Action::Check);
    }

    #[test]
    fn test_command_payload_lenient_action() {
        let missing: CommandPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.action, Action::Unknown(String::new()));

        let numeric: CommandPayload = serde_json::from_str(r#"{"action": 5}"#).unwrap();
        assert_eq!(numeric.action, Action::Unknown("5".into()));

        // Unrecognised keys are ignored
        let misspelled: CommandPayload =
            serde_json::from_str(r#"{"actpn": "admin_login"}"#).unwrap();
        assert_eq!(misspelled.action, Action::default());
    }

    #[test]
    fn test_response_skips_absent_fields() {
        let json = serde_json::to_string(&ResponsePayload::ok(MSG_CONNECTING)).unwrap();
        assert_eq!(json, r#"{"status":"ok","msg":"Connecting"}"#);

        let err = serde_json::to_string(&ResponsePayload::error(MSG_UNKNOWN_COMMAND)).unwrap();
        assert_eq!(err, r#"{"status":"error","msg":"Unknown command"}"#);
    }

    #[test]
    fn test_build_echo_formats_hex() {
        let resp = ResponsePayload::ok("build line 1 success").with_build_echo(
            "00ff".into(),
            "11".repeat(16),
            &WireInt::from(255u64),
            &WireInt::from(16u64),
        );
        assert_eq!(resp.sig_r.as_deref(), Some("0xff"));
        assert_eq!(resp.sig_s.as_deref(), Some("0x10"));

        let back: ResponsePayload =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(back, resp);
        assert!(back.is_ok());
    }
}
