// ============================================
// File: crates/robolink-responder/src/dispatch.rs
// ============================================
//! # Command Dispatcher
//!
//! ## Creation Reason
//! Maps an authenticated, decrypted command to its response payload.
//! Runs only after signature verification and decryption succeeded.
//!
//! ## Main Functionality
//! - `CommandHandler`: action → `ResponsePayload`
//! - `DispatchContext`: per-command inputs (responder point, envelope,
//!   response IV)
//! - `FlagProvider`: source of the admin secret
//!
//! ## Response Table
//! | Action | msg | extra fields |
//! |--------|-----|--------------|
//! | connect | Connect Success | |
//! | check | Connecting | |
//! | get public key | Bob's Public key | x, y |
//! | build N | build line N success | cipher, iv, sig_r, sig_s |
//! | admin_login | Hello, admin! {flag} | |
//! | other | Unknown command (error) | |
//!
//! ## ⚠️ Important Note for Next Developer
//! - The build echo carries the IV of the response it travels in; the
//!   session must pass the same IV it encrypts with
//!
//! ## Last Modified
//! v0.1.0 - Initial dispatcher

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use robolink_core::crypto::{KexCurve, Point, IV_SIZE};
use robolink_core::protocol::command::{
    MSG_ADMIN_PREFIX, MSG_CONNECTING, MSG_CONNECT_SUCCESS, MSG_PUBLIC_KEY,
};
use robolink_core::protocol::{Action, CommandEnvelope, ResponsePayload, WireInt};

use crate::error::{ResponderError, Result, SessionError};

// ============================================
// FlagProvider
// ============================================

/// Supplies the secret returned by a successful `admin_login`.
pub trait FlagProvider: Send + Sync + fmt::Debug {
    /// Returns the current secret.
    ///
    /// # Errors
    /// Returns `AdminSecret` if the secret cannot be read.
    fn flag(&self) -> Result<String>;
}

/// Secret fixed in configuration.
#[derive(Clone)]
pub struct StaticFlag(String);

impl StaticFlag {
    /// Wraps a literal secret.
    pub fn new(flag: impl Into<String>) -> Self {
        Self(flag.into())
    }
}

impl fmt::Debug for StaticFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticFlag([REDACTED])")
    }
}

impl FlagProvider for StaticFlag {
    fn flag(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Secret read from a file on every request.
#[derive(Debug, Clone)]
pub struct FileFlag {
    path: PathBuf,
}

impl FileFlag {
    /// Reads the secret from `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FlagProvider for FileFlag {
    fn flag(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| {
                ResponderError::admin_secret(format!("{}: {e}", self.path.display()))
            })
    }
}

/// Secret read from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvFlag {
    var: String,
}

impl EnvFlag {
    /// Reads the secret from `var`.
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl FlagProvider for EnvFlag {
    fn flag(&self) -> Result<String> {
        std::env::var(&self.var)
            .map_err(|e| ResponderError::admin_secret(format!("{}: {e}", self.var)))
    }
}

/// No secret configured.
#[derive(Debug, Clone, Copy)]
pub struct MissingFlag;

impl FlagProvider for MissingFlag {
    fn flag(&self) -> Result<String> {
        Err(ResponderError::admin_secret("no admin secret configured"))
    }
}

// ============================================
// DispatchContext
// ============================================

/// Inputs a single dispatch may echo back.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    /// Responder's key-exchange point for this session
    pub responder_point: &'a Point<KexCurve>,
    /// The envelope the command arrived in
    pub envelope: &'a CommandEnvelope,
    /// IV of the response being built
    pub response_iv: &'a [u8; IV_SIZE],
}

// ============================================
// CommandHandler
// ============================================

/// Stateless action dispatcher shared across sessions.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    flag: Arc<dyn FlagProvider>,
}

impl CommandHandler {
    /// Creates a handler using `flag` for admin_login.
    #[must_use]
    pub fn new(flag: Arc<dyn FlagProvider>) -> Self {
        Self { flag }
    }

    /// Produces the response for an authenticated command.
    ///
    /// # Errors
    /// - `Dispatch` for actions outside the vocabulary
    /// - `AdminSecret` if admin_login cannot read the secret
    /// - `Handshake` if the responder point is the point at infinity
    pub fn dispatch(
        &self,
        action: &Action,
        ctx: &DispatchContext<'_>,
    ) -> std::result::Result<ResponsePayload, SessionError> {
        debug!(action = %action, "Dispatching command");

        let response = match action {
            Action::Connect => ResponsePayload::ok(MSG_CONNECT_SUCCESS),
            Action::Check => ResponsePayload::ok(MSG_CONNECTING),
            Action::GetPublicKey => {
                let (x, y) = match (ctx.responder_point.x(), ctx.responder_point.y()) {
                    (Some(x), Some(y)) => (WireInt::from(x), WireInt::from(y)),
                    _ => return Err(SessionError::malformed("responder point is infinity")),
                };
                ResponsePayload::ok(MSG_PUBLIC_KEY).with_point(x, y)
            }
            Action::Build1 | Action::Build2 => {
                let line = action.build_line().unwrap_or_default();
                info!(line, "Build line executed");
                ResponsePayload::ok(format!("build line {line} success")).with_build_echo(
                    ctx.envelope.cipher.clone(),
                    hex::encode(ctx.response_iv),
                    &ctx.envelope.sig_r,
                    &ctx.envelope.sig_s,
                )
            }
            Action::AdminLogin => {
                let flag = self.flag.flag().map_err(|e| {
                    error!(error = %e, "Admin secret lookup failed");
                    SessionError::AdminSecret {
                        reason: e.to_string(),
                    }
                })?;
                info!("Admin login granted");
                ResponsePayload::ok(format!("{MSG_ADMIN_PREFIX} {flag}"))
            }
            Action::Unknown(raw) => {
                return Err(SessionError::Dispatch {
                    action: raw.clone(),
                })
            }
        };

        Ok(response)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use robolink_core::crypto::{KexKeyPair, ScalarRange};
    use robolink_core::protocol::Status;

    fn envelope() -> CommandEnvelope {
        CommandEnvelope {
            cipher: "00ff".repeat(8),
            iv: "11".repeat(16),
            sig_r: WireInt::from(255u64),
            sig_s: WireInt::from(4096u64),
        }
    }

    fn handler() -> CommandHandler {
        CommandHandler::new(Arc::new(StaticFlag::new("FLAG{unit}")))
    }

    #[test]
    fn test_simple_actions() {
        let kp = KexKeyPair::generate(ScalarRange::default());
        let env = envelope();
        let iv = [0x22u8; IV_SIZE];
        let ctx = DispatchContext {
            responder_point: kp.public_point(),
            envelope: &env,
            response_iv: &iv,
        };

        let resp = handler().dispatch(&Action::Connect, &ctx).unwrap();
        assert_eq!(resp, ResponsePayload::ok("Connect Success"));

        let resp = handler().dispatch(&Action::Check, &ctx).unwrap();
        assert_eq!(resp.msg, "Connecting");

        let resp = handler().dispatch(&Action::GetPublicKey, &ctx).unwrap();
        assert_eq!(resp.msg, "Bob's Public key");
        assert_eq!(resp.x.unwrap().as_biguint(), kp.public_point().x().unwrap());
    }

    #[test]
    fn test_public_key_at_infinity_keeps_session() {
        let env = envelope();
        let iv = [0u8; IV_SIZE];
        let infinity = Point::<KexCurve>::infinity();
        let ctx = DispatchContext {
            responder_point: &infinity,
            envelope: &env,
            response_iv: &iv,
        };

        let err = handler()
            .dispatch(&Action::GetPublicKey, &ctx)
            .unwrap_err();
        assert!(matches!(err, SessionError::MalformedCommand { .. }));
        assert!(err.is_recoverable());

        let resp = handler().dispatch(&Action::Check, &ctx).unwrap();
        assert_eq!(resp.status, Status::Ok);
    }

    #[test]
    fn test_build_echo_uses_response_iv() {
        let kp = KexKeyPair::generate(ScalarRange::default());
        let env = envelope();
        let iv = [0x22u8; IV_SIZE];
        let ctx = DispatchContext {
            responder_point: kp.public_point(),
            envelope: &env,
            response_iv: &iv,
        };

        let resp = handler().dispatch(&Action::Build2, &ctx).unwrap();
        assert_eq!(resp.msg, "build line 2 success");
        assert_eq!(resp.cipher.as_deref(), Some(env.cipher.as_str()));
        assert_eq!(resp.iv, Some("22".repeat(16)));
        assert_eq!(resp.sig_r.as_deref(), Some("0xff"));
        assert_eq!(resp.sig_s.as_deref(), Some("0x1000"));
    }

    #[test]
    fn test_admin_login_and_unknown() {
        let kp = KexKeyPair::generate(ScalarRange::default());
        let env = envelope();
        let iv = [0u8; IV_SIZE];
        let ctx = DispatchContext {
            responder_point: kp.public_point(),
            envelope: &env,
            response_iv: &iv,
        };

        let resp = handler().dispatch(&Action::AdminLogin, &ctx).unwrap();
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(resp.msg, "Hello, admin! FLAG{unit}");

        let err = handler()
            .dispatch(&Action::Unknown("self destruct".into()), &ctx)
            .unwrap_err();
        assert!(matches!(err, SessionError::Dispatch { ref action } if action == "self destruct"));

        let no_flag = CommandHandler::new(Arc::new(MissingFlag));
        assert!(matches!(
            no_flag.dispatch(&Action::AdminLogin, &ctx),
            Err(SessionError::AdminSecret { .. })
        ));
    }

    #[test]
    fn test_file_flag_trims_newline() {
        let path = std::env::temp_dir().join(format!("robolink-flag-{}", std::process::id()));
        std::fs::write(&path, "FLAG{file}\n").unwrap();
        assert_eq!(FileFlag::new(path.clone()).flag().unwrap(), "FLAG{file}");
        std::fs::remove_file(&path).unwrap();
        assert!(FileFlag::new(path).flag().is_err());
    }

    #[test]
    fn test_static_flag_debug_redacts() {
        let debug = format!("{:?}", StaticFlag::new("FLAG{secret}"));
        assert!(!debug.contains("secret"));
    }
}
