// ============================================
// File: crates/robolink-responder/src/session.rs
// ============================================
//! # Command Session
//!
//! ## Creation Reason
//! One accepted connection is one `CommandSession`: a small state
//! machine that performs the key exchange and then serves signed,
//! encrypted commands until the peer goes away.
//!
//! ## State Machine
//! ```text
//!   ┌────────────────────┐  {"pubx","puby"} valid   ┌────────────┐
//!   │ AwaitingHandshake  │─────────────────────────►│   Active   │
//!   └─────────┬──────────┘                          └─────┬──────┘
//!             │ invalid point / I/O error                 │ per envelope:
//!             ▼                                           │  iv ← random
//!          closed                                         │  verify sig
//!                                                         │  decrypt
//!                                                         │  dispatch
//!                                                         │  seal(iv)
//!                                                         ▼
//!                                               closed on EOF / timeout
//! ```
//!
//! ## Main Functionality
//! - `CommandSession::handshake`: ECDH over the key-exchange curve
//! - `CommandSession::process`: verify → decrypt → dispatch for one frame
//! - `CommandSession::run`: full lifecycle
//!
//! ## ⚠️ Important Note for Next Developer
//! - The response IV is drawn before the command is looked at; the same
//!   IV goes into the build echo and the encryption
//! - Without a verifier every command is rejected, nothing is executed
//!
//! ## Last Modified
//! v0.1.0 - Initial session state machine

use std::sync::Arc;

use tracing::{debug, info, warn};

use robolink_common::ConnectionId;
use robolink_core::crypto::{
    generate_iv, AesCbcChannel, KexKeyPair, ScalarRange, SessionKey, VerifyingKey, IV_SIZE,
};
use robolink_core::protocol::{
    CommandEnvelope, KeyExchangeMessage, ResponseEnvelope, ResponsePayload,
};
use robolink_transport::{JsonTransport, JsonTransportExt};

use crate::dispatch::{CommandHandler, DispatchContext};
use crate::error::SessionError;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

// ============================================
// SessionState
// ============================================

/// Where a session is in its lifecycle.
pub enum SessionState {
    /// Waiting for the initiator's key-exchange point.
    AwaitingHandshake,
    /// Session key established.
    Active {
        /// Responder's ephemeral key pair
        key_pair: KexKeyPair,
        /// Derived AES key
        session_key: SessionKey,
    },
}

impl SessionState {
    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AwaitingHandshake => "awaiting-handshake",
            Self::Active { .. } => "active",
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Commands executed
    pub executed: u64,
    /// Commands answered with an error
    pub rejected: u64,
}

// ============================================
// CommandSession
// ============================================

/// Responder side of one connection.
pub struct CommandSession<T: JsonTransport> {
    id: ConnectionId,
    transport: T,
    verifier: Option<VerifyingKey>,
    handler: Arc<CommandHandler>,
    channel: AesCbcChannel,
    scalar_range: ScalarRange,
    state: SessionState,
    summary: SessionSummary,
}

impl<T: JsonTransport> CommandSession<T> {
    /// Creates a session in `AwaitingHandshake`.
    ///
    /// `verifier` is the initiator's key fetched for this connection, if
    /// any.
    pub fn new(
        transport: T,
        verifier: Option<VerifyingKey>,
        handler: Arc<CommandHandler>,
        scalar_range: ScalarRange,
    ) -> Self {
        Self {
            id: ConnectionId::generate(),
            transport,
            verifier,
            handler,
            channel: AesCbcChannel,
            scalar_range,
            state: SessionState::AwaitingHandshake,
            summary: SessionSummary::default(),
        }
    }

    /// Returns the log correlation id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns `true` once the key exchange completed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    // ========================================
    // Handshake
    // ========================================

    /// Receives the initiator's point, answers with a fresh one and
    /// derives the session key.
    ///
    /// # Errors
    /// - `Handshake`: invalid point, or called twice
    /// - `Transport`: I/O failure or undecodable message
    pub async fn handshake(&mut self) -> SessionResult<()> {
        if self.is_active() {
            return Err(SessionError::handshake("session already established"));
        }

        let message: KeyExchangeMessage = self.transport.recv_json().await?;
        let peer_point = message.to_point().map_err(|e| {
            warn!(connection = %self.id, error = %e, "Rejected initiator key-exchange point");
            SessionError::from(e)
        })?;

        let key_pair = KexKeyPair::generate(self.scalar_range);
        let reply = KeyExchangeMessage::from_point(key_pair.public_point())?;
        self.transport.send_json(&reply).await?;

        let session_key = key_pair.derive(&peer_point)?;
        self.state = SessionState::Active {
            key_pair,
            session_key,
        };

        info!(connection = %self.id, peer = %self.transport.peer_addr(), "Session key established");
        Ok(())
    }

    // ========================================
    // Command Processing
    // ========================================

    /// Verifies, decrypts and dispatches one raw envelope.
    ///
    /// # Errors
    /// Any recoverable `SessionError`; the caller turns it into an
    /// encrypted error response.
    pub fn process(
        &self,
        frame: &[u8],
        response_iv: &[u8; IV_SIZE],
    ) -> SessionResult<ResponsePayload> {
        let SessionState::Active {
            key_pair,
            session_key,
        } = &self.state
        else {
            return Err(SessionError::handshake("session not established"));
        };

        let envelope: CommandEnvelope = serde_json::from_slice(frame)
            .map_err(|e| SessionError::malformed(format!("envelope: {e}")))?;

        let verifier = self
            .verifier
            .as_ref()
            .ok_or(SessionError::DirectoryUnavailable)?;

        let command = envelope.open(&self.channel, session_key, verifier)?;

        let ctx = DispatchContext {
            responder_point: key_pair.public_point(),
            envelope: &envelope,
            response_iv,
        };
        self.handler.dispatch(&command.action, &ctx)
    }

    async fn send_response(
        &mut self,
        iv: &[u8; IV_SIZE],
        payload: &ResponsePayload,
    ) -> SessionResult<()> {
        let SessionState::Active { session_key, .. } = &self.state else {
            return Err(SessionError::handshake("session not established"));
        };
        let envelope = ResponseEnvelope::seal_with_iv(&self.channel, session_key, iv, payload)?;
        self.transport.send_json(&envelope).await?;
        Ok(())
    }

    fn record_error(&mut self, error: &SessionError) -> ResponsePayload {
        self.summary.rejected += 1;
        if error.is_suspicious() {
            warn!(connection = %self.id, error = %error, "Command rejected");
        } else {
            info!(connection = %self.id, error = %error, "Command failed");
        }
        ResponsePayload::error(error.response_message())
    }

    // ========================================
    // Lifecycle
    // ========================================

    /// Runs the session to completion.
    ///
    /// Returns normally when the peer closes between commands.
    ///
    /// # Errors
    /// Returns the fatal error that ended the session.
    pub async fn run(mut self) -> SessionResult<SessionSummary> {
        if let Err(e) = self.handshake().await {
            warn!(connection = %self.id, error = %e, "Handshake failed; closing connection");
            self.close().await;
            return Err(e);
        }

        loop {
            let frame = match self.transport.recv_frame().await {
                Ok(frame) => frame,
                Err(e) if e.is_connection_closed() => break,
                Err(e) if e.is_framing_error() => {
                    let error = SessionError::from(e);
                    let response = self.record_error(&error);
                    let iv = generate_iv();
                    if let Err(send_error) = self.send_response(&iv, &response).await {
                        debug!(connection = %self.id, error = %send_error, "Could not report framing error");
                    }
                    self.close().await;
                    return Err(error);
                }
                Err(e) => {
                    self.close().await;
                    return Err(e.into());
                }
            };

            let iv = generate_iv();
            let response = match self.process(&frame, &iv) {
                Ok(response) => {
                    self.summary.executed += 1;
                    response
                }
                Err(e) if e.is_recoverable() => self.record_error(&e),
                Err(e) => {
                    self.close().await;
                    return Err(e);
                }
            };

            if let Err(e) = self.send_response(&iv, &response).await {
                self.close().await;
                return Err(e);
            }
        }

        info!(
            connection = %self.id,
            executed = self.summary.executed,
            rejected = self.summary.rejected,
            "Session closed by peer"
        );
        self.close().await;
        Ok(self.summary)
    }

    async fn close(&mut self) {
        if let Err(e) = self.transport.shutdown().await {
            debug!(connection = %self.id, error = %e, "Shutdown after session end failed");
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use robolink_core::crypto::{NoncePolicy, SecureChannel, SigningKey};
    use robolink_core::protocol::{Action, CommandPayload, Status, WireInt};
    use robolink_transport::{bind_listener, FrameLimits, TcpTransport};

    use crate::dispatch::StaticFlag;

    fn handler() -> Arc<CommandHandler> {
        Arc::new(CommandHandler::new(Arc::new(StaticFlag::new("FLAG{session}"))))
    }

    /// Connected (responder session, initiator raw transport) pair.
    async fn pair(
        verifier: Option<VerifyingKey>,
    ) -> (CommandSession<TcpTransport>, TcpTransport) {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (accepted, client) = tokio::join!(
            TcpTransport::accept(&listener, FrameLimits::default()),
            TcpTransport::connect(&addr, FrameLimits::default()),
        );
        let session = CommandSession::new(
            accepted.unwrap(),
            verifier,
            handler(),
            ScalarRange::default(),
        );
        (session, client.unwrap())
    }

    async fn client_handshake(client: &mut TcpTransport) -> SessionKey {
        let kp = KexKeyPair::generate(ScalarRange::default());
        client
            .send_json(&KeyExchangeMessage::from_point(kp.public_point()).unwrap())
            .await
            .unwrap();
        let reply: KeyExchangeMessage = client.recv_json().await.unwrap();
        kp.derive(&reply.to_point().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_handshake_moves_to_active() {
        let (mut session, mut client) = pair(None).await;
        assert_eq!(session.state().name(), "awaiting-handshake");

        let (server, key) = tokio::join!(session.handshake(), client_handshake(&mut client));
        server.unwrap();
        assert!(session.is_active());

        let SessionState::Active { session_key, .. } = session.state() else {
            panic!("not active");
        };
        assert_eq!(session_key, &key);
        assert!(session.handshake().await.is_err());
    }

    #[tokio::test]
    async fn test_handshake_rejects_off_curve_point() {
        let (session, mut client) = pair(None).await;
        let bogus = KeyExchangeMessage {
            pubx: WireInt::from(1u64),
            puby: WireInt::from(1u64),
        };
        client.send_json(&bogus).await.unwrap();

        let err = session.run().await.unwrap_err();
        assert!(matches!(err, SessionError::Handshake { .. }));
        assert!(client.recv_frame().await.unwrap_err().is_connection_closed());
    }

    #[tokio::test]
    async fn test_process_requires_verifier() {
        let (mut session, mut client) = pair(None).await;
        let (server, key) = tokio::join!(session.handshake(), client_handshake(&mut client));
        server.unwrap();

        let signer = SigningKey::generate(NoncePolicy::PerSignature);
        let envelope = CommandEnvelope::seal(
            &AesCbcChannel,
            &key,
            &signer,
            &CommandPayload::new(Action::Connect),
        )
        .unwrap();
        let frame = serde_json::to_vec(&envelope).unwrap();

        let err = session.process(&frame, &[0u8; IV_SIZE]).unwrap_err();
        assert!(matches!(err, SessionError::DirectoryUnavailable));
    }

    #[tokio::test]
    async fn test_process_verifies_before_decrypting() {
        let signer = SigningKey::generate(NoncePolicy::PerSignature);
        let (mut session, mut client) = pair(Some(signer.verifying_key().clone())).await;
        let (server, key) = tokio::join!(session.handshake(), client_handshake(&mut client));
        server.unwrap();

        // Valid signature over garbage ciphertext: verification passes, padding fails.
        let garbage = vec![0xabu8; 32];
        let sig = signer.sign_ciphertext(&garbage).unwrap();
        let envelope = CommandEnvelope {
            cipher: hex::encode(&garbage),
            iv: "00".repeat(16),
            sig_r: WireInt(sig.r.clone()),
            sig_s: WireInt(sig.s.clone()),
        };
        let frame = serde_json::to_vec(&envelope).unwrap();
        let err = session.process(&frame, &[0u8; IV_SIZE]).unwrap_err();
        assert!(matches!(err, SessionError::Padding | SessionError::MalformedCommand { .. }));

        // Same ciphertext, forged signature: rejected before decryption.
        let forged = CommandEnvelope {
            sig_s: WireInt(&sig.s + 1u32),
            ..envelope
        };
        let frame = serde_json::to_vec(&forged).unwrap();
        let err = session.process(&frame, &[0u8; IV_SIZE]).unwrap_err();
        assert!(matches!(err, SessionError::Verification));

        // Well-formed command executes.
        let good = CommandEnvelope::seal(
            &AesCbcChannel,
            &key,
            &signer,
            &CommandPayload::new(Action::Check),
        )
        .unwrap();
        let frame = serde_json::to_vec(&good).unwrap();
        let resp = session.process(&frame, &[0u8; IV_SIZE]).unwrap();
        assert_eq!(resp.msg, "Connecting");
    }

    #[tokio::test]
    async fn test_run_answers_malformed_envelope_and_continues() {
        let signer = SigningKey::generate(NoncePolicy::PerSignature);
        let (session, mut client) = pair(Some(signer.verifying_key().clone())).await;
        let server = tokio::spawn(session.run());

        let key = client_handshake(&mut client).await;
        client.send_frame(br#"{"cipher": "00"}"#).await.unwrap();
        let reply: ResponseEnvelope = client.recv_json().await.unwrap();
        let payload = reply.open(&AesCbcChannel, &key).unwrap();
        assert_eq!(payload.status, Status::Error);

        let good = CommandEnvelope::seal(
            &AesCbcChannel,
            &key,
            &signer,
            &CommandPayload::new(Action::Connect),
        )
        .unwrap();
        client.send_json(&good).await.unwrap();
        let reply: ResponseEnvelope = client.recv_json().await.unwrap();
        let plaintext = AesCbcChannel
            .decrypt(
                &key,
                &hex::decode(&reply.cipher).unwrap(),
                &hex::decode(&reply.iv).unwrap(),
            )
            .unwrap();
        assert_eq!(plaintext, br#"{"status":"ok","msg":"Connect Success"}"#);

        drop(client);
        let summary = server.await.unwrap().unwrap();
        assert_eq!(summary, SessionSummary { executed: 1, rejected: 1 });
    }
}
