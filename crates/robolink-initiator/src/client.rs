// ============================================
// File: crates/robolink-initiator/src/client.rs
// ============================================
//! # Initiator Session
//!
//! ## Creation Reason
//! Client side of one responder connection: key exchange on connect,
//! then signed and encrypted commands with decrypted replies.
//!
//! ## Main Functionality
//! - `InitiatorSession::connect`: TCP connect + handshake
//! - `InitiatorSession::command`: seal, send, receive, open
//! - `InitiatorSession::send_envelope`: send a pre-built envelope verbatim
//!
//! ## ⚠️ Important Note for Next Developer
//! - Replies are decrypted with the IV the responder put in them, never
//!   with the IV of the request
//!
//! ## Last Modified
//! v0.1.0 - Initial client session

use std::sync::Arc;

use tracing::{debug, info};

use robolink_core::crypto::{
    AesCbcChannel, KexCurve, KexKeyPair, Point, ScalarRange, SessionKey, SigningKey,
};
use robolink_core::protocol::{
    Action, CommandEnvelope, CommandPayload, KeyExchangeMessage, ResponseEnvelope,
    ResponsePayload,
};
use robolink_transport::{FrameLimits, JsonTransport, JsonTransportExt, TcpTransport};

use crate::error::{InitiatorError, Result};

/// Established, keyed connection to a responder.
pub struct InitiatorSession<T: JsonTransport = TcpTransport> {
    transport: T,
    key_pair: KexKeyPair,
    responder_point: Point<KexCurve>,
    session_key: SessionKey,
    signer: Arc<SigningKey>,
    channel: AesCbcChannel,
}

impl InitiatorSession<TcpTransport> {
    /// Connects to `addr` and performs the key exchange.
    ///
    /// # Errors
    /// Returns a transport error or `Handshake`.
    pub async fn connect(
        addr: &str,
        connect_timeout: std::time::Duration,
        limits: FrameLimits,
        signer: Arc<SigningKey>,
        scalar_range: ScalarRange,
    ) -> Result<Self> {
        let transport = TcpTransport::connect_timeout(addr, connect_timeout, limits).await?;
        Self::handshake(transport, signer, scalar_range)
            .await
            .map_err(|e| match e {
                InitiatorError::Core(core) => InitiatorError::handshake(addr, core.to_string()),
                other => other,
            })
    }
}

impl<T: JsonTransport> InitiatorSession<T> {
    /// Performs the key exchange over an open transport.
    ///
    /// # Errors
    /// Returns a transport error, or a core error if the responder's
    /// point is invalid.
    pub async fn handshake(
        mut transport: T,
        signer: Arc<SigningKey>,
        scalar_range: ScalarRange,
    ) -> Result<Self> {
        let key_pair = KexKeyPair::generate(scalar_range);
        transport
            .send_json(&KeyExchangeMessage::from_point(key_pair.public_point())?)
            .await?;

        let reply: KeyExchangeMessage = transport.recv_json().await?;
        let responder_point = reply.to_point()?;
        let session_key = key_pair.derive(&responder_point)?;

        info!(peer = %transport.peer_addr(), "Session key established");
        Ok(Self {
            transport,
            key_pair,
            responder_point,
            session_key,
            signer,
            channel: AesCbcChannel,
        })
    }

    /// Returns the derived session key.
    #[must_use]
    pub const fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Returns our key-exchange point.
    #[must_use]
    pub const fn public_point(&self) -> &Point<KexCurve> {
        self.key_pair.public_point()
    }

    /// Returns the responder's key-exchange point from the handshake.
    #[must_use]
    pub const fn responder_point(&self) -> &Point<KexCurve> {
        &self.responder_point
    }

    /// Returns the signing key.
    #[must_use]
    pub fn signer(&self) -> &SigningKey {
        &self.signer
    }

    /// Encrypts and signs `action` without sending it.
    ///
    /// # Errors
    /// Returns a core error if sealing fails.
    pub fn seal(&self, action: Action) -> Result<CommandEnvelope> {
        Ok(CommandEnvelope::seal(
            &self.channel,
            &self.session_key,
            &self.signer,
            &CommandPayload::new(action),
        )?)
    }

    /// Sends `envelope` as is and returns the raw reply envelope.
    ///
    /// # Errors
    /// Returns a transport error.
    pub async fn send_envelope(&mut self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        self.transport.send_json(envelope).await?;
        let reply: ResponseEnvelope = self.transport.recv_json().await?;
        debug!(iv = %reply.iv, "Received response envelope");
        Ok(reply)
    }

    /// Decrypts a reply into its JSON text.
    ///
    /// # Errors
    /// Returns a core error on bad hex, bad padding or invalid UTF-8.
    pub fn open_text(&self, reply: &ResponseEnvelope) -> Result<String> {
        let plaintext = reply.open_raw(&self.channel, &self.session_key)?;
        String::from_utf8(plaintext).map_err(|e| {
            InitiatorError::Core(robolink_core::CoreError::malformed(format!(
                "response is not UTF-8: {e}"
            )))
        })
    }

    /// Decrypts and parses a reply.
    ///
    /// # Errors
    /// Returns a core error on bad hex, bad padding or unexpected JSON.
    pub fn open(&self, reply: &ResponseEnvelope) -> Result<ResponsePayload> {
        Ok(reply.open(&self.channel, &self.session_key)?)
    }

    /// Seals, sends and opens one command round trip.
    ///
    /// # Errors
    /// Returns the first failure.
    pub async fn command(&mut self, action: Action) -> Result<ResponsePayload> {
        let envelope = self.seal(action)?;
        let reply = self.send_envelope(&envelope).await?;
        self.open(&reply)
    }

    /// Closes the connection.
    ///
    /// # Errors
    /// Returns a transport error if shutdown fails.
    pub async fn close(&mut self) -> Result<()> {
        Ok(self.transport.shutdown().await?)
    }
}

impl<T: JsonTransport> std::fmt::Debug for InitiatorSession<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitiatorSession")
            .field("peer", &self.transport.peer_addr())
            .field("session_key", &self.session_key)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use robolink_core::crypto::NoncePolicy;
    use robolink_core::protocol::WireInt;
    use robolink_transport::bind_listener;

    #[tokio::test]
    async fn test_handshake_derives_matching_key() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let responder = tokio::spawn(async move {
            let mut t = TcpTransport::accept(&listener, FrameLimits::default())
                .await
                .unwrap();
            let hello: KeyExchangeMessage = t.recv_json().await.unwrap();
            let kp = KexKeyPair::generate(ScalarRange::default());
            t.send_json(&KeyExchangeMessage::from_point(kp.public_point()).unwrap())
                .await
                .unwrap();
            kp.derive(&hello.to_point().unwrap()).unwrap()
        });

        let signer = Arc::new(SigningKey::generate(NoncePolicy::PerSignature));
        let session = InitiatorSession::connect(
            &addr,
            std::time::Duration::from_secs(1),
            FrameLimits::default(),
            signer,
            ScalarRange::default(),
        )
        .await
        .unwrap();

        assert_eq!(session.session_key(), &responder.await.unwrap());
        assert!(format!("{session:?}").contains("REDACTED"));
    }

    #[tokio::test]
    async fn test_handshake_rejects_invalid_responder_point() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let mut t = TcpTransport::accept(&listener, FrameLimits::default())
                .await
                .unwrap();
            let _: KeyExchangeMessage = t.recv_json().await.unwrap();
            let bogus = KeyExchangeMessage {
                pubx: WireInt::from(2u64),
                puby: WireInt::from(3u64),
            };
            t.send_json(&bogus).await.unwrap();
        });

        let signer = Arc::new(SigningKey::generate(NoncePolicy::PerSignature));
        let err = InitiatorSession::connect(
            &addr,
            std::time::Duration::from_secs(1),
            FrameLimits::default(),
            signer,
            ScalarRange::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InitiatorError::Handshake { .. }));
    }
}
