// ============================================
// File: crates/robolink-core/src/protocol/messages.rs
// ============================================
//! # Protocol Message Definitions
//!
//! ## Creation Reason
//! Defines every JSON document that crosses a socket, plus the helpers
//! that turn plaintext payloads into envelopes and back.
//!
//! ## Main Functionality
//! - `KeyExchangeMessage`: `{"pubx", "puby"}`, both directions
//! - `CommandEnvelope`: `{"cipher", "iv", "sig_r", "sig_s"}`, initiator → responder
//! - `ResponseEnvelope`: `{"cipher", "iv"}`, responder → initiator
//! - `DirectoryRecord`: `{"x", "y"}`, key directory → responder
//!
//! ## Message Flow
//! ```text
//! Initiator                     Responder                 Directory
//!   │── KeyExchangeMessage ────────►│                          │
//!   │◄──────── KeyExchangeMessage ──│                          │
//!   │                               │◄──── DirectoryRecord ────│
//!   │── CommandEnvelope ───────────►│                          │
//!   │◄────────── ResponseEnvelope ──│                          │
//!   │              ...              │                          │
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `cipher` and `iv` are lowercase hex strings; integers use `WireInt`
//! - A `CommandEnvelope` is signed over its `cipher` bytes, so any
//!   re-encoding of the hex (case, whitespace) is harmless but any change
//!   of the bytes is not
//!
//! ## Last Modified
//! v0.1.0 - Initial message definitions

use serde::{Deserialize, Serialize};

use robolink_common::error::CommonError;

use super::command::{CommandPayload, ResponsePayload};
use super::wire_int::WireInt;
use crate::crypto::channel::SecureChannel;
use crate::crypto::curve::{KexCurve, Point};
use crate::crypto::ecdsa::{Signature, SigningKey, VerifyingKey};
use crate::crypto::kex::SessionKey;
use crate::crypto::IV_SIZE;
use crate::error::{CoreError, Result};

// ============================================
// Helpers
// ============================================

fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim())
        .map_err(|e| CommonError::decoding(field, e.to_string()).into())
}

fn point_coordinates<C: crate::crypto::Curve>(
    point: &Point<C>,
) -> Result<(WireInt, WireInt)> {
    match (point.x(), point.y()) {
        (Some(x), Some(y)) => Ok((WireInt::from(x), WireInt::from(y))),
        _ => Err(CoreError::malformed("cannot encode the point at infinity")),
    }
}

// ============================================
// KeyExchangeMessage
// ============================================

/// Key-exchange public point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyExchangeMessage {
    /// Public x-coordinate
    pub pubx: WireInt,
    /// Public y-coordinate
    pub puby: WireInt,
}

impl KeyExchangeMessage {
    /// Encodes a finite key-exchange point.
    ///
    /// # Errors
    /// Returns `MalformedMessage` for the point at infinity.
    pub fn from_point(point: &Point<KexCurve>) -> Result<Self> {
        let (pubx, puby) = point_coordinates(point)?;
        Ok(Self { pubx, puby })
    }

    /// Decodes and validates the point.
    ///
    /// # Errors
    /// Returns `InvalidPoint` if the coordinates are not on the curve.
    pub fn to_point(&self) -> Result<Point<KexCurve>> {
        Point::new(self.pubx.0.clone(), self.puby.0.clone())
    }
}

// ============================================
// CommandEnvelope
// ============================================

/// Encrypted, signed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Ciphertext, hex
    pub cipher: String,
    /// IV, hex
    pub iv: String,
    /// Signature `r`
    pub sig_r: WireInt,
    /// Signature `s`
    pub sig_s: WireInt,
}

impl CommandEnvelope {
    /// Encrypts `payload` under a fresh IV and signs the ciphertext.
    ///
    /// # Errors
    /// Returns an error if serialization, encryption or signing fails.
    pub fn seal(
        channel: &dyn SecureChannel,
        key: &SessionKey,
        signer: &SigningKey,
        payload: &CommandPayload,
    ) -> Result<Self> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| CommonError::encoding("command payload", e.to_string()))?;
        let sealed = channel.encrypt(key, &plaintext)?;
        let signature = signer.sign_ciphertext(&sealed.ciphertext)?;
        Ok(Self {
            cipher: hex::encode(&sealed.ciphertext),
            iv: hex::encode(sealed.iv),
            sig_r: WireInt(signature.r),
            sig_s: WireInt(signature.s),
        })
    }

    /// Decodes the ciphertext bytes.
    ///
    /// # Errors
    /// Returns a decoding error for invalid hex.
    pub fn cipher_bytes(&self) -> Result<Vec<u8>> {
        decode_hex("cipher", &self.cipher)
    }

    /// Decodes the IV bytes; length is checked on decryption.
    ///
    /// # Errors
    /// Returns a decoding error for invalid hex.
    pub fn iv_bytes(&self) -> Result<Vec<u8>> {
        decode_hex("iv", &self.iv)
    }

    /// Returns the carried signature.
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::new(self.sig_r.0.clone(), self.sig_s.0.clone())
    }

    /// Verifies the signature over the ciphertext.
    ///
    /// # Errors
    /// Returns `SignatureVerification` on mismatch, or a decoding error
    /// if `cipher` is not hex.
    pub fn verify(&self, key: &VerifyingKey) -> Result<()> {
        key.verify_ciphertext(&self.cipher_bytes()?, &self.signature())
    }

    /// Verifies, then decrypts and parses the command.
    ///
    /// # Errors
    /// Returns the first failure among verification, decryption and
    /// JSON parsing.
    pub fn open(
        &self,
        channel: &dyn SecureChannel,
        key: &SessionKey,
        verifier: &VerifyingKey,
    ) -> Result<CommandPayload> {
        let ciphertext = self.cipher_bytes()?;
        verifier.verify_ciphertext(&ciphertext, &self.signature())?;
        let plaintext = channel.decrypt(key, &ciphertext, &self.iv_bytes()?)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| CoreError::malformed(format!("command payload: {e}")))
    }
}

// ============================================
// ResponseEnvelope
// ============================================

/// Encrypted response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Ciphertext, hex
    pub cipher: String,
    /// IV, hex
    pub iv: String,
}

impl ResponseEnvelope {
    /// Encrypts `payload` under the caller's IV.
    ///
    /// # Errors
    /// Returns an error if serialization or encryption fails.
    pub fn seal_with_iv(
        channel: &dyn SecureChannel,
        key: &SessionKey,
        iv: &[u8; IV_SIZE],
        payload: &ResponsePayload,
    ) -> Result<Self> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| CommonError::encoding("response payload", e.to_string()))?;
        let ciphertext = channel.encrypt_with_iv(key, iv, &plaintext)?;
        Ok(Self {
            cipher: hex::encode(ciphertext),
            iv: hex::encode(iv),
        })
    }

    /// Decrypts the response and returns the plaintext bytes.
    ///
    /// # Errors
    /// Returns a decoding or decryption error.
    pub fn open_raw(&self, channel: &dyn SecureChannel, key: &SessionKey) -> Result<Vec<u8>> {
        let ciphertext = decode_hex("cipher", &self.cipher)?;
        let iv = decode_hex("iv", &self.iv)?;
        channel.decrypt(key, &ciphertext, &iv)
    }

    /// Decrypts and parses the response.
    ///
    /// # Errors
    /// Returns a decoding, decryption or JSON error.
    pub fn open(&self, channel: &dyn SecureChannel, key: &SessionKey) -> Result<ResponsePayload> {
        let plaintext = self.open_raw(channel, key)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| CoreError::malformed(format!("response payload: {e}")))
    }
}

// ============================================
// DirectoryRecord
// ============================================

/// Published command-signing key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Public x-coordinate on P-256
    pub x: WireInt,
    /// Public y-coordinate on P-256
    pub y: WireInt,
}

impl DirectoryRecord {
    /// Encodes a verifying key.
    ///
    /// # Errors
    /// Never fails for a `VerifyingKey`; kept fallible for symmetry.
    pub fn from_key(key: &VerifyingKey) -> Result<Self> {
        let (x, y) = point_coordinates(key.point())?;
        Ok(Self { x, y })
    }

    /// Decodes and validates the key.
    ///
    /// # Errors
    /// Returns `InvalidPoint` if `(x, y)` is not on P-256.
    pub fn to_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_coordinates(self.x.0.clone(), self.y.0.clone())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{AesCbcChannel, KexKeyPair, NoncePolicy, ScalarRange};
    use crate::protocol::command::Action;

    fn session() -> SessionKey {
        SessionKey::from_bytes([0x5a; 16])
    }

    #[test]
    fn test_key_exchange_message_json_and_validation() {
        let kp = KexKeyPair::generate(ScalarRange::default());
        let msg = KeyExchangeMessage::from_point(kp.public_point()).unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with("{\"pubx\":"));

        let back: KeyExchangeMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(&back.to_point().unwrap(), kp.public_point());

        let tampered = KeyExchangeMessage {
            pubx: back.pubx.clone(),
            puby: WireInt(&back.puby.0 + 1u32),
        };
        assert!(matches!(
            tampered.to_point(),
            Err(CoreError::InvalidPoint { .. })
        ));
        assert!(KeyExchangeMessage::from_point(&Point::infinity()).is_err());
    }

    #[test]
    fn test_command_envelope_seal_open() {
        let key = session();
        let signer = SigningKey::generate(NoncePolicy::PerSignature);
        let envelope = CommandEnvelope::seal(
            &AesCbcChannel,
            &key,
            &signer,
            &CommandPayload::new(Action::GetPublicKey),
        )
        .unwrap();

        assert_eq!(envelope.iv.len(), 32);
        let wire = serde_json::to_string(&envelope).unwrap();
        let parsed: CommandEnvelope = serde_json::from_str(&wire).unwrap();

        let payload = parsed
            .open(&AesCbcChannel, &key, signer.verifying_key())
            .unwrap();
        assert_eq!(payload.action, Action::GetPublicKey);
    }

    #[test]
    fn test_command_envelope_rejects_tampered_signature() {
        let key = session();
        let signer = SigningKey::generate(NoncePolicy::PerSignature);
        let mut envelope = CommandEnvelope::seal(
            &AesCbcChannel,
            &key,
            &signer,
            &CommandPayload::new(Action::Check),
        )
        .unwrap();
        envelope.sig_r = WireInt(&envelope.sig_r.0 + 1u32);

        let err = envelope
            .open(&AesCbcChannel, &key, signer.verifying_key())
            .unwrap_err();
        assert!(matches!(err, CoreError::SignatureVerification));
    }

    #[test]
    fn test_command_envelope_accepts_string_integers() {
        let json = r#"{"cipher": "00", "iv": "00", "sig_r": "0x10", "sig_s": "16"}"#;
        let env: CommandEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.signature(), Signature::new(16u32.into(), 16u32.into()));
    }

    #[test]
    fn test_response_envelope_uses_given_iv() {
        let key = session();
        let iv = [0x01u8; IV_SIZE];
        let env = ResponseEnvelope::seal_with_iv(
            &AesCbcChannel,
            &key,
            &iv,
            &ResponsePayload::ok("Connect Success"),
        )
        .unwrap();
        assert_eq!(env.iv, "01".repeat(16));

        let payload = env.open(&AesCbcChannel, &key).unwrap();
        assert!(payload.is_ok());
        assert_eq!(payload.msg, "Connect Success");
    }

    #[test]
    fn test_directory_record_roundtrip() {
        let signer = SigningKey::generate(NoncePolicy::PerSignature);
        let record = DirectoryRecord::from_key(signer.verifying_key()).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        let back: DirectoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(&back.to_key().unwrap(), signer.verifying_key());

        let bogus = DirectoryRecord {
            x: WireInt::from(1u64),
            y: WireInt::from(1u64),
        };
        assert!(bogus.to_key().is_err());
    }

    #[test]
    fn test_bad_hex_is_decoding_error() {
        let env = CommandEnvelope {
            cipher: "zz".into(),
            iv: "00".into(),
            sig_r: WireInt::from(1u64),
            sig_s: WireInt::from(1u64),
        };
        assert!(matches!(env.cipher_bytes(), Err(CoreError::Common(_))));
    }
}
