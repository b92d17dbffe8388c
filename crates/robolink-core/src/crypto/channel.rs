// ============================================
// File: crates/robolink-core/src/crypto/channel.rs
// ============================================
//! # Secure Channel (AES-128-CBC)
//!
//! ## Creation Reason
//! Commands and responses travel as AES-128-CBC ciphertext under the
//! session key, each with its own random IV.
//!
//! ## Main Functionality
//! - `SecureChannel`: trait for sealing and opening payloads
//! - `AesCbcChannel`: AES-128-CBC with PKCS#7 padding
//! - `generate_iv`: fresh 16-byte IV from the OS RNG
//!
//! ## Message Layout
//! ```text
//! ┌──────────────────────────┐   ┌──────────────────────────────┐
//! │ iv (16 bytes, random)    │   │ ciphertext (n × 16 bytes)    │
//! └──────────────────────────┘   └──────────────────────────────┘
//!              │                               │
//!              └──── sent as separate hex strings in JSON ────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - CBC has no integrity tag. Commands rely on the ECDSA signature;
//!   responses have no authentication at all
//! - `encrypt` always draws a new IV. `encrypt_with_iv` exists only for
//!   the responder, which must echo the IV it generated before dispatch
//!
//! ## Last Modified
//! v0.1.0 - Initial channel implementation

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

use super::kex::SessionKey;
use super::{BLOCK_SIZE, IV_SIZE};
use crate::error::{CoreError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

// ============================================
// Sealed
// ============================================

/// Ciphertext together with the IV it was produced under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// CBC ciphertext, a positive multiple of 16 bytes
    pub ciphertext: Vec<u8>,
    /// IV used for this message
    pub iv: [u8; IV_SIZE],
}

/// Draws a fresh random IV.
#[must_use]
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    OsRng.fill_bytes(&mut iv);
    iv
}

// ============================================
// SecureChannel Trait
// ============================================

/// Symmetric sealing of protocol payloads.
pub trait SecureChannel: Send + Sync {
    /// Encrypts `plaintext` under `key` with the given IV.
    ///
    /// # Errors
    /// Returns `Decryption` only if the cipher cannot be initialised.
    fn encrypt_with_iv(
        &self,
        key: &SessionKey,
        iv: &[u8; IV_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Decrypts `ciphertext` produced under `key` and `iv`.
    ///
    /// # Errors
    /// - `Decryption`: IV is not 16 bytes, or the ciphertext is empty or
    ///   not block aligned
    /// - `Padding`: the last block does not carry valid PKCS#7 padding
    fn decrypt(&self, key: &SessionKey, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>>;

    /// Encrypts `plaintext` under a freshly generated IV.
    ///
    /// # Errors
    /// See [`SecureChannel::encrypt_with_iv`].
    fn encrypt(&self, key: &SessionKey, plaintext: &[u8]) -> Result<Sealed> {
        let iv = generate_iv();
        let ciphertext = self.encrypt_with_iv(key, &iv, plaintext)?;
        Ok(Sealed { ciphertext, iv })
    }
}

// ============================================
// AesCbcChannel
// ============================================

/// AES-128-CBC with PKCS#7 padding.
///
/// # Example
/// ```
/// use robolink_core::crypto::{AesCbcChannel, SecureChannel, SessionKey};
///
/// let key = SessionKey::from_bytes([7u8; 16]);
/// let sealed = AesCbcChannel.encrypt(&key, b"{\"action\": \"check\"}").unwrap();
/// let opened = AesCbcChannel.decrypt(&key, &sealed.ciphertext, &sealed.iv).unwrap();
/// assert_eq!(opened, b"{\"action\": \"check\"}");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct AesCbcChannel;

impl SecureChannel for AesCbcChannel {
    fn encrypt_with_iv(
        &self,
        key: &SessionKey,
        iv: &[u8; IV_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes128CbcEnc::new_from_slices(key.as_bytes(), iv)
            .map_err(|e| CoreError::decryption(format!("cipher init: {e}")))?;
        Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    fn decrypt(&self, key: &SessionKey, ciphertext: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
        if iv.len() != IV_SIZE {
            return Err(CoreError::decryption(format!(
                "IV must be {IV_SIZE} bytes, got {}",
                iv.len()
            )));
        }
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CoreError::decryption(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_SIZE}",
                ciphertext.len()
            )));
        }

        let cipher = Aes128CbcDec::new_from_slices(key.as_bytes(), iv)
            .map_err(|e| CoreError::decryption(format!("cipher init: {e}")))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CoreError::Padding)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SessionKey {
        SessionKey::from_bytes([byte; 16])
    }

    #[test]
    fn test_roundtrip() {
        let k = key(0x11);
        for len in [0usize, 1, 15, 16, 17, 100] {
            let plaintext = vec![0xab; len];
            let sealed = AesCbcChannel.encrypt(&k, &plaintext).unwrap();
            assert_eq!(sealed.ciphertext.len() % BLOCK_SIZE, 0);
            assert!(sealed.ciphertext.len() > len);
            let opened = AesCbcChannel.decrypt(&k, &sealed.ciphertext, &sealed.iv).unwrap();
            assert_eq!(opened, plaintext);
        }
    }

    #[test]
    fn test_fresh_iv_per_message() {
        let k = key(0x22);
        let a = AesCbcChannel.encrypt(&k, b"same").unwrap();
        let b = AesCbcChannel.encrypt(&k, b"same").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_empty_plaintext_pads_full_block() {
        let k = SessionKey::from_bytes([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ]);
        let ct = AesCbcChannel.encrypt_with_iv(&k, &[0u8; 16], b"").unwrap();
        assert_eq!(ct.len(), 16);
        let opened = AesCbcChannel.decrypt(&k, &ct, &[0u8; 16]).unwrap();
        assert!(opened.is_empty());
    }

    #[test]
    fn test_structural_errors() {
        let k = key(0x33);
        let sealed = AesCbcChannel.encrypt(&k, b"payload").unwrap();

        let err = AesCbcChannel.decrypt(&k, &sealed.ciphertext, &[0u8; 8]).unwrap_err();
        assert!(matches!(err, CoreError::Decryption { .. }));

        let err = AesCbcChannel.decrypt(&k, &[], &sealed.iv).unwrap_err();
        assert!(matches!(err, CoreError::Decryption { .. }));

        let err = AesCbcChannel
            .decrypt(&k, &sealed.ciphertext[..15], &sealed.iv)
            .unwrap_err();
        assert!(matches!(err, CoreError::Decryption { .. }));
    }

    #[test]
    fn test_wrong_key_yields_declared_error_or_garbage() {
        let sealed = AesCbcChannel.encrypt(&key(0x44), b"{\"action\": \"connect\"}").unwrap();
        match AesCbcChannel.decrypt(&key(0x45), &sealed.ciphertext, &sealed.iv) {
            Err(CoreError::Padding) => {}
            Ok(bytes) => assert_ne!(bytes, b"{\"action\": \"connect\"}"),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_padding() {
        let k = key(0x55);
        // A single block whose plaintext ends in 0x00 is never valid PKCS#7
        let block = AesCbcChannel.encrypt_with_iv(&k, &[0u8; 16], &[0u8; 16]).unwrap();
        let err = AesCbcChannel.decrypt(&k, &block[..16], &[0u8; 16]).unwrap_err();
        assert!(matches!(err, CoreError::Padding));
    }
}
