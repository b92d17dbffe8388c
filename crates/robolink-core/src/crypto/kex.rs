// ============================================
// File: crates/robolink-core/src/crypto/kex.rs
// ============================================
//! # Key Exchange
//!
//! ## Creation Reason
//! Both peers generate a fresh key pair on the custom curve for every
//! connection and agree on a 16-byte AES key from the shared point.
//!
//! ## Main Functionality
//! - `ScalarRange`: bounded range the private scalar is drawn from
//! - `KexKeyPair`: private scalar plus public point
//! - `SessionKey`: derived AES-128 key, zeroed on drop
//! - `brute_force_scalar`: exhaustive search of a bounded range
//!
//! ## Key Derivation
//! ```text
//! shared      = peer_public · own_scalar
//! session_key = SHA-256(minimal_be_bytes(shared.x))[0..16]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The default range `[100000, 1000000)` is deliberately tiny to stay
//!   wire compatible with deployed peers; `brute_force_scalar` walks it
//!   in seconds. Widen it in config when both sides allow
//! - The private scalar is never serialized and never logged
//!
//! ## Last Modified
//! v0.1.0 - Initial key exchange

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::curve::{KexCurve, Point};
use super::SESSION_KEY_SIZE;
use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Default inclusive lower bound of the private scalar.
pub const DEFAULT_SCALAR_MIN: u64 = 100_000;

/// Default exclusive upper bound of the private scalar.
pub const DEFAULT_SCALAR_MAX: u64 = 1_000_000;

// ============================================
// ScalarRange
// ============================================

/// Half-open range `[min, max)` for private key-exchange scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarRange {
    /// Inclusive lower bound
    pub min: u64,
    /// Exclusive upper bound
    pub max: u64,
}

impl ScalarRange {
    /// Creates a validated range.
    ///
    /// # Errors
    /// Returns `InvalidScalar` if `min` is zero or the range is empty.
    pub fn new(min: u64, max: u64) -> Result<Self> {
        if min == 0 {
            return Err(CoreError::invalid_scalar("scalar range must exclude zero"));
        }
        if max <= min {
            return Err(CoreError::invalid_scalar(format!(
                "empty scalar range [{min}, {max})"
            )));
        }
        Ok(Self { min, max })
    }

    /// Returns `true` if `scalar` lies inside the range.
    #[must_use]
    pub fn contains(&self, scalar: &BigUint) -> bool {
        scalar >= &BigUint::from(self.min) && scalar < &BigUint::from(self.max)
    }
}

impl Default for ScalarRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_SCALAR_MIN,
            max: DEFAULT_SCALAR_MAX,
        }
    }
}

// ============================================
// KexKeyPair
// ============================================

/// Key-exchange key pair on the custom curve.
///
/// # Example
/// ```
/// use robolink_core::crypto::{KexKeyPair, ScalarRange};
///
/// let alice = KexKeyPair::generate(ScalarRange::default());
/// let bob = KexKeyPair::generate(ScalarRange::default());
///
/// let k1 = alice.derive(bob.public_point()).unwrap();
/// let k2 = bob.derive(alice.public_point()).unwrap();
/// assert_eq!(k1, k2);
/// ```
pub struct KexKeyPair {
    secret: BigUint,
    public: Point<KexCurve>,
}

impl KexKeyPair {
    /// Generates a key pair with a scalar drawn uniformly from `range`.
    #[must_use]
    pub fn generate(range: ScalarRange) -> Self {
        let low = BigUint::from(range.min);
        let high = BigUint::from(range.max);
        let secret = OsRng.gen_biguint_range(&low, &high);
        let public = Point::<KexCurve>::generator().mul(&secret);
        Self { secret, public }
    }

    /// Rebuilds a key pair from a known scalar.
    ///
    /// # Errors
    /// Returns `InvalidScalar` for a zero scalar.
    pub fn from_scalar(secret: BigUint) -> Result<Self> {
        if secret.is_zero() {
            return Err(CoreError::invalid_scalar("key-exchange scalar is zero"));
        }
        let public = Point::<KexCurve>::generator().mul(&secret);
        Ok(Self { secret, public })
    }

    /// Returns the public point.
    #[must_use]
    pub const fn public_point(&self) -> &Point<KexCurve> {
        &self.public
    }

    /// Derives the session key shared with `peer`.
    ///
    /// # Errors
    /// Returns `KeyExchange` if the peer point is infinity or the shared
    /// point degenerates to infinity.
    pub fn derive(&self, peer: &Point<KexCurve>) -> Result<SessionKey> {
        if peer.is_infinity() {
            return Err(CoreError::key_exchange("peer sent the point at infinity"));
        }
        let shared = peer.mul(&self.secret);
        let shared_x = shared
            .x()
            .ok_or_else(|| CoreError::key_exchange("shared point is infinity"))?;
        Ok(SessionKey::from_shared_x(shared_x))
    }
}

impl fmt::Debug for KexKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KexKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Searches `range` for the scalar behind `public`.
///
/// Walks `min·G, (min+1)·G, ...` with one point addition per step.
#[must_use]
pub fn brute_force_scalar(public: &Point<KexCurve>, range: ScalarRange) -> Option<BigUint> {
    let generator = Point::<KexCurve>::generator();
    let mut candidate = generator.mul(&BigUint::from(range.min));

    for scalar in range.min..range.max {
        if &candidate == public {
            return Some(BigUint::from(scalar));
        }
        candidate = candidate.add(&generator);
    }
    None
}

// ============================================
// SessionKey
// ============================================

/// AES-128 key shared by both peers of one connection.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl SessionKey {
    /// Creates a session key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SESSION_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Hashes the shared x-coordinate and keeps the first 16 bytes.
    #[must_use]
    pub fn from_shared_x(shared_x: &BigUint) -> Self {
        let digest = Sha256::digest(shared_x.to_bytes_be());
        let mut key = [0u8; SESSION_KEY_SIZE];
        key.copy_from_slice(&digest[..SESSION_KEY_SIZE]);
        Self(key)
    }

    /// Returns the raw key bytes.
    ///
    /// # Security Warning
    /// Do not log or persist the returned bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SessionKey {}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_exchange_symmetry() {
        let alice = KexKeyPair::generate(ScalarRange::default());
        let bob = KexKeyPair::generate(ScalarRange::default());

        let alice_key = alice.derive(bob.public_point()).unwrap();
        let bob_key = bob.derive(alice.public_point()).unwrap();
        assert_eq!(alice_key, bob_key);
    }

    #[test]
    fn test_generated_scalar_in_range() {
        let range = ScalarRange::new(10, 12).unwrap();
        for _ in 0..8 {
            let kp = KexKeyPair::generate(range);
            assert!(range.contains(&kp.secret));
        }
    }

    #[test]
    fn test_derive_rejects_infinity() {
        let kp = KexKeyPair::generate(ScalarRange::default());
        let err = kp.derive(&Point::infinity()).unwrap_err();
        assert!(matches!(err, CoreError::KeyExchange { .. }));
    }

    #[test]
    fn test_session_key_derivation_is_sha256_prefix() {
        // sha256(b"\x01")[:16]
        let key = SessionKey::from_shared_x(&BigUint::from(1u32));
        assert_eq!(
            hex::encode(key.as_bytes()),
            "4bf5122f344554c53bde2ebb8cd2b7e3"
        );
    }

    #[test]
    fn test_scalar_range_validation() {
        assert!(ScalarRange::new(0, 10).is_err());
        assert!(ScalarRange::new(10, 10).is_err());
        assert!(ScalarRange::new(1, 2).is_ok());
        assert_eq!(ScalarRange::default().min, DEFAULT_SCALAR_MIN);
    }

    #[test]
    fn test_brute_force_scalar() {
        let kp = KexKeyPair::from_scalar(BigUint::from(100_042u32)).unwrap();
        let range = ScalarRange::new(100_000, 100_100).unwrap();
        assert_eq!(
            brute_force_scalar(kp.public_point(), range),
            Some(BigUint::from(100_042u32))
        );

        let miss = ScalarRange::new(100_050, 100_060).unwrap();
        assert_eq!(brute_force_scalar(kp.public_point(), miss), None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let key = SessionKey::from_bytes([0x42; SESSION_KEY_SIZE]);
        assert_eq!(format!("{key:?}"), "SessionKey([REDACTED])");

        let kp = KexKeyPair::from_scalar(BigUint::from(100_001u32)).unwrap();
        assert!(!format!("{kp:?}").contains("100001"));
    }
}
