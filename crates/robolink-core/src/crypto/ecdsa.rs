// ============================================
// File: crates/robolink-core/src/crypto/ecdsa.rs
// ============================================
//! # Command Signatures (ECDSA over P-256)
//!
//! ## Creation Reason
//! Every command envelope carries an ECDSA signature over the ciphertext
//! so the responder can tell the legitimate controller from anyone who
//! merely completed a key exchange.
//!
//! ## Main Functionality
//! - `SigningKey`: private scalar plus an explicit `NoncePolicy`
//! - `VerifyingKey`: public point published through the key directory
//! - `Signature`: the `(r, s)` pair
//! - `ciphertext_digest`: SHA-256 over the lowercase hex of the ciphertext
//! - `recover_from_nonce_reuse`: private-key recovery from two signatures
//!   sharing `r`
//!
//! ## Signing Equations
//! ```text
//! e = SHA-256(hex(ciphertext)) as big-endian integer
//! R = k·G,          r = R.x mod n
//! s = k⁻¹ (e + d·r) mod n
//!
//! Two signatures with the same k:
//! k = (e₁ - e₂) / (s₁ - s₂) mod n
//! d = (s₁·k - e₁) / r       mod n
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `NoncePolicy::PerSigner` fixes k at construction and therefore
//!   leaks the private key after two signatures. It exists only for
//!   compatibility with deployed controllers and logs a warning
//! - The digest is computed over the hex TEXT of the ciphertext. Do not
//!   "fix" it to hash raw bytes or peers will reject every command
//!
//! ## Last Modified
//! v0.1.0 - Initial ECDSA implementation

use std::fmt;

use num_bigint::{BigInt, BigUint, RandBigInt, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::curve::{inv_mod, p256_order, p256_params, Point, P256};
use crate::error::{CoreError, Result};

// ============================================
// NoncePolicy
// ============================================

/// How a `SigningKey` chooses the ECDSA nonce `k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoncePolicy {
    /// One nonce drawn at construction and reused for every signature.
    #[default]
    PerSigner,
    /// A fresh nonce for every signature.
    PerSignature,
}

impl NoncePolicy {
    /// Returns `true` if signatures from this policy leak the private key.
    #[must_use]
    pub const fn is_insecure(self) -> bool {
        matches!(self, Self::PerSigner)
    }
}

impl fmt::Display for NoncePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerSigner => write!(f, "per-signer"),
            Self::PerSignature => write!(f, "per-signature"),
        }
    }
}

// ============================================
// Signature
// ============================================

/// ECDSA signature pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    /// x-coordinate of `k·G`, reduced mod n
    pub r: BigUint,
    /// Proof scalar
    pub s: BigUint,
}

impl Signature {
    /// Creates a signature from its components without validation.
    #[must_use]
    pub const fn new(r: BigUint, s: BigUint) -> Self {
        Self { r, s }
    }
}

// ============================================
// Digest
// ============================================

/// Digest signed for a command: SHA-256 over the lowercase hex text of
/// `ciphertext`, read as a big-endian integer.
#[must_use]
pub fn ciphertext_digest(ciphertext: &[u8]) -> BigUint {
    let hex_text = hex::encode(ciphertext);
    BigUint::from_bytes_be(&Sha256::digest(hex_text.as_bytes()))
}

fn group_order() -> &'static BigUint {
    p256_order()
}

// ============================================
// Raw Sign / Verify
// ============================================

/// Signs `digest` with private scalar `secret` and nonce `nonce`.
///
/// # Errors
/// Returns `SignatureCreation` if the nonce reduces to zero or if `r` or
/// `s` come out as zero.
pub fn sign(secret: &BigUint, nonce: &BigUint, digest: &BigUint) -> Result<Signature> {
    let n = group_order();
    let k = nonce % n;
    if k.is_zero() {
        return Err(CoreError::signature_creation("nonce is zero mod n"));
    }

    let point = Point::<P256>::generator().mul(&k);
    let r = match point.x() {
        Some(x) => x % n,
        None => return Err(CoreError::signature_creation("nonce point is infinity")),
    };
    if r.is_zero() {
        return Err(CoreError::signature_creation("r is zero"));
    }

    let e = digest % n;
    let s = (inv_mod(&k, n) * ((e + secret * &r) % n)) % n;
    if s.is_zero() {
        return Err(CoreError::signature_creation("s is zero"));
    }
    Ok(Signature { r, s })
}

/// Verifies `signature` over `digest` against `public`.
///
/// # Errors
/// Returns `SignatureVerification` if `r` or `s` lie outside `[1, n)` or
/// the signature does not match.
pub fn verify(public: &Point<P256>, digest: &BigUint, signature: &Signature) -> Result<()> {
    let n = group_order();
    let Signature { r, s } = signature;
    if r.is_zero() || s.is_zero() || r >= n || s >= n {
        return Err(CoreError::SignatureVerification);
    }

    let w = inv_mod(s, n);
    let u1 = ((digest % n) * &w) % n;
    let u2 = (r * &w) % n;
    let point = Point::<P256>::generator().mul(&u1).add(&public.mul(&u2));

    match point.x() {
        Some(x) if &(x % n) == r => Ok(()),
        _ => Err(CoreError::SignatureVerification),
    }
}

// ============================================
// VerifyingKey
// ============================================

/// Public half of a command-signing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerifyingKey(Point<P256>);

impl VerifyingKey {
    /// Wraps a finite P-256 point.
    ///
    /// # Errors
    /// Returns `InvalidPoint` for the point at infinity.
    pub fn from_point(point: Point<P256>) -> Result<Self> {
        if point.is_infinity() {
            return Err(CoreError::invalid_point(
                p256_params().name,
                "verifying key is the point at infinity",
            ));
        }
        Ok(Self(point))
    }

    /// Validates and wraps affine coordinates.
    ///
    /// # Errors
    /// Returns `InvalidPoint` if `(x, y)` is not on P-256.
    pub fn from_coordinates(x: BigUint, y: BigUint) -> Result<Self> {
        Self::from_point(Point::new(x, y)?)
    }

    /// Derives the public key of a private scalar.
    ///
    /// # Errors
    /// Returns `InvalidScalar` if the scalar is zero mod n.
    pub fn from_scalar(secret: &BigUint) -> Result<Self> {
        let reduced = secret % group_order();
        if reduced.is_zero() {
            return Err(CoreError::invalid_scalar("signing scalar is zero mod n"));
        }
        Self::from_point(Point::<P256>::generator().mul(&reduced))
    }

    /// Returns the underlying point.
    #[must_use]
    pub const fn point(&self) -> &Point<P256> {
        &self.0
    }

    /// Verifies a signature over a precomputed digest.
    ///
    /// # Errors
    /// Returns `SignatureVerification` on mismatch.
    pub fn verify_digest(&self, digest: &BigUint, signature: &Signature) -> Result<()> {
        verify(&self.0, digest, signature)
    }

    /// Verifies a signature over a command ciphertext.
    ///
    /// # Errors
    /// Returns `SignatureVerification` on mismatch.
    pub fn verify_ciphertext(&self, ciphertext: &[u8], signature: &Signature) -> Result<()> {
        self.verify_digest(&ciphertext_digest(ciphertext), signature)
    }
}

// ============================================
// SigningKey
// ============================================

/// Private command-signing key.
///
/// # Example
/// ```
/// use robolink_core::crypto::{NoncePolicy, SigningKey};
///
/// let key = SigningKey::generate(NoncePolicy::PerSignature);
/// let sig = key.sign_ciphertext(b"ciphertext").unwrap();
/// assert!(key.verifying_key().verify_ciphertext(b"ciphertext", &sig).is_ok());
/// ```
pub struct SigningKey {
    secret: BigUint,
    public: VerifyingKey,
    policy: NoncePolicy,
    fixed_nonce: Option<BigUint>,
}

impl SigningKey {
    /// Generates a random key.
    ///
    /// Under `PerSigner` the nonce is drawn once here and reused.
    #[must_use]
    pub fn generate(policy: NoncePolicy) -> Self {
        let n = group_order();
        let secret = OsRng.gen_biguint_range(&BigUint::one(), n);
        let public = VerifyingKey(Point::<P256>::generator().mul(&secret));
        Self::assemble(secret, public, policy)
    }

    /// Builds a key from a known private scalar.
    ///
    /// # Errors
    /// Returns `InvalidScalar` if the scalar is zero mod n.
    pub fn from_scalar(secret: BigUint, policy: NoncePolicy) -> Result<Self> {
        let secret = secret % group_order();
        let public = VerifyingKey::from_scalar(&secret)?;
        Ok(Self::assemble(secret, public, policy))
    }

    fn assemble(secret: BigUint, public: VerifyingKey, policy: NoncePolicy) -> Self {
        let fixed_nonce = match policy {
            NoncePolicy::PerSigner => {
                warn!(
                    nonce_policy = %policy,
                    "Signing key reuses one nonce for every signature; two signatures reveal the private key"
                );
                Some(random_nonce())
            }
            NoncePolicy::PerSignature => None,
        };
        Self {
            secret,
            public,
            policy,
            fixed_nonce,
        }
    }

    /// Returns the public key.
    #[must_use]
    pub const fn verifying_key(&self) -> &VerifyingKey {
        &self.public
    }

    /// Returns the nonce policy.
    #[must_use]
    pub const fn policy(&self) -> NoncePolicy {
        self.policy
    }

    /// Signs a precomputed digest according to the nonce policy.
    ///
    /// # Errors
    /// Returns `SignatureCreation` if a fixed nonce yields a degenerate
    /// signature for this digest.
    pub fn sign_digest(&self, digest: &BigUint) -> Result<Signature> {
        if let Some(nonce) = &self.fixed_nonce {
            return sign(&self.secret, nonce, digest);
        }
        loop {
            match sign(&self.secret, &random_nonce(), digest) {
                Err(CoreError::SignatureCreation { .. }) => continue,
                other => return other,
            }
        }
    }

    /// Signs a command ciphertext.
    ///
    /// # Errors
    /// See [`SigningKey::sign_digest`].
    pub fn sign_ciphertext(&self, ciphertext: &[u8]) -> Result<Signature> {
        self.sign_digest(&ciphertext_digest(ciphertext))
    }

    /// Signs with a caller-chosen nonce, bypassing the policy.
    ///
    /// # Errors
    /// Returns `SignatureCreation` for a degenerate nonce.
    pub fn sign_with_nonce(&self, digest: &BigUint, nonce: &BigUint) -> Result<Signature> {
        sign(&self.secret, nonce, digest)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.public)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn random_nonce() -> BigUint {
    OsRng.gen_biguint_range(&BigUint::one(), group_order())
}

// ============================================
// Nonce-Reuse Recovery
// ============================================

/// Nonce and private scalar recovered from two signatures sharing `r`.
#[derive(Clone, PartialEq, Eq)]
pub struct RecoveredKey {
    /// The reused nonce `k`
    pub nonce: BigUint,
    /// The signer's private scalar `d`
    pub secret: BigUint,
}

impl RecoveredKey {
    /// Rebuilds a signing key from the recovered scalar.
    ///
    /// # Errors
    /// Returns `InvalidScalar` if the recovered scalar is zero.
    pub fn signing_key(&self, policy: NoncePolicy) -> Result<SigningKey> {
        SigningKey::from_scalar(self.secret.clone(), policy)
    }
}

impl fmt::Debug for RecoveredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveredKey").finish_non_exhaustive()
    }
}

/// Recovers `k` and `d` from two signatures over different digests that
/// share the same `r`.
///
/// # Errors
/// Returns `NonceRecovery` if the `r` values differ, `r` is zero or the
/// `s` values are congruent mod n.
pub fn recover_from_nonce_reuse(
    first: (&BigUint, &Signature),
    second: (&BigUint, &Signature),
) -> Result<RecoveredKey> {
    let n = group_order();
    let (e1, sig1) = first;
    let (e2, sig2) = second;

    if sig1.r != sig2.r {
        return Err(CoreError::nonce_recovery("signatures do not share r"));
    }
    let r = &sig1.r % n;
    if r.is_zero() {
        return Err(CoreError::nonce_recovery("r is zero"));
    }

    let modulus = BigInt::from_biguint(Sign::Plus, n.clone());
    let signed = |v: &BigUint| BigInt::from_biguint(Sign::Plus, v % n);
    let to_unsigned = |v: BigInt| v.mod_floor(&modulus).magnitude().clone();

    let s_diff = to_unsigned(signed(&sig1.s) - signed(&sig2.s));
    if s_diff.is_zero() {
        return Err(CoreError::nonce_recovery("s values are congruent mod n"));
    }
    let e_diff = to_unsigned(signed(e1) - signed(e2));

    let nonce = (e_diff * inv_mod(&s_diff, n)) % n;
    let numerator = to_unsigned(BigInt::from_biguint(Sign::Plus, (&sig1.s * &nonce) % n) - signed(e1));
    let secret = (numerator * inv_mod(&r, n)) % n;

    Ok(RecoveredKey { nonce, secret })
}

// ============================================
// Tests
// ============================================
