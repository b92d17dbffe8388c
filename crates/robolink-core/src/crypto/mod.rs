// ============================================
// File: crates/robolink-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Groups the three primitives of the RoboLink protocol: key exchange on a
//! custom curve, ECDSA on P-256 and AES-128-CBC.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`curve`]: Short-Weierstrass arithmetic, typed per curve
//! - [`kex`]: Key-exchange key pairs and session key derivation
//! - [`ecdsa`]: Command signatures and nonce-reuse recovery
//! - [`channel`]: AES-128-CBC sealing with per-message IVs
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │  Initiator                                    Responder     │
//! │    │                                              │         │
//! │    │  {pubx, puby}  (custom curve) ─────────────► │         │
//! │    │ ◄───────────── {pubx, puby}  (custom curve)  │         │
//! │    │                                              │         │
//! │    │     SHA-256(shared.x)[0..16] ─► SessionKey   │         │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Command Phase                            │
//! │                                                             │
//! │  JSON ─► AES-128-CBC(SessionKey, iv) ─► cipher              │
//! │  SHA-256(hex(cipher)) ─► ECDSA-P256 ─► (sig_r, sig_s)       │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The signature key is fetched out of band from the key directory,
//!   never from the command connection
//! - Key-exchange and signature points are distinct types; keep it so
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod channel;
pub mod curve;
pub mod ecdsa;
pub mod kex;

// Re-export primary types at module level
pub use channel::{generate_iv, AesCbcChannel, SecureChannel, Sealed};
pub use curve::{Curve, CurveParams, KexCurve, Point, RawPoint, P256};
pub use ecdsa::{
    ciphertext_digest, recover_from_nonce_reuse, NoncePolicy, RecoveredKey, Signature,
    SigningKey, VerifyingKey,
};
pub use kex::{brute_force_scalar, KexKeyPair, ScalarRange, SessionKey};

// ============================================
// Constants
// ============================================

/// Size of the AES-128 session key in bytes.
pub const SESSION_KEY_SIZE: usize = 16;

/// Size of a CBC initialisation vector in bytes.
pub const IV_SIZE: usize = 16;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;
