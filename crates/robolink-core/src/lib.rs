// ============================================
// File: crates/robolink-core/src/lib.rs
// ============================================
//! # RoboLink Core - Protocol & Cryptography Library
//!
//! ## Creation Reason
//! Holds everything both peers of the RoboLink command protocol must agree
//! on: the curve arithmetic, the key exchange, the command signatures, the
//! symmetric channel and the JSON wire messages.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Short-Weierstrass point arithmetic over two distinct curves
//! - ECDH over the custom key-exchange curve (`KexKeyPair`, `SessionKey`)
//! - ECDSA over NIST P-256 (`SigningKey`, `VerifyingKey`, `Signature`)
//! - AES-128-CBC message sealing with per-message IVs
//!
//! ### Protocol Module ([`protocol`])
//! - Key-exchange, command, response and directory messages
//! - Arbitrary-size JSON integers (`WireInt`)
//! - Typed command actions and response payloads
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │     robolink-responder        robolink-initiator    │
//! │            └───────────┬─────────────┘              │
//! │              ┌─────────┴─────────┐                  │
//! │              ▼                   ▼                  │
//! │        robolink-core     robolink-transport         │
//! │        You are here ◄──                             │
//! │              └─────────┬─────────┘                  │
//! │                        ▼                            │
//! │                 robolink-common                     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The curve code is NOT constant-time; it models the protocol, it is
//!   not a hardened crypto library
//! - The two curves are separate types on purpose: a `Point<KexCurve>`
//!   can never be added to a `Point<P256>`
//! - Signature digests are computed over the hex text of the ciphertext,
//!   never over the plaintext
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{
    KexCurve, KexKeyPair, NoncePolicy, Point, ScalarRange, SessionKey, Signature, SigningKey,
    VerifyingKey, P256,
};
pub use error::{CoreError, Result};
pub use protocol::{
    Action, CommandEnvelope, CommandPayload, DirectoryRecord, KeyExchangeMessage,
    ResponseEnvelope, ResponsePayload, Status, WireInt,
};
