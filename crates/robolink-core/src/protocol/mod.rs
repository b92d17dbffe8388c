// ============================================
// File: crates/robolink-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the JSON wire protocol spoken between initiator, responder and
//! key directory.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`messages`]: Envelopes and handshake/directory documents
//! - [`command`]: Plaintext command and response payloads
//! - [`wire_int`]: Arbitrary-size integers as JSON numbers
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │                                                             │
//! │  Initiator ────── {"pubx","puby"} ─────────────► Responder  │
//! │  Initiator ◄───── {"pubx","puby"} ────────────── Responder  │
//! │                                                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Command Phase                            │
//! │                                                             │
//! │  Initiator ── {"cipher","iv","sig_r","sig_s"} ─► Responder  │
//! │  Initiator ◄─────────── {"cipher","iv"} ──────── Responder  │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format Principles
//! - One JSON object per message, written back to back with no delimiter
//! - Byte strings are lowercase hex
//! - Integers are bare JSON numbers of any size
//!
//! ## ⚠️ Important Note for Next Developer
//! - Field names are fixed by deployed peers; never rename them
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod command;
pub mod messages;
pub mod wire_int;

// Re-export primary types
pub use command::{Action, CommandPayload, ResponsePayload, Status};
pub use messages::{CommandEnvelope, DirectoryRecord, KeyExchangeMessage, ResponseEnvelope};
pub use wire_int::WireInt;
