// ============================================
// File: crates/robolink-transport/src/lib.rs
// ============================================
//! # RoboLink Transport - Network I/O Layer
//!
//! ## Creation Reason
//! Provides the TCP plumbing shared by the responder, the initiator and
//! the key directory: listeners, outbound connections and recovery of
//! JSON document boundaries from an undelimited byte stream.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: Transport trait definitions for abstraction
//! - [`tcp`]: TCP implementation with JSON framing
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │     robolink-responder        robolink-initiator    │
//! │            └───────────┬─────────────┘              │
//! │              ┌─────────┴─────────┐                  │
//! │              ▼                   ▼                  │
//! │        robolink-core     robolink-transport         │
//! │                          You are here ◄──           │
//! │              └─────────┬─────────┘                  │
//! │                        ▼                            │
//! │                 robolink-common                     │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate knows nothing about the message types; it moves bytes
//!   that happen to be JSON objects
//! - Always use traits for testability
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod tcp;
pub mod traits;

// Re-export primary types
pub use error::{Result, TransportError};
pub use tcp::{
    accept_error_backoff, bind_listener, parse_addr, FrameLimits, TcpTransport,
    ACCEPT_ERROR_BACKOFF,
};
pub use traits::{JsonTransport, JsonTransportExt};
