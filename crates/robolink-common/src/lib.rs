// ============================================
// File: crates/robolink-common/src/lib.rs
// ============================================
//! # RoboLink Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides the small set of types every RoboLink crate needs: the base
//! error enum and the connection identifier used to correlate log lines.
//!
//! ## Main Functionality
//! - [`error`]: Common error types and result aliases
//! - [`types`]: `ConnectionId` for per-connection log correlation
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │     robolink-responder        robolink-initiator    │
//! │            │                         │              │
//! │            └───────────┬─────────────┘              │
//! │              ┌─────────┴─────────┐                  │
//! │              ▼                   ▼                  │
//! │        robolink-core     robolink-transport         │
//! │              │                   │                  │
//! │              └─────────┬─────────┘                  │
//! │                        ▼                            │
//! │                 robolink-common  ◄── You are here   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Leaf crate: no internal dependencies
//! - Never put key material into error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod types;

pub use error::{CommonError, Result};
pub use types::ConnectionId;
