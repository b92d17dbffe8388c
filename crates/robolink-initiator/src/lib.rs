// ============================================
// File: crates/robolink-initiator/src/lib.rs
// ============================================
//! # RoboLink Initiator Library
//!
//! ## Creation Reason
//! Implements the operator side of the RoboLink command protocol: publish
//! the command-signing key, connect to a responder, agree on a session
//! key and drive it from an interactive menu.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Initiator configuration management
//! - [`gate`]: One-shot publication of the signing key
//! - [`directory`]: Serves the signing key to responders
//! - [`client`]: Keyed connection to one responder
//! - [`dispatcher`]: Menu actions and the `connected` guard
//! - [`console`]: Line-oriented operator front end
//! - [`error`]: Initiator-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    RoboLink Initiator                     │
//! ├───────────────────────────────────────────────────────────┤
//! │  SigningKey ──► KeyPublisher ──► KeyGate ──► KeyDirectory │
//! │                                              (port 10002) │
//! │                                                           │
//! │  Console ──► Dispatcher ──► InitiatorSession ──► TCP      │
//! │                                              (port 8888)  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial initiator library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod console;
pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod gate;

// Re-export primary types
pub use client::InitiatorSession;
pub use config::InitiatorConfig;
pub use console::Console;
pub use directory::KeyDirectory;
pub use dispatcher::{Dispatcher, MenuAction, Outcome, SendRequest};
pub use error::{InitiatorError, Result};
pub use gate::{key_gate, KeyGate, KeyPublisher};
