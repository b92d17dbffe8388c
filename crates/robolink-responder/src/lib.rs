// ============================================
// File: crates/robolink-responder/src/lib.rs
// ============================================
//! # RoboLink Responder Library
//!
//! ## Creation Reason
//! Implements the robot side of the RoboLink command protocol: accept a
//! connection, fetch the initiator's verification key, agree on a session
//! key and serve signed, encrypted commands.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Responder configuration management
//! - [`server`]: Accept loop and lifecycle
//! - [`session`]: Per-connection state machine
//! - [`dispatch`]: Action handling and admin secret providers
//! - [`directory`]: Key directory client
//! - [`error`]: Responder-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RoboLink Responder                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐    ┌────────────┐    ┌──────────────────┐     │
//! │  │  Config  │───►│ Responder  │───►│ DirectoryClient  │     │
//! │  └──────────┘    └─────┬──────┘    └──────────────────┘     │
//! │                        │ one at a time                      │
//! │                        ▼                                    │
//! │                 ┌──────────────┐    ┌────────────────┐      │
//! │                 │CommandSession│───►│ CommandHandler │      │
//! │                 └──────┬───────┘    └────────────────┘      │
//! ├────────────────────────┼────────────────────────────────────┤
//! │                        ▼                                    │
//! │          robolink-transport (TCP, JSON framing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Configuration changes require restart (no hot-reload)
//! - The admin secret is never logged
//!
//! ## Last Modified
//! v0.1.0 - Initial responder library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod server;
pub mod session;

// Re-export primary types
pub use config::ResponderConfig;
pub use directory::DirectoryClient;
pub use dispatch::{CommandHandler, FlagProvider, StaticFlag};
pub use error::{ResponderError, Result, SessionError};
pub use server::Responder;
pub use session::{CommandSession, SessionState, SessionSummary};
