// ============================================
// File: crates/robolink-initiator/src/dispatcher.rs
// ============================================
//! # Menu Dispatcher
//!
//! ## Creation Reason
//! Turns operator menu choices into protocol messages and enforces the
//! `connected` guard: nothing but `connect` and `exit` is allowed until
//! the responder has acknowledged a `connect` command.
//!
//! ## Menu
//! | Key | Action | Needs connect |
//! |-----|--------|---------------|
//! | 1 | Connect | no |
//! | 2 | Check | yes |
//! | 3 | GetPublicKey | yes |
//! | 4 | SendCommand | yes |
//! | 5 | Help | yes |
//! | x | Exit | no |
//!
//! Any other integer also exits; input that is not an integer is an
//! input error and the menu is shown again.
//!
//! ## Last Modified
//! v0.1.0 - Initial dispatcher

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use robolink_core::protocol::{Action, CommandEnvelope, ResponsePayload};
use robolink_transport::JsonTransport;

use crate::client::InitiatorSession;
use crate::error::{InitiatorError, Result};

/// Printed by the help action.
pub const HELP_TEXT: &str = "Available Command : build 1, build 2, admin_login";

/// Printed when a guarded action is chosen before connecting.
pub const NOT_CONNECTED_TEXT: &str = "It must be connected to a robot!";

// ============================================
// MenuAction
// ============================================

/// Top-level menu choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Send `connect`
    Connect,
    /// Send `check`
    Check,
    /// Send `get public key`
    GetPublicKey,
    /// Send an operator-chosen command
    SendCommand,
    /// Show remote commands
    Help,
    /// Leave the console
    Exit,
}

impl MenuAction {
    /// Returns `true` if the action is refused before `connect`.
    #[must_use]
    pub const fn requires_connection(self) -> bool {
        !matches!(self, Self::Connect | Self::Exit)
    }
}

impl FromStr for MenuAction {
    type Err = InitiatorError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.eq_ignore_ascii_case("x") {
            return Ok(Self::Exit);
        }

        let mode: i64 = raw.parse().map_err(|_| {
            InitiatorError::invalid_input("mode", format!("not a menu number: {raw:?}"))
        })?;
        Ok(match mode {
            1 => Self::Connect,
            2 => Self::Check,
            3 => Self::GetPublicKey,
            4 => Self::SendCommand,
            5 => Self::Help,
            _ => Self::Exit,
        })
    }
}

// ============================================
// Requests & Outcomes
// ============================================

/// What option 4 sends.
#[derive(Debug, Clone)]
pub enum SendRequest {
    /// Seal and sign this action normally.
    Action(Action),
    /// Send an operator-built envelope unchanged.
    Verbatim(CommandEnvelope),
}

/// Result of one menu step, for the console to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Decrypted response JSON text
    Response(String),
    /// Help text
    Help(&'static str),
    /// Guard refused the action
    NotConnected,
    /// Leave the console
    Exit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(text) => write!(f, "[Bob response] : {text}"),
            Self::Help(text) => f.write_str(text),
            Self::NotConnected => f.write_str(NOT_CONNECTED_TEXT),
            Self::Exit => Ok(()),
        }
    }
}

// ============================================
// Dispatcher
// ============================================

/// Menu state over an established session.
pub struct Dispatcher<T: JsonTransport> {
    session: InitiatorSession<T>,
    connected: bool,
}

impl<T: JsonTransport> Dispatcher<T> {
    /// Wraps a keyed session; starts disconnected.
    pub const fn new(session: InitiatorSession<T>) -> Self {
        Self {
            session,
            connected: false,
        }
    }

    /// Returns `true` once `connect` was acknowledged.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns the underlying session.
    pub fn session_mut(&mut self) -> &mut InitiatorSession<T> {
        &mut self.session
    }

    /// Returns the guard outcome if `action` may not run yet.
    #[must_use]
    pub fn check_guard(&self, action: MenuAction) -> Option<Outcome> {
        if action.requires_connection() && !self.connected {
            Some(Outcome::NotConnected)
        } else {
            None
        }
    }

    /// Executes a menu action that needs no further input.
    ///
    /// `SendCommand` must go through [`send`](Self::send).
    ///
    /// # Errors
    /// Returns transport or decryption failures of the round trip.
    pub async fn execute(&mut self, action: MenuAction) -> Result<Outcome> {
        if let Some(refused) = self.check_guard(action) {
            return Ok(refused);
        }

        match action {
            MenuAction::Connect => {
                let (text, payload) = self.round_trip(SendRequest::Action(Action::Connect)).await?;
                if payload.as_ref().is_some_and(ResponsePayload::is_ok) {
                    if !self.connected {
                        info!("Robot connected");
                    }
                    self.connected = true;
                }
                Ok(Outcome::Response(text))
            }
            MenuAction::Check => self.respond(SendRequest::Action(Action::Check)).await,
            MenuAction::GetPublicKey => {
                self.respond(SendRequest::Action(Action::GetPublicKey)).await
            }
            MenuAction::SendCommand => Err(InitiatorError::invalid_input(
                "mode",
                "send command needs a command",
            )),
            MenuAction::Help => Ok(Outcome::Help(HELP_TEXT)),
            MenuAction::Exit => Ok(Outcome::Exit),
        }
    }

    /// Executes option 4.
    ///
    /// # Errors
    /// Returns transport or decryption failures of the round trip.
    pub async fn send(&mut self, request: SendRequest) -> Result<Outcome> {
        if let Some(refused) = self.check_guard(MenuAction::SendCommand) {
            return Ok(refused);
        }
        self.respond(request).await
    }

    async fn respond(&mut self, request: SendRequest) -> Result<Outcome> {
        let (text, _) = self.round_trip(request).await?;
        Ok(Outcome::Response(text))
    }

    async fn round_trip(
        &mut self,
        request: SendRequest,
    ) -> Result<(String, Option<ResponsePayload>)> {
        let envelope = match request {
            SendRequest::Action(action) => {
                debug!(action = %action, "Sending command");
                self.session.seal(action)?
            }
            SendRequest::Verbatim(envelope) => {
                debug!("Sending operator-supplied envelope");
                envelope
            }
        };
        let reply = self.session.send_envelope(&envelope).await?;
        let text = self.session.open_text(&reply)?;
        let payload = serde_json::from_str(&text).ok();
        Ok((text, payload))
    }
}

// ============================================
// Tests
// ============================================
