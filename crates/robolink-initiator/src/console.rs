// ============================================
// File: crates/robolink-initiator/src/console.rs
// ============================================
//! # Operator Console
//!
//! ## Creation Reason
//! Line-oriented front end for the [`Dispatcher`]. Reads menu choices,
//! prompts for the extra fields of option 4 and prints what the
//! responder answered.
//!
//! ## Main Functionality
//! - Menu and `>>> ` prompt loop
//! - `admin_login` collects a hand-built envelope (cipher, iv, r, s)
//!   and sends it unmodified
//! - Unusable input prints `Input Error` and the loop continues
//!
//! ## ⚠️ Important Note for Next Developer
//! - Generic over the reader/writer so tests can drive it from memory;
//!   `main` plugs in stdin/stdout
//! - A closed connection ends the loop, it is not an input error
//!
//! ## Last Modified
//! v0.1.0 - Initial console

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use robolink_core::protocol::{Action, CommandEnvelope, WireInt};
use robolink_transport::JsonTransport;

use crate::dispatcher::{Dispatcher, MenuAction, Outcome, SendRequest};
use crate::error::{InitiatorError, Result};

/// Menu printed on startup.
pub const MENU: &str = "Select Mode\n1. Connect Robot\n2. Check Status\n3. get public key\n4. Send Command\n5. Help\nx. Exit";

/// Printed for unusable input.
pub const INPUT_ERROR_TEXT: &str = "Input Error";

const PROMPT: &str = ">>> ";

/// Command that switches option 4 into verbatim envelope mode.
const ADMIN_LOGIN: &str = "admin_login";

// ============================================
// Console
// ============================================

/// Interactive console over any line source and sink.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a console.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the console and returns the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the menu loop until exit, end of input or disconnect.
    ///
    /// # Errors
    /// Returns console I/O errors and non-recoverable session errors.
    pub async fn run<T: JsonTransport>(&mut self, dispatcher: &mut Dispatcher<T>) -> Result<()> {
        self.print(MENU).await?;

        loop {
            let Some(line) = self.prompt(PROMPT).await? else {
                debug!("Console input closed");
                break;
            };

            match self.step(dispatcher, &line).await {
                Ok(Outcome::Exit) => break,
                Ok(outcome) => self.print(&outcome.to_string()).await?,
                Err(e) if e.is_recoverable() => {
                    debug!(error = %e, "Rejected console input");
                    self.print(INPUT_ERROR_TEXT).await?;
                }
                Err(e) if e.is_disconnected() => {
                    warn!("Responder closed the connection");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        info!("Console closed");
        Ok(())
    }

    async fn step<T: JsonTransport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        line: &str,
    ) -> Result<Outcome> {
        let action: MenuAction = line.parse()?;
        if action != MenuAction::SendCommand {
            return dispatcher.execute(action).await;
        }

        if let Some(refused) = dispatcher.check_guard(action) {
            return Ok(refused);
        }
        match self.read_send_request().await? {
            Some(request) => dispatcher.send(request).await,
            None => Ok(Outcome::Exit),
        }
    }

    /// Reads option 4's command; `None` on end of input.
    async fn read_send_request(&mut self) -> Result<Option<SendRequest>> {
        let Some(command) = self.prompt("command > ").await? else {
            return Ok(None);
        };
        if command.trim() != ADMIN_LOGIN {
            return Ok(Some(SendRequest::Action(Action::from_wire(&command))));
        }

        let mut fields = Vec::with_capacity(4);
        for prompt in ["ciphertext(hex) > ", "iv(hex) > ", "signature r > ", "signature s > "] {
            match self.prompt(prompt).await? {
                Some(value) => fields.push(value.trim().to_string()),
                None => return Ok(None),
            }
        }
        let [cipher, iv, r, s]: [String; 4] = fields
            .try_into()
            .map_err(|_| InitiatorError::invalid_input(ADMIN_LOGIN, "incomplete envelope"))?;

        Ok(Some(SendRequest::Verbatim(CommandEnvelope {
            cipher,
            iv,
            sig_r: parse_signature_part("signature r", &r)?,
            sig_s: parse_signature_part("signature s", &s)?,
        })))
    }

    async fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    async fn print(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

fn parse_signature_part(field: &str, value: &str) -> Result<WireInt> {
    value
        .parse()
        .map_err(|e: robolink_common::CommonError| InitiatorError::invalid_input(field, e.to_string()))
}

// ============================================
// Tests
// ============================================
