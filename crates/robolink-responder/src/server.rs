// ============================================
// File: crates/robolink-responder/src/server.rs
// ============================================
//! # Responder Orchestrator
//!
//! ## Creation Reason
//! Owns the command listener and drives sessions one at a time.
//!
//! ## Accept Loop
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ loop                                                 │
//! │   accept ──► fetch verifier from key directory       │
//! │                 │ (retries, may yield none)          │
//! │                 ▼                                    │
//! │            CommandSession::run  (to completion)      │
//! │                 │                                    │
//! │                 ▼                                    │
//! │            log summary / error, next accept          │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Sessions are served sequentially; a second initiator waits in the
//!   listen backlog until the first one disconnects
//! - Shutdown is observed between sessions and while accepting
//!
//! ## Last Modified
//! v0.1.0 - Initial responder orchestrator

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use robolink_transport::{accept_error_backoff, bind_listener, JsonTransport, TcpTransport};

use crate::config::ResponderConfig;
use crate::directory::DirectoryClient;
use crate::dispatch::CommandHandler;
use crate::error::{ResponderError, Result};
use crate::session::CommandSession;

// ============================================
// Responder
// ============================================

/// Command endpoint.
///
/// # Lifecycle
/// 1. Create with `Responder::new(config)`
/// 2. Start with `responder.run().await` (or `serve` on a bound listener)
/// 3. Stop via Ctrl+C or `shutdown()`
pub struct Responder {
    config: ResponderConfig,
    handler: Arc<CommandHandler>,
    directory: DirectoryClient,
    shutdown_tx: broadcast::Sender<()>,
}

impl Responder {
    /// Creates a responder from configuration.
    #[must_use]
    pub fn new(config: ResponderConfig) -> Self {
        let handler = Arc::new(CommandHandler::new(config.admin.provider()));
        Self::with_handler(config, handler)
    }

    /// Creates a responder with a caller-supplied dispatcher.
    #[must_use]
    pub fn with_handler(config: ResponderConfig, handler: Arc<CommandHandler>) -> Self {
        let directory =
            DirectoryClient::new(config.directory.clone(), config.limits.frame_limits());
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            handler,
            directory,
            shutdown_tx,
        }
    }

    /// Binds the configured address and serves until Ctrl+C.
    ///
    /// # Errors
    /// Returns `StartupFailed` if the listener cannot be bound.
    pub async fn run(&self) -> Result<()> {
        info!("Starting RoboLink responder v{}", env!("CARGO_PKG_VERSION"));

        let listener = bind_listener(self.config.network.listen_addr).map_err(|e| {
            ResponderError::startup_failed(format!(
                "bind {} failed: {e}",
                self.config.network.listen_addr
            ))
        })?;
        info!(addr = %self.config.network.listen_addr, directory = %self.directory.addr(), "Responder listening");

        tokio::select! {
            result = self.serve(listener) => result,
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Received shutdown signal"),
                    Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
                }
                self.shutdown();
                Ok(())
            }
        }
    }

    /// Serves sessions from an already bound listener until shutdown.
    ///
    /// # Errors
    /// Never returns an error for per-session failures; those are logged.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let limits = self.config.limits.frame_limits();

        loop {
            let transport = tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!("Accept loop received shutdown signal");
                    break;
                }
                accepted = TcpTransport::accept(&listener, limits) => match accepted {
                    Ok(transport) => transport,
                    Err(e) => {
                        accept_error_backoff("command", &e).await;
                        continue;
                    }
                },
            };

            let peer = transport.peer_addr();
            info!(peer = %peer, "Connection accepted");

            let verifier = self.directory.fetch_optional().await;
            let session = CommandSession::new(
                transport,
                verifier,
                Arc::clone(&self.handler),
                self.config.key_exchange,
            );
            let id = session.id();

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    debug!(connection = %id, "Shutdown during session");
                    break;
                }
                outcome = session.run() => match outcome {
                    Ok(summary) => info!(
                        connection = %id,
                        peer = %peer,
                        executed = summary.executed,
                        rejected = summary.rejected,
                        "Session finished"
                    ),
                    Err(e) => {
                        let err = ResponderError::Session { peer, source: e };
                        warn!(connection = %id, error = %err, "Session ended with error");
                    }
                },
            }
        }

        info!("Responder stopped");
        Ok(())
    }

    /// Triggers shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("listen_addr", &self.config.network.listen_addr)
            .field("directory", &self.directory.addr())
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use robolink_core::crypto::{KexKeyPair, ScalarRange};
    use robolink_core::protocol::KeyExchangeMessage;
    use robolink_transport::{FrameLimits, JsonTransportExt};

    fn test_config() -> ResponderConfig {
        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = ResponderConfig::default();
        config.directory.addr = closed.local_addr().unwrap().to_string();
        config.directory.retries = 0;
        config.directory.connect_timeout_ms = 200;
        config
    }

    #[tokio::test]
    async fn test_serves_sequential_handshakes_and_shuts_down() {
        let responder = Arc::new(Responder::new(test_config()));
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let server = {
            let responder = Arc::clone(&responder);
            tokio::spawn(async move { responder.serve(listener).await })
        };

        for _ in 0..2 {
            let mut client = TcpTransport::connect(&addr, FrameLimits::default())
                .await
                .unwrap();
            let kp = KexKeyPair::generate(ScalarRange::default());
            client
                .send_json(&KeyExchangeMessage::from_point(kp.public_point()).unwrap())
                .await
                .unwrap();
            let reply: KeyExchangeMessage = client.recv_json().await.unwrap();
            assert!(reply.to_point().is_ok());
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        responder.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[test]
    fn test_debug_hides_handler() {
        let responder = Responder::new(test_config());
        let debug = format!("{responder:?}");
        assert!(debug.contains("listen_addr"));
        assert!(!debug.contains("flag"));
    }
}
