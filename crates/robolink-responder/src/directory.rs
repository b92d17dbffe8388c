// ============================================
// File: crates/robolink-responder/src/directory.rs
// ============================================
//! # Key Directory Client
//!
//! ## Creation Reason
//! The responder learns the initiator's command-signing key from a side
//! channel: a TCP endpoint that writes one `{"x", "y"}` document and
//! closes. One fetch happens per accepted command connection.
//!
//! ## Main Functionality
//! - `DirectoryClient::fetch`: connect, read, validate the P-256 point
//! - Bounded retries with a fixed delay
//!
//! ## ⚠️ Important Note for Next Developer
//! - A failed fetch is not fatal to the session: the session runs with
//!   no verifier and rejects every command
//!
//! ## Last Modified
//! v0.1.0 - Initial directory client

use tracing::{debug, info, warn};

use robolink_core::crypto::VerifyingKey;
use robolink_core::protocol::DirectoryRecord;
use robolink_transport::{FrameLimits, JsonTransport, JsonTransportExt, TcpTransport};

use crate::config::DirectoryConfig;
use crate::error::{ResponderError, Result};

/// Fetches the initiator's verification key.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    config: DirectoryConfig,
    limits: FrameLimits,
}

impl DirectoryClient {
    /// Creates a client for the configured directory.
    #[must_use]
    pub const fn new(config: DirectoryConfig, limits: FrameLimits) -> Self {
        Self { config, limits }
    }

    /// Returns the directory address.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.config.addr
    }

    /// Fetches and validates the key, retrying on failure.
    ///
    /// # Errors
    /// Returns `DirectoryUnavailable` with the last failure once all
    /// attempts are used.
    pub async fn fetch(&self) -> Result<VerifyingKey> {
        let attempts = self.config.retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.fetch_once().await {
                Ok(key) => {
                    info!(addr = %self.config.addr, attempt, "Fetched initiator verification key");
                    return Ok(key);
                }
                Err(e) => {
                    warn!(
                        addr = %self.config.addr,
                        attempt,
                        attempts,
                        error = %e,
                        "Key directory fetch failed"
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.retry_delay()).await;
            }
        }

        Err(ResponderError::directory_unavailable(
            &self.config.addr,
            last_error,
        ))
    }

    /// Like [`fetch`](Self::fetch) but logs and swallows the failure.
    pub async fn fetch_optional(&self) -> Option<VerifyingKey> {
        match self.fetch().await {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "Continuing without a verification key");
                None
            }
        }
    }

    async fn fetch_once(&self) -> Result<VerifyingKey> {
        let mut transport = TcpTransport::connect_timeout(
            &self.config.addr,
            self.config.connect_timeout(),
            self.limits,
        )
        .await?;
        let record: DirectoryRecord = transport.recv_json().await?;
        if let Err(e) = transport.shutdown().await {
            debug!(error = %e, "Directory connection shutdown failed");
        }
        Ok(record.to_key()?)
    }
}

// ============================================
// Tests
// ============================================
