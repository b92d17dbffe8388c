// ============================================
// File: crates/robolink-initiator/src/directory.rs
// ============================================
//! # Public Key Directory
//!
//! ## Creation Reason
//! The responder has no other way to learn the initiator's
//! command-signing key. This task publishes it in plaintext JSON to
//! whoever connects.
//!
//! ## Flow
//! ```text
//! KeyGate::wait ──► bind ──► accept ──► {"x": .., "y": ..} ──► close
//!                              ▲                                 │
//!                              └──── until `connections` served ─┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The key is public; the directory itself is unauthenticated
//! - `connections = 0` keeps the directory open until the task is dropped
//!
//! ## Last Modified
//! v0.1.0 - Initial directory implementation

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use robolink_core::protocol::DirectoryRecord;
use robolink_transport::{
    accept_error_backoff, bind_listener, FrameLimits, JsonTransport, JsonTransportExt,
    TcpTransport,
};

use crate::error::Result;
use crate::gate::KeyGate;

/// Serves the published signing key.
#[derive(Debug, Clone)]
pub struct KeyDirectory {
    gate: KeyGate,
    connections: usize,
    limits: FrameLimits,
}

impl KeyDirectory {
    /// Creates a directory serving `connections` peers (0 = unlimited).
    #[must_use]
    pub const fn new(gate: KeyGate, connections: usize, limits: FrameLimits) -> Self {
        Self {
            gate,
            connections,
            limits,
        }
    }

    /// Waits for the key, binds `addr` and serves.
    ///
    /// # Errors
    /// Returns `KeyNotPublished` or a bind error.
    pub async fn run(mut self, addr: SocketAddr) -> Result<()> {
        self.gate.wait().await?;
        let listener = bind_listener(addr)?;
        info!(addr = %addr, "Key directory listening");
        self.serve(listener).await
    }

    /// Waits for the key and serves on an already bound listener.
    ///
    /// # Errors
    /// Returns `KeyNotPublished` if no key is ever published.
    pub async fn serve(mut self, listener: TcpListener) -> Result<()> {
        let key = self.gate.wait().await?;
        let record = DirectoryRecord::from_key(key.verifying_key())?;

        let mut served = 0usize;
        while self.connections == 0 || served < self.connections {
            let mut transport = match TcpTransport::accept(&listener, self.limits).await {
                Ok(transport) => transport,
                Err(e) => {
                    accept_error_backoff("key directory", &e).await;
                    continue;
                }
            };

            let peer = transport.peer_addr();
            match transport.send_json(&record).await {
                Ok(()) => {
                    served += 1;
                    info!(peer = %peer, served, "Published signing key");
                }
                Err(e) => warn!(peer = %peer, error = %e, "Failed to publish signing key"),
            }
            if let Err(e) = transport.shutdown().await {
                debug!(peer = %peer, error = %e, "Directory connection shutdown failed");
            }
        }

        info!(served, "Key directory closed");
        Ok(())
    }

    /// Spawns [`run`](Self::run) on the runtime.
    #[must_use]
    pub fn spawn(self, addr: SocketAddr) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let result = self.run(addr).await;
            if let Err(e) = &result {
                warn!(error = %e, "Key directory stopped");
            }
            result
        })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::gate::key_gate;
    use robolink_core::crypto::{NoncePolicy, SigningKey};

    #[tokio::test]
    async fn test_serves_after_publication_then_closes() {
        let (publisher, gate) = key_gate();
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let directory = KeyDirectory::new(gate, 1, FrameLimits::default());
        let task = tokio::spawn(directory.serve(listener));

        // Connections are queued, not answered, until a key exists.
        let mut early = TcpTransport::connect(&addr, FrameLimits::default())
            .await
            .unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(50), early.recv_frame()).await;
        assert!(pending.is_err());

        let key = Arc::new(SigningKey::generate(NoncePolicy::PerSignature));
        publisher.publish(Arc::clone(&key));

        let record: DirectoryRecord = early.recv_json().await.unwrap();
        assert_eq!(&record.to_key().unwrap(), key.verifying_key());
        assert!(early.recv_frame().await.unwrap_err().is_connection_closed());

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serves_multiple_connections() {
        let (publisher, gate) = key_gate();
        publisher.publish(Arc::new(SigningKey::generate(NoncePolicy::PerSignature)));

        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let task = tokio::spawn(KeyDirectory::new(gate, 2, FrameLimits::default()).serve(listener));

        for _ in 0..2 {
            let mut client = TcpTransport::connect(&addr, FrameLimits::default())
                .await
                .unwrap();
            let record: DirectoryRecord = client.recv_json().await.unwrap();
            assert!(record.to_key().is_ok());
        }
        task.await.unwrap().unwrap();
    }
}
