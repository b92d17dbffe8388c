// ============================================
// File: crates/robolink-initiator/src/gate.rs
// ============================================
//! # Signing Key Gate
//!
//! ## Creation Reason
//! The key directory must not answer before the command-signing key
//! exists. `key_gate` hands out a one-shot publisher and any number of
//! waiters; after publication the key is read-only and shared.
//!
//! ## Main Functionality
//! - `KeyPublisher::publish`: consumes the publisher, wakes all waiters
//! - `KeyGate::wait`: resolves once the key is published
//!
//! ## Last Modified
//! v0.1.0 - Initial gate implementation

use std::sync::Arc;

use tokio::sync::watch;

use robolink_core::crypto::SigningKey;

use crate::error::{InitiatorError, Result};

/// Creates a connected publisher/gate pair.
#[must_use]
pub fn key_gate() -> (KeyPublisher, KeyGate) {
    let (tx, rx) = watch::channel(None);
    (KeyPublisher { tx }, KeyGate { rx })
}

/// Publishing half; usable once.
#[derive(Debug)]
pub struct KeyPublisher {
    tx: watch::Sender<Option<Arc<SigningKey>>>,
}

impl KeyPublisher {
    /// Publishes the key to every gate.
    pub fn publish(self, key: Arc<SigningKey>) {
        self.tx.send_replace(Some(key));
    }
}

/// Waiting half; cheap to clone.
#[derive(Debug, Clone)]
pub struct KeyGate {
    rx: watch::Receiver<Option<Arc<SigningKey>>>,
}

impl KeyGate {
    /// Returns the key if already published.
    #[must_use]
    pub fn get(&self) -> Option<Arc<SigningKey>> {
        self.rx.borrow().clone()
    }

    /// Waits until the key is published.
    ///
    /// # Errors
    /// Returns `KeyNotPublished` if the publisher was dropped unused.
    pub async fn wait(&mut self) -> Result<Arc<SigningKey>> {
        let published = self
            .rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| InitiatorError::KeyNotPublished)?;
        published.clone().ok_or(InitiatorError::KeyNotPublished)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use robolink_core::crypto::NoncePolicy;

    #[tokio::test]
    async fn test_waiters_released_on_publish() {
        let (publisher, gate) = key_gate();
        assert!(gate.get().is_none());

        let mut waiter = gate.clone();
        let task = tokio::spawn(async move { waiter.wait().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());

        let key = Arc::new(SigningKey::generate(NoncePolicy::PerSignature));
        publisher.publish(Arc::clone(&key));

        let received = task.await.unwrap().unwrap();
        assert_eq!(received.verifying_key(), key.verifying_key());
        assert!(gate.get().is_some());
    }

    #[tokio::test]
    async fn test_dropped_publisher_fails_waiters() {
        let (publisher, mut gate) = key_gate();
        drop(publisher);
        assert!(matches!(
            gate.wait().await,
            Err(InitiatorError::KeyNotPublished)
        ));
    }
}
