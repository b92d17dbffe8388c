// ============================================
// File: crates/robolink-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Separates "move one JSON document" from the socket that does it, so
//! session logic can be driven over anything that frames JSON.
//!
//! ## Main Functionality
//! - `JsonTransport`: send and receive one raw JSON document
//! - `JsonTransportExt`: typed `send_json` / `recv_json` on top
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be Send + Sync for use in async contexts
//! - A frame is exactly one top-level JSON object, no delimiter
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use robolink_common::error::CommonError;

use crate::error::{Result, TransportError};

// ============================================
// JsonTransport Trait
// ============================================

/// Connection carrying back-to-back JSON documents.
///
/// # Example
/// ```ignore
/// async fn echo<T: JsonTransport>(transport: &mut T) -> Result<()> {
///     loop {
///         let frame = transport.recv_frame().await?;
///         transport.send_frame(&frame).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait JsonTransport: Send + Sync {
    /// Writes one serialized JSON document.
    ///
    /// # Errors
    /// Returns `SendFailed` or `Timeout`.
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Reads the next complete JSON document.
    ///
    /// # Errors
    /// - `ConnectionClosed`: peer closed between documents
    /// - `MalformedFrame` / `MessageTooLarge`: unusable input
    /// - `Timeout`: nothing complete arrived in time
    async fn recv_frame(&mut self) -> Result<Bytes>;

    /// Returns the remote address.
    fn peer_addr(&self) -> SocketAddr;

    /// Closes the write half; further sends fail.
    ///
    /// # Errors
    /// Returns error if shutdown fails.
    async fn shutdown(&mut self) -> Result<()>;
}

// ============================================
// JsonTransportExt
// ============================================

/// Typed helpers over any [`JsonTransport`].
#[async_trait]
pub trait JsonTransportExt: JsonTransport {
    /// Serializes `value` and sends it as one frame.
    ///
    /// # Errors
    /// Returns an encoding error or any `send_frame` error.
    async fn send_json<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let frame = serde_json::to_vec(value)
            .map_err(|e| CommonError::encoding("json frame", e.to_string()))?;
        self.send_frame(&frame).await
    }

    /// Receives one frame and deserializes it.
    ///
    /// # Errors
    /// Returns a decoding error if the document has the wrong shape, or
    /// any `recv_frame` error.
    async fn recv_json<T>(&mut self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let frame = self.recv_frame().await?;
        serde_json::from_slice(&frame)
            .map_err(|e| TransportError::from(CommonError::decoding("json frame", e.to_string())))
    }
}

impl<T: JsonTransport + ?Sized> JsonTransportExt for T {}
