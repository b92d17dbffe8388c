// ============================================
// File: crates/robolink-transport/src/tcp.rs
// ============================================
//! # TCP Transport Implementation
//!
//! ## Creation Reason
//! Peers write JSON objects straight onto a TCP stream with no length
//! prefix or delimiter. `TcpTransport` recovers document boundaries from
//! the byte stream and applies timeouts and a size cap.
//!
//! ## Main Functionality
//! - `TcpTransport`: framed JSON over a `tokio::net::TcpStream`
//! - `FrameLimits`: read/write timeouts and maximum document size
//! - `bind_listener`: listener with `SO_REUSEADDR` via socket2
//!
//! ## Framing
//! ```text
//! stream:  {"pubx":1,"puby":2}{"cipher":"..","iv":"..",...}{"ci
//!          └──── frame 1 ────┘└────────── frame 2 ──────────┘└ partial, wait
//! ```
//! The buffer is scanned with `serde_json`'s streaming deserializer; an
//! EOF error means "need more bytes", any other syntax error drops the
//! buffer and reports `MalformedFrame`.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Frames must be JSON objects; bare numbers could be cut mid-digit
//! - Every read is bounded by `FrameLimits::read_timeout`
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP transport implementation

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use serde::de::IgnoredAny;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, TransportError};
use crate::traits::JsonTransport;

// ============================================
// Constants
// ============================================

/// Default read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Default write timeout.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default maximum size of one JSON document.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Listen backlog for command and directory listeners.
pub const LISTEN_BACKLOG: i32 = 16;

/// Pause after a failed accept before the listener is polled again.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

const READ_CHUNK: usize = 4096;

// ============================================
// FrameLimits
// ============================================

/// Per-connection I/O limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLimits {
    /// Maximum wait for the next complete document
    pub read_timeout: Duration,
    /// Maximum wait for one write to complete
    pub write_timeout: Duration,
    /// Largest accepted document in bytes
    pub max_message_size: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

// ============================================
// Listener
// ============================================

/// Parses a `host:port` socket address.
///
/// # Errors
/// Returns `InvalidAddress` if `addr` is not a literal socket address.
pub fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse().map_err(|_| TransportError::InvalidAddress {
        addr: addr.to_string(),
    })
}

/// Binds a TCP listener with `SO_REUSEADDR`.
///
/// # Errors
/// - `AddressInUse`: another socket holds the port
/// - `BindFailed`: any other bind failure
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
        .map_err(|e| TransportError::io("creating TCP socket", e))?;

    socket
        .set_reuse_address(true)
        .map_err(|e| TransportError::io("setting SO_REUSEADDR", e))?;

    socket
        .set_nonblocking(true)
        .map_err(|e| TransportError::io("setting non-blocking", e))?;

    socket.bind(&addr.into()).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            TransportError::AddressInUse { addr }
        } else {
            TransportError::bind_failed(addr, e.to_string())
        }
    })?;

    socket
        .listen(LISTEN_BACKLOG)
        .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

    let std_listener: std::net::TcpListener = socket.into();
    let listener = TcpListener::from_std(std_listener)
        .map_err(|e| TransportError::io("converting to Tokio listener", e))?;

    let local = listener
        .local_addr()
        .map_err(|e| TransportError::io("getting local address", e))?;
    info!(addr = %local, "TCP listener bound");

    Ok(listener)
}

/// Logs a failed accept on `listener` and sleeps for
/// [`ACCEPT_ERROR_BACKOFF`].
///
/// Errors like `EMFILE` persist until a descriptor is freed, so the
/// accept loop must not retry immediately.
pub async fn accept_error_backoff(listener: &str, error: &TransportError) {
    warn!(
        listener,
        error = %error,
        backoff_ms = millis(ACCEPT_ERROR_BACKOFF),
        "Accept failed"
    );
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

// ============================================
// TcpTransport
// ============================================

/// JSON-framed TCP connection.
///
/// # Example
/// ```ignore
/// use robolink_transport::{FrameLimits, JsonTransportExt, TcpTransport};
///
/// let mut transport = TcpTransport::connect("127.0.0.1:8888", FrameLimits::default()).await?;
/// transport.send_json(&serde_json::json!({"pubx": 1, "puby": 2})).await?;
/// let reply: serde_json::Value = transport.recv_json().await?;
/// ```
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    limits: FrameLimits,
}

impl TcpTransport {
    /// Wraps an accepted or connected stream.
    ///
    /// # Errors
    /// Returns an I/O error if the peer address is unavailable.
    pub fn from_stream(stream: TcpStream, limits: FrameLimits) -> Result<Self> {
        let peer = stream
            .peer_addr()
            .map_err(|e| TransportError::io("getting peer address", e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::io("setting TCP_NODELAY", e))?;
        Ok(Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            limits,
        })
    }

    /// Connects to `addr` (`host:port`, hostnames allowed) within
    /// `DEFAULT_CONNECT_TIMEOUT`.
    ///
    /// # Errors
    /// Returns `ConnectFailed` or `Timeout`.
    pub async fn connect(addr: &str, limits: FrameLimits) -> Result<Self> {
        Self::connect_timeout(addr, DEFAULT_CONNECT_TIMEOUT, limits).await
    }

    /// Connects to `addr` within `connect_timeout`.
    ///
    /// # Errors
    /// Returns `ConnectFailed` or `Timeout`.
    pub async fn connect_timeout(
        addr: &str,
        connect_timeout: Duration,
        limits: FrameLimits,
    ) -> Result<Self> {
        debug!(addr, "Connecting");
        let stream = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::timeout(format!("connect {addr}"), millis(connect_timeout)))?
            .map_err(|e| TransportError::connect_failed(addr, e.to_string()))?;
        Self::from_stream(stream, limits)
    }

    /// Accepts one connection from `listener`.
    ///
    /// # Errors
    /// Returns an I/O error if accept fails.
    pub async fn accept(listener: &TcpListener, limits: FrameLimits) -> Result<Self> {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| TransportError::io("accepting connection", e))?;
        debug!(peer = %peer, "Accepted connection");
        Self::from_stream(stream, limits)
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> &FrameLimits {
        &self.limits
    }

    /// Splits one complete document off the front of the buffer.
    fn take_frame(&mut self) -> Result<Option<Bytes>> {
        let leading = self
            .buffer
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        self.buffer.advance(leading);

        let Some(&first) = self.buffer.first() else {
            return Ok(None);
        };
        if first != b'{' {
            self.buffer.clear();
            return Err(TransportError::malformed(format!(
                "expected a JSON object, found byte 0x{first:02x}"
            )));
        }

        let mut stream =
            serde_json::Deserializer::from_slice(&self.buffer).into_iter::<IgnoredAny>();
        match stream.next() {
            Some(Ok(_)) => {
                let end = stream.byte_offset();
                Ok(Some(self.buffer.split_to(end).freeze()))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => {
                self.buffer.clear();
                Err(TransportError::malformed(e.to_string()))
            }
            None => Ok(None),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl JsonTransport for TcpTransport {
    async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        let write_timeout = self.limits.write_timeout;
        let peer = self.peer;
        timeout(write_timeout, async {
            self.stream.write_all(frame).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| TransportError::timeout("send", millis(write_timeout)))?
        .map_err(|e| TransportError::SendFailed {
            peer,
            reason: e.to_string(),
        })?;

        trace!(peer = %peer, bytes = frame.len(), "Sent frame");
        Ok(())
    }

    async fn recv_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = self.take_frame()? {
                // A complete document can arrive in one read past the limit.
                if frame.len() > self.limits.max_message_size {
                    return Err(TransportError::MessageTooLarge {
                        size: frame.len(),
                        limit: self.limits.max_message_size,
                    });
                }
                trace!(peer = %self.peer, bytes = frame.len(), "Received frame");
                return Ok(frame);
            }

            if self.buffer.len() >= self.limits.max_message_size {
                let size = self.buffer.len();
                self.buffer.clear();
                return Err(TransportError::MessageTooLarge {
                    size,
                    limit: self.limits.max_message_size,
                });
            }

            self.buffer.reserve(READ_CHUNK);
            let read_timeout = self.limits.read_timeout;
            let read = timeout(read_timeout, self.stream.read_buf(&mut self.buffer))
                .await
                .map_err(|_| TransportError::timeout("recv", millis(read_timeout)))?
                .map_err(|e| TransportError::ReceiveFailed {
                    reason: e.to_string(),
                })?;

            if read == 0 {
                if self.buffer.is_empty() {
                    return Err(TransportError::ConnectionClosed);
                }
                let pending = self.buffer.len();
                self.buffer.clear();
                return Err(TransportError::malformed(format!(
                    "connection closed with {pending} bytes of an incomplete document"
                )));
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.stream
            .shutdown()
            .await
            .map_err(|e| TransportError::io("shutting down stream", e))
    }
}

// ============================================
// Tests
// ============================================
