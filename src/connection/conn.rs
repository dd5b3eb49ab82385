//! Client Connection
//!
//! This module owns exactly one socket to one [`Endpoint`] and the framing
//! around it: writing encoded commands and reading back complete replies.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Connection::new (disconnected, no I/O)
//!        │
//!        ▼
//! 2. First call triggers connect()
//!        │
//!        ├── AUTH <password>     (when a password is configured)
//!        ├── SELECT <db>         (when a non-zero db is configured)
//!        ▼
//! 3. ┌──────────────────────────────┐
//!    │  send() / read_reply() loop  │
//!    └──────────────────────────────┘
//!        │
//!        ▼
//! 4. I/O failure -> disconnected; the *next* call reconnects
//!    (no retry happens within the failing call)
//! ```
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut` buffer. TCP is a stream
//! protocol: a read may deliver a partial reply, or several replies at
//! once (pipelining), so the connection keeps asking the parser until a
//! complete reply is available and consumes exactly its bytes.
//!
//! ## Deadlines
//!
//! Each endpoint may carry optional connect/read/write deadlines. Without
//! them every operation waits indefinitely, which is rarely what a
//! production deployment wants.

use crate::connection::Endpoint;
use crate::error::{Error, Result};
use crate::protocol::{encode_command, Reply, ReplyParser};
use bytes::{Buf, Bytes, BytesMut};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

/// Initial read buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// A single connection to one server.
///
/// One connection serves one in-flight request/response cycle at a time;
/// all methods take `&mut self`, so sharing a connection requires external
/// serialization by construction.
pub struct Connection {
    /// The connection target; immutable for the connection's lifetime.
    endpoint: Endpoint,

    /// The socket, present only while connected.
    stream: Option<BufWriter<TcpStream>>,

    /// Buffer for incoming reply bytes.
    buffer: BytesMut,

    /// Incremental reply parser.
    parser: ReplyParser,
}

impl Connection {
    /// Creates a disconnected connection for the given endpoint.
    ///
    /// No I/O happens until the first command is sent.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            stream: None,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            parser: ReplyParser::new(),
        }
    }

    /// The endpoint this connection dials.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns true while the socket is established.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Opens the socket and performs the AUTH/SELECT handshake.
    ///
    /// A no-op when already connected. Fails with [`Error::Connect`] when
    /// the socket cannot be opened, [`Error::Auth`] when the server
    /// rejects the configured password, and [`Error::Server`] when the
    /// configured database cannot be selected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let addr = self.endpoint.addr();
        debug!(endpoint = %addr, "connecting");

        let stream = with_deadline(self.endpoint.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|source| Error::Connect {
                endpoint: addr.clone(),
                source,
            })?;

        // Disable Nagle to keep request latency low for small payloads.
        stream.set_nodelay(true).map_err(|source| Error::Connect {
            endpoint: addr.clone(),
            source,
        })?;

        self.stream = Some(BufWriter::new(stream));
        self.buffer.clear();

        if let Some(password) = self.endpoint.password.clone() {
            match self.roundtrip("AUTH", &[Bytes::from(password)]).await? {
                Reply::Status(s) if s == "OK" => {
                    debug!(endpoint = %addr, "authenticated");
                }
                _ => {
                    self.stream = None;
                    return Err(Error::Auth { endpoint: addr });
                }
            }
        }

        if self.endpoint.db != 0 {
            let db = Bytes::from(self.endpoint.db.to_string());
            match self.roundtrip("SELECT", &[db]).await? {
                Reply::Status(s) if s == "OK" => {
                    debug!(endpoint = %addr, db = self.endpoint.db, "database selected");
                }
                Reply::Error(message) => {
                    self.stream = None;
                    return Err(Error::Server(message));
                }
                other => {
                    self.stream = None;
                    warn!(endpoint = %addr, reply = %other, "unexpected SELECT reply");
                    return Err(Error::Server(format!("unexpected SELECT reply: {}", other)));
                }
            }
        }

        debug!(endpoint = %addr, "connected");
        Ok(())
    }

    /// Writes pre-encoded command bytes to the socket.
    ///
    /// On failure the connection transitions to disconnected and the error
    /// is surfaced as [`Error::Socket`]; the next call will reconnect.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_connected)?;

        let write = async {
            stream.write_all(bytes).await?;
            stream.flush().await
        };

        match with_deadline(self.endpoint.write_timeout, write).await {
            Ok(()) => {
                trace!(bytes = bytes.len(), "sent command bytes");
                Ok(())
            }
            Err(source) => {
                self.stream = None;
                self.buffer.clear();
                debug!(endpoint = %self.endpoint.addr(), error = %source, "write failed, disconnecting");
                Err(Error::Socket(source))
            }
        }
    }

    /// Reads exactly one complete reply from the socket.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            // Try to parse a complete reply from what we already have
            if !self.buffer.is_empty() {
                match self.parser.parse(&self.buffer) {
                    Ok(Some((reply, consumed))) => {
                        self.buffer.advance(consumed);
                        trace!(
                            consumed = consumed,
                            remaining = self.buffer.len(),
                            "parsed reply"
                        );
                        return Ok(reply);
                    }
                    Ok(None) => {
                        trace!(buffered = self.buffer.len(), "incomplete reply, need more data");
                    }
                    Err(e) => {
                        // The stream framing cannot be trusted after a
                        // violation; drop the connection.
                        self.stream = None;
                        self.buffer.clear();
                        warn!(endpoint = %self.endpoint.addr(), error = %e, "protocol violation");
                        return Err(Error::Protocol(e));
                    }
                }
            }

            // Need more data - read from the socket
            if self.buffer.capacity() - self.buffer.len() < 1024 {
                self.buffer.reserve(4096);
            }

            let read_result = {
                let Self {
                    stream,
                    buffer,
                    endpoint,
                    ..
                } = self;
                match stream.as_mut() {
                    Some(stream) => {
                        with_deadline(endpoint.read_timeout, stream.get_mut().read_buf(buffer))
                            .await
                    }
                    None => return Err(not_connected().into()),
                }
            };

            match read_result {
                Ok(0) => {
                    // Server closed the connection mid-reply
                    self.stream = None;
                    self.buffer.clear();
                    return Err(Error::Socket(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "connection closed by server",
                    )));
                }
                Ok(n) => {
                    trace!(bytes = n, "read data");
                }
                Err(source) => {
                    self.stream = None;
                    self.buffer.clear();
                    debug!(endpoint = %self.endpoint.addr(), error = %source, "read failed, disconnecting");
                    return Err(Error::Socket(source));
                }
            }
        }
    }

    /// Sends one command and reads its reply.
    async fn roundtrip(&mut self, name: &str, args: &[Bytes]) -> Result<Reply> {
        let mut out = Vec::new();
        encode_command(name, args, &mut out);
        self.send(&out).await?;
        self.read_reply().await
    }

    /// Closes the connection without waiting for a server acknowledgment.
    ///
    /// A QUIT command is written on a best-effort basis. Idempotent:
    /// calling this on a disconnected connection does nothing. Dropping
    /// the connection also closes the socket.
    pub async fn quit(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let mut out = Vec::new();
            encode_command("QUIT", &[], &mut out);
            let _ = stream.write_all(&out).await;
            let _ = stream.flush().await;
            let _ = stream.get_mut().shutdown().await;
            debug!(endpoint = %self.endpoint.addr(), "connection closed");
        }
        self.buffer.clear();
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint.addr())
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn not_connected() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "not connected")
}

/// Applies an optional deadline to an I/O future.
async fn with_deadline<T>(
    deadline: Option<Duration>,
    io: impl Future<Output = std::io::Result<T>>,
) -> std::io::Result<T> {
    match deadline {
        Some(duration) => match tokio::time::timeout(duration, io).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "I/O deadline elapsed",
            )),
        },
        None => io.await,
    }
}
