//! Error Types
//!
//! This module defines the error taxonomy for the whole crate.
//! Every failure mode a caller can observe is a variant of [`Error`]:
//! a failed call always surfaces a typed error, never a sentinel value
//! that could be mistaken for a legitimate empty or null result.
//!
//! ## Error Categories
//!
//! | Variant           | Meaning                                              |
//! |-------------------|------------------------------------------------------|
//! | `Connect`         | The socket could not be opened                       |
//! | `Auth`            | The server rejected the configured password          |
//! | `Socket`          | Read/write failed on an established connection       |
//! | `Protocol`        | The server sent bytes that violate the reply grammar |
//! | `Server`          | A well-formed `-ERR ...` reply from the server       |
//! | `ArgumentCount`   | Arity violation, detected before any I/O             |
//! | `Sharding`        | An operation cannot be honored across shards         |
//!
//! None of these are retried internally. A `Socket` error disconnects the
//! connection; the *next* call attempts a fresh connect.

use crate::commands::Arity;
use crate::protocol::ProtocolError;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by clients, pipelines, and the cluster router.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The socket to the server could not be opened.
    #[error("unable to connect to {endpoint}: {source}")]
    Connect {
        /// The `host:port` that was dialed.
        endpoint: String,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// The server did not accept the configured credentials.
    #[error("authentication rejected by {endpoint}")]
    Auth {
        /// The `host:port` that rejected the password.
        endpoint: String,
    },

    /// Read or write failed on an established connection.
    ///
    /// The connection transitions to disconnected; the next call will
    /// attempt to reconnect.
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// The reply stream violated the protocol grammar.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server answered with an error reply; the message is verbatim.
    #[error("server error: {0}")]
    Server(String),

    /// The argument list does not satisfy the command's arity.
    ///
    /// Raised by the descriptor table before any bytes hit the wire.
    #[error("command {command} takes {expected} arguments, but got {actual}")]
    ArgumentCount {
        /// The command name as the caller spelled it.
        command: String,
        /// The arity declared in the command table.
        expected: Arity,
        /// The number of arguments actually passed.
        actual: usize,
    },

    /// The operation's atomicity or locality cannot be honored across
    /// multiple shards.
    #[error("sharding error: {0}")]
    Sharding(String),
}

impl Error {
    /// Returns true if this error indicates the connection was lost and
    /// will be re-established on the next call.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::Socket(_))
    }
}
