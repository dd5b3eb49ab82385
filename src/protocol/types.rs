//! RESP (Redis Serialization Protocol) Reply Types
//!
//! This module defines the reply types a server can send back to a client.
//! RESP is a simple, binary-safe protocol used by Redis-compatible stores
//! for client-server communication.
//!
//! ## Reply Grammar
//!
//! Each reply starts with a type prefix byte:
//! - `+` Status (simple string)
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! All types are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Status: `+OK\r\n`
//! Error: `-ERR unknown command\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Null Bulk String: `$-1\r\n`
//! Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
//! Null Array: `*-1\r\n`
//!
//! Null bulk strings and null arrays are distinct wire forms, so [`Reply`]
//! keeps them distinguishable: `Bulk(None)` vs `Array(None)`.

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used in the RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP type prefix bytes
pub mod prefix {
    pub const STATUS: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A raw decoded server reply, before any command-specific coercion.
///
/// This is the closed union the parser produces and the coercion layer
/// consumes. `Error` is carried as data here; turning it into a failed
/// call is the client's job, not the codec's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status line, e.g. `+OK` or `+PONG`. Cannot contain CRLF.
    Status(String),

    /// Error line, e.g. `-ERR unknown command`.
    Error(String),

    /// 64-bit signed integer, e.g. `:42`.
    Integer(i64),

    /// Binary-safe bulk string; `None` is the null marker `$-1`.
    Bulk(Option<Bytes>),

    /// Ordered sequence of replies; `None` is the null marker `*-1`.
    /// Elements may be any reply type, including nested arrays.
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Creates a status reply.
    pub fn status(s: impl Into<String>) -> Self {
        Reply::Status(s.into())
    }

    /// Creates an error reply.
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    /// Creates a bulk string reply.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(data.into()))
    }

    /// Creates the null bulk string reply (`$-1`).
    pub fn null_bulk() -> Self {
        Reply::Bulk(None)
    }

    /// Creates an array reply.
    pub fn array(items: Vec<Reply>) -> Self {
        Reply::Array(Some(items))
    }

    /// Creates the null array reply (`*-1`).
    pub fn null_array() -> Self {
        Reply::Array(None)
    }

    /// Returns true if this reply is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Returns true if this reply is a null bulk string or null array.
    pub fn is_null(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::Array(None))
    }

    /// Attempts to view the payload of a bulk string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(Some(data)) => Some(data),
            _ => None,
        }
    }

    /// Attempts to extract the inner integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Serializes the reply to its wire format.
    ///
    /// Lossless counterpart of the parser: parsing the returned bytes
    /// yields this reply back. Mostly useful for tests and tooling that
    /// plays the server side of the protocol.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Reply::Status(s) => {
                buf.push(prefix::STATUS);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(Some(data)) => {
                buf.push(prefix::BULK);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            Reply::Bulk(None) => {
                buf.extend_from_slice(b"$-1");
                buf.extend_from_slice(CRLF);
            }
            Reply::Array(Some(items)) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for item in items {
                    item.serialize_into(buf);
                }
            }
            Reply::Array(None) => {
                buf.extend_from_slice(b"*-1");
                buf.extend_from_slice(CRLF);
            }
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(Some(data)) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            Reply::Bulk(None) | Reply::Array(None) => write!(f, "(nil)"),
            Reply::Array(Some(items)) => {
                if items.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    writeln!(f)?;
                    for (i, item) in items.iter().enumerate() {
                        writeln!(f, "{}) {}", i + 1, item)?;
                    }
                    Ok(())
                }
            }
        }
    }
}
