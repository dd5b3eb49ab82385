//! RESP Protocol Implementation
//!
//! This module provides the wire-protocol codec for the client: command
//! encoding and reply parsing, as pure byte transformations with no I/O.
//!
//! ## Overview
//!
//! RESP is a simple, binary-safe protocol used by Redis-compatible stores.
//! A client writes commands in multibulk form and reads back one of five
//! reply types, dispatched on a single leading byte.
//!
//! ## Modules
//!
//! - `types`: Defines the [`Reply`] union and reply serialization
//! - `parser`: Incremental parser for incoming reply bytes and the
//!   multibulk command encoder
//!
//! ## Example
//!
//! ```ignore
//! use shoal::protocol::{encode_command, parse_reply, Reply};
//! use bytes::Bytes;
//!
//! // Encoding an outgoing command
//! let mut out = Vec::new();
//! encode_command("GET", &[Bytes::from("name")], &mut out);
//!
//! // Parsing an incoming reply
//! let (reply, consumed) = parse_reply(b"$4\r\nAriz\r\n").unwrap().unwrap();
//! assert_eq!(reply, Reply::bulk(Bytes::from("Ariz")));
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{encode_command, parse_reply, ParseResult, ProtocolError, ReplyParser};
pub use types::Reply;
