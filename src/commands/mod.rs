//! Command Metadata and Reply Coercion
//!
//! This module is the bridge between command names and the wire: a static
//! descriptor table declaring each command's arity, encoding class, and
//! reply kind, plus the pure coercion that projects raw replies into typed
//! results.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   │  call("set", [key, value])
//!   ▼
//! ┌─────────────────┐
//! │  lookup()       │  (table.rs)   name -> CommandDescriptor
//! └────────┬────────┘
//!          │ arity check, encode, send, read
//!          ▼
//! ┌─────────────────┐
//! │  coerce()       │  (reply.rs)   ReplyKind x Reply -> Value
//! └─────────────────┘
//! ```
//!
//! The table is total: unknown command names fall back to a permissive
//! descriptor (any arity, raw reply), so the client never gates which
//! commands a server may support.

pub mod reply;
pub mod table;

// Re-export commonly used types
pub use reply::{coerce, Value};
pub use table::{lookup, Arity, CommandDescriptor, Encoding, ReplyKind};
