//! Connection Module
//!
//! This module manages the socket side of the client: one [`Connection`]
//! per [`Endpoint`], with lazy connects, an AUTH/SELECT handshake, and
//! reply framing over a reusable read buffer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                               │
//! │                   (client module)                           │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │ send() / read_reply()
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Connection                             │
//! │                                                             │
//! │  ┌─────────────┐    ┌──────────────┐    ┌──────────────┐   │
//! │  │ lazy connect│───>│ write bytes  │───>│ read + parse │   │
//! │  │ AUTH/SELECT │    │ (BufWriter)  │    │ (BytesMut)   │   │
//! │  └─────────────┘    └──────────────┘    └──────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! - Opening the socket fails with `Connect`; a rejected password with
//!   `Auth`.
//! - A read/write failure on an established connection fails with
//!   `Socket` and transitions the connection to disconnected. Nothing is
//!   retried: the *next* call performs a fresh connect.
//! - A framing violation fails with `Protocol` and also disconnects,
//!   because the byte stream can no longer be trusted.

pub mod conn;
pub mod endpoint;

// Re-export commonly used types
pub use conn::Connection;
pub use endpoint::Endpoint;
