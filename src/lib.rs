//! # Shoal - A Sharded Client for Redis-Compatible Key-Value Stores
//!
//! Shoal is a client library that speaks the RESP wire protocol to
//! Redis-compatible servers, batches commands into pipelines, and spreads
//! keys across several independent servers with a thin sharding layer.
//!
//! ## Features
//!
//! - **Descriptor-Driven Commands**: A static table declares each
//!   command's arity, encoding, and reply coercion; unknown commands pass
//!   through with raw replies
//! - **Pipelining**: Many commands in one write, replies read back in
//!   submission order
//! - **Sharding**: Deterministic key routing over N servers with a
//!   pluggable hash function, including multi-key fan-out for
//!   MGET/DEL/MSET
//! - **Async I/O**: Built on Tokio; optional per-endpoint deadlines for
//!   connect, read, and write
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                 Shoal                                   │
//! │                                                                         │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐                │
//! │  │   Cluster   │────>│   Client    │────>│ Connection  │──> TCP         │
//! │  │  (routing)  │     │ (commands)  │     │  (framing)  │                │
//! │  └─────────────┘     └──────┬──────┘     └──────┬──────┘                │
//! │                             │                   │                       │
//! │                             ▼                   ▼                       │
//! │                      ┌─────────────┐     ┌─────────────┐                │
//! │                      │ Descriptor  │     │    RESP     │                │
//! │                      │   Table     │     │   Codec     │                │
//! │                      │ + Coercion  │     │             │                │
//! │                      └─────────────┘     └─────────────┘                │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │  Pipeline / ClusterPipeline: queue -> one write -> ordered reads  │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use shoal::{Client, Cluster, Endpoint};
//!
//! #[tokio::main]
//! async fn main() -> shoal::Result<()> {
//!     // One server
//!     let mut client = Client::new(Endpoint::new("127.0.0.1", 6379));
//!     client.set(b"mykey", b"foobar").await?;
//!     assert_eq!(client.get(b"mykey").await?.as_deref(), Some(&b"foobar"[..]));
//!
//!     // Pipelined
//!     let mut pipe = client.pipeline();
//!     pipe.cmd("incr", vec!["counter".into()])?;
//!     pipe.cmd("incr", vec!["counter".into()])?;
//!     let results = pipe.flush().await?.unwrap();
//!
//!     // Sharded over two servers
//!     let mut cluster = Cluster::new(vec![
//!         Endpoint::new("10.0.0.1", 6379),
//!         Endpoint::new("10.0.0.2", 6379),
//!     ]);
//!     cluster.set(b"user:1", b"alice").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: RESP codec - command encoding and reply parsing
//! - [`commands`]: command descriptor table and reply coercion
//! - [`connection`]: one socket per endpoint, lazy connect, AUTH/SELECT
//! - [`client`]: the single-server client and its typed command methods
//! - [`pipeline`]: command batching on one connection
//! - [`cluster`]: key-hash routing and multi-key fan-out over N servers
//!
//! ## Design Highlights
//!
//! ### One Entry Point, Many Commands
//!
//! Every command funnels through [`Client::call`] and the static
//! descriptor table. The typed methods are convenience projections, not a
//! separate code path, so behavior cannot drift between the two.
//!
//! ### Errors Are Never Values
//!
//! A failed call raises a typed [`Error`]; callers can always tell a
//! missing key (`Ok(None)`) from a failed lookup (`Err(...)`).
//!
//! ### Serialized by Construction
//!
//! A connection serves one request/response cycle at a time. Every method
//! takes `&mut self`, so the compiler enforces the serialization that the
//! protocol requires.

pub mod client;
pub mod cluster;
pub mod commands;
pub mod connection;
pub mod error;
pub mod pipeline;
pub mod protocol;

// Re-export commonly used types for convenience
pub use client::{Client, Order, SortOptions};
pub use cluster::{Cluster, ClusterPipeline, KeyHasher, ShardTable};
pub use commands::{Arity, CommandDescriptor, Encoding, ReplyKind, Value};
pub use connection::{Connection, Endpoint};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use protocol::{ProtocolError, Reply};

/// The default port Redis-compatible servers listen on
pub const DEFAULT_PORT: u16 = 6379;

/// The default host a client connects to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of Shoal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
