//! Cluster Module
//!
//! The cluster router presents the call surface of a single client while
//! transparently spreading keys across several independent servers.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────────┐
//!                 │           Cluster             │
//!                 │                               │
//!  call(cmd,args) │  shard = hash(args[0]) % N    │
//! ───────────────>│                               │
//!                 │  mget/del/mset: partition by  │
//!                 │  shard, fan out, merge        │
//!                 └──────┬──────────┬─────────────┘
//!                        │          │
//!                        ▼          ▼
//!                 ┌──────────┐ ┌──────────┐
//!                 │ Client 0 │ │ Client 1 │   ... one per endpoint,
//!                 └──────────┘ └──────────┘   created on first use
//! ```
//!
//! ## Routing Invariants
//!
//! - A keyed command's first argument is the sharding key; commands
//!   without arguments go to shard 0 by convention.
//! - `shard(key)` is deterministic for a fixed shard count: the same key
//!   always lands on the same server. With one shard everything is local
//!   and the hasher is never consulted.
//!
//! ## Explicitly Unsupported
//!
//! Cross-shard atomicity cannot be faked. `MSETNX` touching more than one
//! shard is rejected before any write, and `MGET`/`MSETNX` cannot be
//! queued into a cluster pipeline. These fail loudly rather than
//! partially apply.

pub mod pipeline;
pub mod shard;

pub use pipeline::ClusterPipeline;
pub use shard::{default_hasher, KeyHasher, ShardTable};

use crate::commands::Value;
use crate::connection::Endpoint;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// A sharding router over several independent servers.
///
/// # Example
///
/// ```ignore
/// use shoal::{Cluster, Endpoint};
///
/// let mut cluster = Cluster::new(vec![
///     Endpoint::new("10.0.0.1", 6379),
///     Endpoint::new("10.0.0.2", 6379),
/// ]);
/// cluster.set(b"user:1", b"alice").await?;   // routed by key
/// let total = cluster.del(&[b"user:1", b"user:2"]).await?; // fanned out
/// ```
#[derive(Debug)]
pub struct Cluster {
    table: ShardTable,
}

impl Cluster {
    /// Builds a cluster over the given endpoints with the default hasher.
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self {
            table: ShardTable::new(endpoints),
        }
    }

    /// Builds a cluster with an injected key hasher.
    pub fn with_hasher(endpoints: Vec<Endpoint>, hasher: KeyHasher) -> Self {
        Self {
            table: ShardTable::with_hasher(endpoints, hasher),
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.table.len()
    }

    /// Deterministic shard index for a key.
    pub fn shard_for(&self, key: &[u8]) -> usize {
        self.table.shard_for(key)
    }

    pub(crate) fn table_mut(&mut self) -> &mut ShardTable {
        &mut self.table
    }

    /// Executes one command, routed by its first argument.
    ///
    /// Commands without arguments go to shard 0. This entry point routes
    /// the command *whole*: the multi-key commands with splitting
    /// semantics have dedicated methods ([`Cluster::mget`],
    /// [`Cluster::del`], [`Cluster::mset`], [`Cluster::msetnx`]).
    pub async fn call(&mut self, name: &str, args: Vec<Bytes>) -> Result<Value> {
        let shard = match args.first() {
            Some(key) => self.table.shard_for(key),
            None => 0,
        };
        trace!(command = name, shard, "routing command");
        self.table.client(shard).call(name, args).await
    }

    /// Starts a cross-shard pipeline.
    pub fn pipeline(&mut self) -> ClusterPipeline<'_> {
        ClusterPipeline::new(self)
    }

    /// Fetches several keys across shards.
    ///
    /// Keys are partitioned by shard and fetched with one MGET per shard;
    /// the per-shard results are threaded back into the order the caller
    /// asked for, so `result[i]` always belongs to `keys[i]`.
    pub async fn mget<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<Vec<Option<Bytes>>> {
        let mut buckets: BTreeMap<usize, (Vec<usize>, Vec<Bytes>)> = BTreeMap::new();
        for (position, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            let shard = self.table.shard_for(key);
            let bucket = buckets.entry(shard).or_default();
            bucket.0.push(position);
            bucket.1.push(Bytes::copy_from_slice(key));
        }

        let mut results: Vec<Option<Bytes>> = (0..keys.len()).map(|_| None).collect();
        for (shard, (positions, shard_keys)) in buckets {
            trace!(shard, keys = shard_keys.len(), "mget fan-out");
            let value = self.table.client(shard).call("mget", shard_keys).await?;
            let items = match value {
                Value::Array(items) => items,
                other => return Err(unexpected_value("array", &other)),
            };
            if items.len() != positions.len() {
                return Err(Error::Server(format!(
                    "mget answered {} values for {} keys",
                    items.len(),
                    positions.len()
                )));
            }
            for (position, item) in positions.into_iter().zip(items) {
                results[position] = match item {
                    Value::Nil => None,
                    Value::Bytes(data) => Some(data),
                    other => return Err(unexpected_value("bulk string", &other)),
                };
            }
        }
        Ok(results)
    }

    /// Deletes keys across shards; returns the total number deleted.
    ///
    /// One DEL per shard holding any of the keys; the counts are summed.
    pub async fn del<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<i64> {
        let mut buckets: BTreeMap<usize, Vec<Bytes>> = BTreeMap::new();
        for key in keys {
            let key = key.as_ref();
            let shard = self.table.shard_for(key);
            buckets
                .entry(shard)
                .or_default()
                .push(Bytes::copy_from_slice(key));
        }

        let mut deleted = 0;
        for (shard, shard_keys) in buckets {
            trace!(shard, keys = shard_keys.len(), "del fan-out");
            match self.table.client(shard).call("del", shard_keys).await? {
                Value::Int(count) => deleted += count,
                other => return Err(unexpected_value("integer", &other)),
            }
        }
        Ok(deleted)
    }

    /// Sets several key/value pairs across shards.
    ///
    /// One MSET per shard holding any of the pairs; succeeds only if
    /// every shard reports OK.
    pub async fn mset<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        pairs: &[(K, V)],
    ) -> Result<bool> {
        let mut buckets: BTreeMap<usize, Vec<Bytes>> = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let shard = self.table.shard_for(key);
            let bucket = buckets.entry(shard).or_default();
            bucket.push(Bytes::copy_from_slice(key));
            bucket.push(Bytes::copy_from_slice(value.as_ref()));
        }

        let mut ok = true;
        for (shard, flat) in buckets {
            trace!(shard, pairs = flat.len() / 2, "mset fan-out");
            match self.table.client(shard).call("mset", flat).await? {
                Value::Bool(b) => ok = ok && b,
                other => return Err(unexpected_value("bool", &other)),
            }
        }
        Ok(ok)
    }

    /// Sets several key/value pairs only if none of the keys exist.
    ///
    /// The atomicity MSETNX promises on one server cannot be honored
    /// across independent servers, so a pair set that spans more than one
    /// shard is rejected with [`Error::Sharding`] before any write is
    /// issued to any shard.
    pub async fn msetnx<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        pairs: &[(K, V)],
    ) -> Result<bool> {
        let mut shards: BTreeSet<usize> = BTreeSet::new();
        for (key, _) in pairs {
            shards.insert(self.table.shard_for(key.as_ref()));
        }
        if shards.len() > 1 {
            return Err(Error::Sharding(format!(
                "msetnx cannot span {} shards; all keys must hash to a single server",
                shards.len()
            )));
        }

        let mut flat = Vec::with_capacity(pairs.len() * 2);
        for (key, value) in pairs {
            flat.push(Bytes::copy_from_slice(key.as_ref()));
            flat.push(Bytes::copy_from_slice(value.as_ref()));
        }
        let shard = shards.first().copied().unwrap_or(0);
        match self.table.client(shard).call("msetnx", flat).await? {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected_value("bool", &other)),
        }
    }

    /// Fetches a value from the shard owning the key.
    pub async fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        let shard = self.table.shard_for(key);
        self.table.client(shard).get(key).await
    }

    /// Sets a key on the shard owning it.
    pub async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        let shard = self.table.shard_for(key);
        self.table.client(shard).set(key, value).await
    }

    /// Returns true if the key exists on its shard.
    pub async fn exists(&mut self, key: &[u8]) -> Result<bool> {
        let shard = self.table.shard_for(key);
        self.table.client(shard).exists(key).await
    }

    /// Pings shard 0, the conventional target for keyless commands.
    pub async fn ping(&mut self) -> Result<bool> {
        self.table.client(0).ping().await
    }

    /// Closes every connected shard client.
    pub async fn quit(&mut self) {
        self.table.quit().await;
    }
}

fn unexpected_value(expected: &'static str, got: &Value) -> Error {
    Error::Protocol(crate::protocol::ProtocolError::UnexpectedReply {
        expected,
        got: got.kind(),
    })
}
