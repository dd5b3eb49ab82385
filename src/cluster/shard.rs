//! Shard Table
//!
//! Maps shard ids to endpoints and lazily-created clients, and holds the
//! pluggable key-hashing function that decides which shard owns a key.
//!
//! ## Key Hashing
//!
//! The hasher is an injected function from key bytes to an unsigned
//! integer; the router only requires that it is deterministic and stable
//! for a fixed shard count, because that is the property callers depend
//! on for data locality. For keys that must co-locate (e.g. everything a
//! SORT touches), inject a hasher that only considers the key prefix:
//!
//! ```
//! use shoal::cluster::ShardTable;
//! use shoal::connection::Endpoint;
//! use std::hash::{DefaultHasher, Hash, Hasher};
//!
//! let table = ShardTable::with_hasher(
//!     vec![Endpoint::new("10.0.0.1", 6379), Endpoint::new("10.0.0.2", 6379)],
//!     Box::new(|key: &[u8]| {
//!         let prefix = key.split(|&b| b == b':').next().unwrap_or(key);
//!         let mut hasher = DefaultHasher::new();
//!         prefix.hash(&mut hasher);
//!         hasher.finish()
//!     }),
//! );
//! assert_eq!(table.shard_for(b"webcomic:1"), table.shard_for(b"webcomic:2"));
//! ```
//!
//! The default hasher feeds the whole key through
//! [`std::hash::DefaultHasher`]. That is deterministic within a process;
//! deployments that need routing to stay stable across different client
//! builds should inject an explicitly versioned hash.

use crate::client::Client;
use crate::connection::Endpoint;
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

/// A pluggable function from key bytes to an unsigned hash.
pub type KeyHasher = Box<dyn Fn(&[u8]) -> u64 + Send + Sync>;

/// Returns the default key hasher.
pub fn default_hasher() -> KeyHasher {
    Box::new(|key: &[u8]| {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    })
}

/// Ordered shard endpoints with lazily-constructed clients.
///
/// The shard id is the index into the endpoint list. Clients are created
/// on first use and cached for the table's lifetime.
pub struct ShardTable {
    endpoints: Vec<Endpoint>,
    clients: Vec<Option<Client>>,
    hasher: KeyHasher,
}

impl ShardTable {
    /// Builds a table over the given endpoints with the default hasher.
    ///
    /// An empty endpoint list degenerates to a single default endpoint,
    /// so a cluster of zero servers cannot exist.
    pub fn new(endpoints: Vec<Endpoint>) -> Self {
        Self::with_hasher(endpoints, default_hasher())
    }

    /// Builds a table with an injected key hasher.
    pub fn with_hasher(mut endpoints: Vec<Endpoint>, hasher: KeyHasher) -> Self {
        if endpoints.is_empty() {
            endpoints.push(Endpoint::default());
        }
        let clients = endpoints.iter().map(|_| None).collect();
        Self {
            endpoints,
            clients,
            hasher,
        }
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false: the constructor guarantees at least one shard.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The endpoint of a shard.
    pub fn endpoint(&self, shard: usize) -> &Endpoint {
        &self.endpoints[shard]
    }

    /// Deterministic shard index for a key.
    ///
    /// With a single shard every key maps to shard 0 without consulting
    /// the hasher.
    pub fn shard_for(&self, key: &[u8]) -> usize {
        if self.endpoints.len() > 1 {
            ((self.hasher)(key) % self.endpoints.len() as u64) as usize
        } else {
            0
        }
    }

    /// The client for a shard, created on first use.
    pub fn client(&mut self, shard: usize) -> &mut Client {
        let Self {
            endpoints, clients, ..
        } = self;
        clients[shard].get_or_insert_with(|| {
            let endpoint = endpoints[shard].clone();
            debug!(shard, endpoint = %endpoint.addr(), "creating shard client");
            Client::new(endpoint)
        })
    }

    /// Closes every connected shard client.
    pub async fn quit(&mut self) {
        for client in self.clients.iter_mut().flatten() {
            client.quit().await;
        }
    }
}

impl std::fmt::Debug for ShardTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardTable")
            .field("shards", &self.endpoints.len())
            .finish()
    }
}
