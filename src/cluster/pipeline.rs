//! Cross-Shard Pipeline
//!
//! A cluster pipeline queues commands exactly like a single-client
//! pipeline, then partitions them by target shard at flush time, executes
//! each shard's sub-batch as one batched write, and threads every
//! sub-result back into the slot of the command's original queue index.
//!
//! ## Splitting Rules
//!
//! - `DEL` is split per shard by key; the per-shard counts are summed.
//! - `MSET` is split per shard by key/value pair; the per-shard statuses
//!   are AND-ed.
//! - `MGET` and `MSETNX` are not supported inside a cluster pipeline and
//!   are rejected when queued, before any I/O.
//! - Everything else routes whole to the shard of its first argument
//!   (shard 0 when there are no arguments).
//!
//! ## Merge Policy
//!
//! When a split command produced results on several shards, the results
//! collapse into one slot: booleans AND together, integers sum, and any
//! other combination is refused rather than guessed.

use crate::cluster::Cluster;
use crate::commands::{lookup, CommandDescriptor, Value};
use crate::error::{Error, Result};
use bytes::Bytes;
use std::collections::BTreeMap;

/// A batch of commands queued against a cluster.
#[derive(Debug)]
pub struct ClusterPipeline<'a> {
    cluster: &'a mut Cluster,
    queued: Vec<(CommandDescriptor, Vec<Bytes>)>,
}

impl<'a> ClusterPipeline<'a> {
    pub(crate) fn new(cluster: &'a mut Cluster) -> Self {
        Self {
            cluster,
            queued: Vec::new(),
        }
    }

    /// Queues a command without executing it.
    ///
    /// Arity is validated immediately. `MGET` and `MSETNX` are rejected
    /// here: the first cannot keep its reply order across shards and the
    /// second cannot keep its atomicity, so both fail fast instead of
    /// reaching any server.
    pub fn cmd(&mut self, name: &str, args: Vec<Bytes>) -> Result<&mut Self> {
        let descriptor = lookup(name);
        descriptor.check_arity(args.len())?;

        let lower = name.to_ascii_lowercase();
        if lower == "mget" || lower == "msetnx" {
            return Err(Error::Sharding(format!(
                "{} is not supported inside a cluster pipeline",
                lower
            )));
        }
        if lower == "mset" && args.len() % 2 != 0 {
            return Err(Error::Sharding(
                "mset takes key/value pairs, got an odd argument count".to_string(),
            ));
        }

        self.queued.push((descriptor, args));
        Ok(self)
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Returns true if nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Executes the batch across the shards it touches.
    ///
    /// Returns `None` when nothing was queued. Results come back indexed
    /// by the command's original queue position regardless of which
    /// shards served them. Shards execute in ascending shard-id order.
    pub async fn flush(self) -> Result<Option<Vec<Value>>> {
        let Self { cluster, queued } = self;
        if queued.is_empty() {
            return Ok(None);
        }

        let total = queued.len();
        let mut by_shard: BTreeMap<usize, Vec<(usize, (CommandDescriptor, Vec<Bytes>))>> =
            BTreeMap::new();

        for (index, (descriptor, args)) in queued.into_iter().enumerate() {
            match descriptor.name.to_ascii_lowercase().as_str() {
                "del" => {
                    // One DEL per shard holding any of the keys.
                    let mut buckets: BTreeMap<usize, Vec<Bytes>> = BTreeMap::new();
                    for key in args {
                        let shard = cluster.shard_for(&key);
                        buckets.entry(shard).or_default().push(key);
                    }
                    for (shard, keys) in buckets {
                        by_shard
                            .entry(shard)
                            .or_default()
                            .push((index, (descriptor.clone(), keys)));
                    }
                }
                "mset" => {
                    // One MSET per shard holding any of the pairs.
                    let mut buckets: BTreeMap<usize, Vec<Bytes>> = BTreeMap::new();
                    let mut pairs = args.into_iter();
                    while let (Some(key), Some(value)) = (pairs.next(), pairs.next()) {
                        let shard = cluster.shard_for(&key);
                        let bucket = buckets.entry(shard).or_default();
                        bucket.push(key);
                        bucket.push(value);
                    }
                    for (shard, flat) in buckets {
                        by_shard
                            .entry(shard)
                            .or_default()
                            .push((index, (descriptor.clone(), flat)));
                    }
                }
                _ => {
                    let shard = match args.first() {
                        Some(key) => cluster.shard_for(key),
                        None => 0,
                    };
                    by_shard
                        .entry(shard)
                        .or_default()
                        .push((index, (descriptor, args)));
                }
            }
        }

        let mut slots: Vec<Option<Value>> = (0..total).map(|_| None).collect();

        for (shard, entries) in by_shard {
            let (indices, batch): (Vec<usize>, Vec<(CommandDescriptor, Vec<Bytes>)>) =
                entries.into_iter().unzip();
            let results = cluster.table_mut().client(shard).exec_batch(&batch).await?;
            for (index, value) in indices.into_iter().zip(results) {
                merge_into(&mut slots[index], value)?;
            }
        }

        let results = slots
            .into_iter()
            .map(|slot| slot.expect("every queued command produces at least one sub-result"))
            .collect();
        Ok(Some(results))
    }
}

/// Folds one shard's sub-result into a command's result slot.
fn merge_into(slot: &mut Option<Value>, incoming: Value) -> Result<()> {
    let merged = match slot.take() {
        None => incoming,
        Some(Value::Bool(a)) => match incoming {
            Value::Bool(b) => Value::Bool(a && b),
            other => return Err(merge_refused("bool", &other)),
        },
        Some(Value::Int(a)) => match incoming {
            Value::Int(b) => Value::Int(a + b),
            other => return Err(merge_refused("integer", &other)),
        },
        Some(existing) => return Err(merge_refused(existing.kind(), &incoming)),
    };
    *slot = Some(merged);
    Ok(())
}

fn merge_refused(existing: &str, incoming: &Value) -> Error {
    Error::Sharding(format!(
        "cannot merge {} and {} replies for one command",
        existing,
        incoming.kind()
    ))
}
