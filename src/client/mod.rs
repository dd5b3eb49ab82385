//! Client Module
//!
//! This module implements the command layer of the library: a [`Client`]
//! owns one [`Connection`] and turns logical calls into wire traffic.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   │  call("set", [key, value])   or   client.set(key, value)
//!   ▼
//! ┌─────────────────┐
//! │     Client      │
//! │                 │
//! │  - lookup       │  descriptor table (commands module)
//! │  - arity check  │  before any I/O
//! │  - encode       │  canonical multibulk (protocol module)
//! │  - send / read  │  one socket (connection module)
//! │  - coerce       │  ReplyKind -> Value (commands module)
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   Connection    │
//! └─────────────────┘
//! ```
//!
//! Every command flows through [`Client::call`]; the typed methods
//! (`get`, `set`, `hgetall`, ...) are thin projections over it, kept for
//! ergonomics. There is no reflection and no dynamic dispatch: unknown
//! command names still work through `call` with raw replies.
//!
//! ## Failure Model
//!
//! An `-ERR` reply surfaces as [`Error::Server`] with the message
//! verbatim. A write failure disconnects; the next call reconnects. A
//! failed call never returns a value that could be mistaken for a
//! legitimate empty result.

pub mod sort;

pub use sort::{Order, SortOptions};

use crate::commands::{coerce, lookup, CommandDescriptor, Value};
use crate::connection::{Connection, Endpoint};
use crate::error::{Error, Result};
use crate::pipeline::Pipeline;
use crate::protocol::{encode_command, ProtocolError, Reply};
use bytes::Bytes;
use tracing::trace;

/// A client for one server.
///
/// # Example
///
/// ```ignore
/// use shoal::{Client, Endpoint};
///
/// let mut client = Client::new(Endpoint::new("127.0.0.1", 6379));
/// client.set(b"mykey", b"foobar").await?;
/// assert_eq!(client.get(b"mykey").await?.as_deref(), Some(&b"foobar"[..]));
/// ```
#[derive(Debug)]
pub struct Client {
    conn: Connection,
}

impl Client {
    /// Creates a client for the given endpoint.
    ///
    /// No I/O happens until the first command.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            conn: Connection::new(endpoint),
        }
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &Endpoint {
        self.conn.endpoint()
    }

    /// Returns true while the underlying socket is established.
    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Executes one command by name.
    ///
    /// Looks up the command descriptor (unknown names get a permissive
    /// default), validates arity before any I/O, lazily connects, writes
    /// the encoded command, reads exactly one reply, and applies the
    /// command's reply coercion.
    pub async fn call(&mut self, name: &str, args: Vec<Bytes>) -> Result<Value> {
        let batch = [(lookup(name), args)];
        let mut results = self.exec_batch(&batch).await?;
        Ok(results.pop().expect("a batch of one yields one result"))
    }

    /// Starts a pipeline on this client's connection.
    ///
    /// Queued commands are not sent until the pipeline is flushed.
    pub fn pipeline(&mut self) -> Pipeline<'_> {
        Pipeline::new(self)
    }

    /// Closes the connection without waiting for a server acknowledgment.
    /// Idempotent; the next command would reconnect.
    pub async fn quit(&mut self) {
        self.conn.quit().await;
    }

    /// Executes a validated batch: one write, then one read per command.
    ///
    /// All arities are checked before any I/O. All writes precede all
    /// reads - interleaving them can deadlock when the server is still
    /// waiting for the rest of a partially-transmitted command. Every
    /// reply is drained off the socket even when an earlier one failed,
    /// so one bad command cannot desynchronize the connection; the first
    /// error is then reported.
    pub(crate) async fn exec_batch(
        &mut self,
        batch: &[(CommandDescriptor, Vec<Bytes>)],
    ) -> Result<Vec<Value>> {
        for (descriptor, args) in batch {
            descriptor.check_arity(args.len())?;
        }

        self.conn.connect().await?;

        let mut out = Vec::new();
        for (descriptor, args) in batch {
            encode_command(&descriptor.name, args, &mut out);
        }
        trace!(commands = batch.len(), bytes = out.len(), "flushing batch");
        self.conn.send(&out).await?;

        let mut results = Vec::with_capacity(batch.len());
        let mut first_error = None;
        for (descriptor, _) in batch {
            let reply = self.conn.read_reply().await?;
            let outcome = match reply {
                Reply::Error(message) => Err(Error::Server(message)),
                reply => coerce(descriptor.reply, reply),
            };
            match outcome {
                Ok(value) => results.push(value),
                Err(e) => {
                    // Keep reading the remaining replies before failing.
                    results.push(Value::Nil);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(results),
        }
    }

    // ── generic key commands ────────────────────────────────────────────

    /// Returns true if the key exists.
    pub async fn exists(&mut self, key: &[u8]) -> Result<bool> {
        expect_bool(self.call("exists", vec![arg(key)]).await?)
    }

    /// Deletes the given keys; returns how many existed.
    pub async fn del<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<i64> {
        expect_int(self.call("del", args(keys)).await?)
    }

    /// Returns the type of a key as reported by the server.
    pub async fn key_type(&mut self, key: &[u8]) -> Result<String> {
        match self.call("type", vec![arg(key)]).await? {
            Value::Status(s) => Ok(s),
            Value::Bytes(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
            other => Err(unexpected("status", &other)),
        }
    }

    /// Returns all keys matching a glob pattern.
    pub async fn keys(&mut self, pattern: &[u8]) -> Result<Vec<Bytes>> {
        expect_bytes_array(self.call("keys", vec![arg(pattern)]).await?)
    }

    /// Returns a random key, or `None` on an empty database.
    pub async fn randomkey(&mut self) -> Result<Option<Bytes>> {
        match self.call("randomkey", vec![]).await? {
            Value::Nil => Ok(None),
            Value::Bytes(data) => Ok(Some(data)),
            // Old servers answer with a status line instead of a bulk.
            Value::Status(s) => Ok(Some(Bytes::from(s))),
            other => Err(unexpected("bulk string", &other)),
        }
    }

    /// Renames a key.
    pub async fn rename(&mut self, key: &[u8], new_key: &[u8]) -> Result<bool> {
        expect_bool(self.call("rename", vec![arg(key), arg(new_key)]).await?)
    }

    /// Renames a key only if the new name is free.
    pub async fn renamenx(&mut self, key: &[u8], new_key: &[u8]) -> Result<bool> {
        expect_bool(self.call("renamenx", vec![arg(key), arg(new_key)]).await?)
    }

    /// Sets a key's time to live in seconds.
    pub async fn expire(&mut self, key: &[u8], seconds: i64) -> Result<bool> {
        expect_bool(self.call("expire", vec![arg(key), int_arg(seconds)]).await?)
    }

    /// Returns a key's remaining time to live in seconds.
    pub async fn ttl(&mut self, key: &[u8]) -> Result<i64> {
        expect_int(self.call("ttl", vec![arg(key)]).await?)
    }

    /// Returns the number of keys in the selected database.
    pub async fn dbsize(&mut self) -> Result<i64> {
        expect_int(self.call("dbsize", vec![]).await?)
    }

    /// Removes every key from the selected database.
    pub async fn flushdb(&mut self) -> Result<bool> {
        expect_bool(self.call("flushdb", vec![]).await?)
    }

    /// Removes every key from every database.
    pub async fn flushall(&mut self) -> Result<bool> {
        expect_bool(self.call("flushall", vec![]).await?)
    }

    // ── string commands ─────────────────────────────────────────────────

    /// Fetches a value. Returns `None` when the key is missing.
    pub async fn get(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        opt_bytes(self.call("get", vec![arg(key)]).await?)
    }

    /// Sets a key to a value.
    pub async fn set(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        expect_bool(self.call("set", vec![arg(key), arg(value)]).await?)
    }

    /// Sets a key only if it does not exist; returns whether it was set.
    pub async fn setnx(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        expect_bool(self.call("setnx", vec![arg(key), arg(value)]).await?)
    }

    /// Sets a key with an expiry in seconds.
    pub async fn setex(&mut self, key: &[u8], seconds: i64, value: &[u8]) -> Result<bool> {
        expect_bool(
            self.call("setex", vec![arg(key), int_arg(seconds), arg(value)])
                .await?,
        )
    }

    /// Sets a key and returns its previous value.
    pub async fn getset(&mut self, key: &[u8], value: &[u8]) -> Result<Option<Bytes>> {
        opt_bytes(self.call("getset", vec![arg(key), arg(value)]).await?)
    }

    /// Appends to a string value; returns the new length.
    pub async fn append(&mut self, key: &[u8], value: &[u8]) -> Result<i64> {
        expect_int(self.call("append", vec![arg(key), arg(value)]).await?)
    }

    /// Returns the substring of a string value between two offsets.
    pub async fn substr(&mut self, key: &[u8], start: i64, end: i64) -> Result<Option<Bytes>> {
        opt_bytes(
            self.call("substr", vec![arg(key), int_arg(start), int_arg(end)])
                .await?,
        )
    }

    /// Fetches several keys at once; missing keys yield `None`, in the
    /// order the keys were asked for.
    pub async fn mget<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Result<Vec<Option<Bytes>>> {
        let items = match self.call("mget", args(keys)).await? {
            Value::Array(items) => items,
            other => return Err(unexpected("array", &other)),
        };
        items.into_iter().map(opt_bytes).collect()
    }

    /// Sets several key/value pairs at once.
    pub async fn mset<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        pairs: &[(K, V)],
    ) -> Result<bool> {
        expect_bool(self.call("mset", pair_args(pairs)).await?)
    }

    /// Sets several key/value pairs only if none of the keys exist.
    pub async fn msetnx<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        pairs: &[(K, V)],
    ) -> Result<bool> {
        expect_bool(self.call("msetnx", pair_args(pairs)).await?)
    }

    /// Increments an integer value by one; returns the new value.
    pub async fn incr(&mut self, key: &[u8]) -> Result<i64> {
        expect_int(self.call("incr", vec![arg(key)]).await?)
    }

    /// Increments an integer value; returns the new value.
    pub async fn incrby(&mut self, key: &[u8], increment: i64) -> Result<i64> {
        expect_int(self.call("incrby", vec![arg(key), int_arg(increment)]).await?)
    }

    /// Decrements an integer value by one; returns the new value.
    pub async fn decr(&mut self, key: &[u8]) -> Result<i64> {
        expect_int(self.call("decr", vec![arg(key)]).await?)
    }

    /// Decrements an integer value; returns the new value.
    pub async fn decrby(&mut self, key: &[u8], decrement: i64) -> Result<i64> {
        expect_int(self.call("decrby", vec![arg(key), int_arg(decrement)]).await?)
    }

    // ── list commands ───────────────────────────────────────────────────

    /// Pushes a value onto the head of a list.
    pub async fn lpush(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        expect_bool(self.call("lpush", vec![arg(key), arg(value)]).await?)
    }

    /// Pushes a value onto the tail of a list.
    pub async fn rpush(&mut self, key: &[u8], value: &[u8]) -> Result<bool> {
        expect_bool(self.call("rpush", vec![arg(key), arg(value)]).await?)
    }

    /// Returns the length of a list.
    pub async fn llen(&mut self, key: &[u8]) -> Result<i64> {
        expect_int(self.call("llen", vec![arg(key)]).await?)
    }

    /// Returns a range of list elements.
    pub async fn lrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        expect_bytes_array(
            self.call("lrange", vec![arg(key), int_arg(start), int_arg(stop)])
                .await?,
        )
    }

    /// Pops the first element of a list.
    pub async fn lpop(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        opt_bytes(self.call("lpop", vec![arg(key)]).await?)
    }

    /// Pops the last element of a list.
    pub async fn rpop(&mut self, key: &[u8]) -> Result<Option<Bytes>> {
        opt_bytes(self.call("rpop", vec![arg(key)]).await?)
    }

    // ── set commands ────────────────────────────────────────────────────

    /// Adds a member to a set; returns whether it was new.
    pub async fn sadd(&mut self, key: &[u8], member: &[u8]) -> Result<bool> {
        expect_bool(self.call("sadd", vec![arg(key), arg(member)]).await?)
    }

    /// Removes a member from a set; returns whether it was present.
    pub async fn srem(&mut self, key: &[u8], member: &[u8]) -> Result<bool> {
        expect_bool(self.call("srem", vec![arg(key), arg(member)]).await?)
    }

    /// Returns true if the member is in the set.
    pub async fn sismember(&mut self, key: &[u8], member: &[u8]) -> Result<bool> {
        expect_bool(self.call("sismember", vec![arg(key), arg(member)]).await?)
    }

    /// Returns the number of members in a set.
    pub async fn scard(&mut self, key: &[u8]) -> Result<i64> {
        expect_int(self.call("scard", vec![arg(key)]).await?)
    }

    /// Returns all members of a set.
    pub async fn smembers(&mut self, key: &[u8]) -> Result<Vec<Bytes>> {
        expect_bytes_array(self.call("smembers", vec![arg(key)]).await?)
    }

    // ── sorted set commands ─────────────────────────────────────────────

    /// Adds a member with a score; returns whether it was new.
    pub async fn zadd(&mut self, key: &[u8], score: f64, member: &[u8]) -> Result<bool> {
        expect_bool(
            self.call("zadd", vec![arg(key), float_arg(score), arg(member)])
                .await?,
        )
    }

    /// Removes a member from a sorted set; returns whether it was present.
    pub async fn zrem(&mut self, key: &[u8], member: &[u8]) -> Result<bool> {
        expect_bool(self.call("zrem", vec![arg(key), arg(member)]).await?)
    }

    /// Returns a member's score, or an error if it is missing.
    pub async fn zscore(&mut self, key: &[u8], member: &[u8]) -> Result<f64> {
        match self.call("zscore", vec![arg(key), arg(member)]).await? {
            Value::Float(score) => Ok(score),
            other => Err(unexpected("float", &other)),
        }
    }

    /// Returns a range of sorted-set members by rank.
    pub async fn zrange(&mut self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Bytes>> {
        expect_bytes_array(
            self.call("zrange", vec![arg(key), int_arg(start), int_arg(stop)])
                .await?,
        )
    }

    // ── hash commands ───────────────────────────────────────────────────

    /// Sets a hash field; returns whether the field was new.
    pub async fn hset(&mut self, key: &[u8], field: &[u8], value: &[u8]) -> Result<bool> {
        expect_bool(
            self.call("hset", vec![arg(key), arg(field), arg(value)])
                .await?,
        )
    }

    /// Fetches a hash field. Returns `None` when it is missing.
    pub async fn hget(&mut self, key: &[u8], field: &[u8]) -> Result<Option<Bytes>> {
        opt_bytes(self.call("hget", vec![arg(key), arg(field)]).await?)
    }

    /// Deletes a hash field; returns whether it was present.
    pub async fn hdel(&mut self, key: &[u8], field: &[u8]) -> Result<bool> {
        expect_bool(self.call("hdel", vec![arg(key), arg(field)]).await?)
    }

    /// Returns true if the hash field exists.
    pub async fn hexists(&mut self, key: &[u8], field: &[u8]) -> Result<bool> {
        expect_bool(self.call("hexists", vec![arg(key), arg(field)]).await?)
    }

    /// Returns the number of fields in a hash.
    pub async fn hlen(&mut self, key: &[u8]) -> Result<i64> {
        expect_int(self.call("hlen", vec![arg(key)]).await?)
    }

    /// Returns all fields and values of a hash as ordered pairs.
    pub async fn hgetall(&mut self, key: &[u8]) -> Result<Vec<(Bytes, Value)>> {
        match self.call("hgetall", vec![arg(key)]).await? {
            Value::Map(pairs) => Ok(pairs),
            other => Err(unexpected("map", &other)),
        }
    }

    /// Sets several hash fields at once.
    pub async fn hmset<K: AsRef<[u8]>, V: AsRef<[u8]>>(
        &mut self,
        key: &[u8],
        pairs: &[(K, V)],
    ) -> Result<bool> {
        let mut call_args = vec![arg(key)];
        call_args.extend(pair_args(pairs));
        expect_bool(self.call("hmset", call_args).await?)
    }

    // ── sorting ─────────────────────────────────────────────────────────

    /// Sorts a list, set, or sorted set.
    pub async fn sort(&mut self, key: &[u8], options: SortOptions) -> Result<Vec<Value>> {
        let mut call_args = vec![arg(key)];
        options.append_args(&mut call_args);
        match self.call("sort", call_args).await? {
            Value::Array(items) => Ok(items),
            other => Err(unexpected("array", &other)),
        }
    }

    // ── server commands ─────────────────────────────────────────────────

    /// Pings the server; returns true on PONG.
    pub async fn ping(&mut self) -> Result<bool> {
        expect_bool(self.call("ping", vec![]).await?)
    }

    /// Selects a database on the live connection.
    pub async fn select(&mut self, db: u32) -> Result<bool> {
        expect_bool(self.call("select", vec![int_arg(db as i64)]).await?)
    }

    /// Fetches the server's INFO text.
    pub async fn info(&mut self) -> Result<Bytes> {
        match self.call("info", vec![]).await? {
            Value::Bytes(data) => Ok(data),
            other => Err(unexpected("bulk string", &other)),
        }
    }
}

// ── argument helpers ───────────────────────────────────────────────────

fn arg(data: &[u8]) -> Bytes {
    Bytes::copy_from_slice(data)
}

fn int_arg(n: i64) -> Bytes {
    Bytes::from(n.to_string())
}

fn float_arg(f: f64) -> Bytes {
    Bytes::from(f.to_string())
}

fn args<K: AsRef<[u8]>>(items: &[K]) -> Vec<Bytes> {
    items.iter().map(|item| arg(item.as_ref())).collect()
}

fn pair_args<K: AsRef<[u8]>, V: AsRef<[u8]>>(pairs: &[(K, V)]) -> Vec<Bytes> {
    let mut out = Vec::with_capacity(pairs.len() * 2);
    for (key, value) in pairs {
        out.push(arg(key.as_ref()));
        out.push(arg(value.as_ref()));
    }
    out
}

// ── result projections ─────────────────────────────────────────────────

fn expect_bool(value: Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| unexpected("bool", &value))
}

fn expect_int(value: Value) -> Result<i64> {
    value.as_int().ok_or_else(|| unexpected("integer", &value))
}

fn opt_bytes(value: Value) -> Result<Option<Bytes>> {
    match value {
        Value::Nil => Ok(None),
        Value::Bytes(data) => Ok(Some(data)),
        other => Err(unexpected("bulk string", &other)),
    }
}

fn expect_bytes_array(value: Value) -> Result<Vec<Bytes>> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(unexpected("array", &other)),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Bytes(data) => Ok(data),
            other => Err(unexpected("bulk string", &other)),
        })
        .collect()
}

fn unexpected(expected: &'static str, got: &Value) -> Error {
    Error::Protocol(ProtocolError::UnexpectedReply {
        expected,
        got: got.kind(),
    })
}
