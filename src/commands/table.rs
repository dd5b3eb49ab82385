//! Command Descriptor Table
//!
//! This module declares the static metadata the client needs to turn a
//! command name plus an argument list into wire bytes and a typed result:
//! the expected arity, the historical wire-encoding class, and the reply
//! kind that selects the coercion applied to the server's answer.
//!
//! The table is total: [`lookup`] returns a descriptor for *any* name, so
//! new server commands work immediately through [`Client::call`] with raw
//! replies and unconstrained arity.
//!
//! [`Client::call`]: crate::client::Client::call

use crate::error::{Error, Result};
use std::fmt;

/// Arity constraint for a command's argument list.
///
/// Counts the arguments *excluding* the command name, matching the calling
/// convention of [`Client::call`].
///
/// [`Client::call`]: crate::client::Client::call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The command takes exactly this many arguments.
    Exact(usize),
    /// The command takes at least this many arguments.
    AtLeast(usize),
    /// No constraint (used for unknown commands).
    Any,
}

impl Arity {
    /// Returns true if `actual` arguments satisfy this constraint.
    pub fn accepts(&self, actual: usize) -> bool {
        match *self {
            Arity::Exact(n) => actual == n,
            Arity::AtLeast(n) => actual >= n,
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Historical wire-encoding class of a command.
///
/// Early protocol revisions distinguished inline, bulk, and multibulk
/// request forms. The multibulk form is accepted for every command and is
/// the only form this client transmits; the class is kept as descriptor
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Space-separated single-line form (legacy).
    Inline,
    /// Last argument length-prefixed (legacy).
    Bulk,
    /// Every argument length-prefixed; the canonical form.
    Multibulk,
}

/// Selects the coercion applied to a command's raw reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Status reply expected to be `OK`; coerces to `true`.
    Ok,
    /// Status reply expected to be `PONG`; coerces to `true`.
    Pong,
    /// Status reply expected to be `QUEUED`; coerces to `true`.
    Queued,
    /// Integer reply where 0/1 mean false/true.
    Bool,
    /// Integer reply.
    Int,
    /// Numeric reply carried as a bulk string or status.
    Float,
    /// Array reply; a null array coerces to an empty sequence.
    Array,
    /// Flat `[k0, v0, k1, v1, ...]` array regrouped into ordered pairs.
    Assoc,
    /// No coercion; the raw reply is surfaced as-is.
    Raw,
}

/// Static metadata for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// The command name as the caller spelled it (sent verbatim on the wire).
    pub name: String,
    /// Arity constraint, validated before any I/O.
    pub arity: Arity,
    /// Historical wire-encoding class.
    pub encoding: Encoding,
    /// Reply coercion selector.
    pub reply: ReplyKind,
}

impl CommandDescriptor {
    /// Validates an argument count against this descriptor's arity.
    ///
    /// Runs before any bytes are written to the socket.
    pub fn check_arity(&self, actual: usize) -> Result<()> {
        if self.arity.accepts(actual) {
            return Ok(());
        }
        Err(Error::ArgumentCount {
            command: self.name.clone(),
            expected: self.arity,
            actual,
        })
    }
}

/// Looks up the descriptor for a command name (case-insensitive).
///
/// Unknown names get the permissive default: multibulk encoding, raw
/// reply, unconstrained arity.
pub fn lookup(name: &str) -> CommandDescriptor {
    use Arity::{AtLeast, Any, Exact};
    use Encoding::{Bulk, Inline, Multibulk};
    use ReplyKind::{Array, Assoc, Bool, Float, Int, Ok, Pong, Raw};

    let lower = name.to_ascii_lowercase();
    let (arity, encoding, reply) = match lower.as_str() {
        // connection
        "auth" => (Exact(1), Inline, Ok),
        "select" => (Exact(1), Inline, Ok),
        "echo" => (Exact(1), Bulk, Raw),
        "quit" => (Exact(0), Inline, Raw),

        // multi/exec
        "multi" => (Exact(0), Inline, Ok),
        "exec" => (Exact(0), Inline, Raw),
        "discard" => (Exact(0), Inline, Ok),

        // generics
        "exists" => (Exact(1), Inline, Bool),
        "del" => (AtLeast(1), Inline, Int),
        "type" => (Exact(1), Inline, Raw),
        "keys" => (Exact(1), Inline, Array),
        "randomkey" => (Exact(0), Inline, Raw),
        "rename" => (Exact(2), Inline, Ok),
        "renamenx" => (Exact(2), Inline, Bool),
        "dbsize" => (Exact(0), Inline, Int),
        "expire" => (Exact(2), Inline, Bool),
        "expireat" => (Exact(2), Inline, Bool),
        "ttl" => (Exact(1), Inline, Int),
        "move" => (Exact(2), Inline, Bool),
        "flushdb" => (Exact(0), Inline, Ok),
        "flushall" => (Exact(0), Inline, Ok),

        // strings
        "set" => (Exact(2), Bulk, Ok),
        "get" => (Exact(1), Inline, Raw),
        "getset" => (Exact(2), Bulk, Raw),
        "setnx" => (Exact(2), Bulk, Bool),
        "setex" => (Exact(3), Bulk, Ok),
        "append" => (Exact(2), Bulk, Int),
        "substr" => (Exact(3), Inline, Raw),
        "mget" => (AtLeast(1), Inline, Array),
        "mset" => (AtLeast(2), Multibulk, Ok),
        "msetnx" => (AtLeast(2), Multibulk, Bool),
        "incr" => (Exact(1), Inline, Int),
        "incrby" => (Exact(2), Inline, Int),
        "decr" => (Exact(1), Inline, Int),
        "decrby" => (Exact(2), Inline, Int),

        // lists
        "lpush" => (Exact(2), Bulk, Bool),
        "rpush" => (Exact(2), Bulk, Bool),
        "llen" => (Exact(1), Inline, Int),
        "lrange" => (Exact(3), Inline, Array),
        "ltrim" => (Exact(3), Inline, Ok),
        "lindex" => (Exact(2), Inline, Raw),
        "lset" => (Exact(3), Bulk, Ok),
        "lrem" => (Exact(3), Bulk, Int),
        "lpop" => (Exact(1), Inline, Raw),
        "rpop" => (Exact(1), Inline, Raw),
        "rpoplpush" => (Exact(2), Inline, Raw),

        // sets
        "sadd" => (Exact(2), Bulk, Bool),
        "srem" => (Exact(2), Bulk, Bool),
        "spop" => (Exact(1), Inline, Raw),
        "smove" => (Exact(3), Bulk, Bool),
        "scard" => (Exact(1), Inline, Int),
        "sismember" => (Exact(2), Bulk, Bool),
        "sinter" => (AtLeast(1), Inline, Array),
        "sinterstore" => (AtLeast(2), Inline, Int),
        "sunion" => (AtLeast(1), Inline, Array),
        "sunionstore" => (AtLeast(2), Inline, Int),
        "sdiff" => (AtLeast(1), Inline, Array),
        "sdiffstore" => (AtLeast(2), Inline, Int),
        "smembers" => (Exact(1), Inline, Array),
        "srandmember" => (Exact(1), Inline, Raw),

        // zsets (sorted sets)
        "zadd" => (Exact(3), Bulk, Bool),
        "zrem" => (Exact(2), Bulk, Bool),
        "zincrby" => (Exact(3), Bulk, Float),
        "zrange" => (AtLeast(3), Inline, Array),
        "zrevrange" => (AtLeast(3), Inline, Array),
        "zrangebyscore" => (AtLeast(3), Inline, Array),
        "zcard" => (Exact(1), Inline, Int),
        "zscore" => (Exact(2), Bulk, Float),
        "zremrangebyscore" => (Exact(3), Inline, Int),

        // hashes
        "hset" => (Exact(3), Multibulk, Bool),
        "hget" => (Exact(2), Multibulk, Raw),
        "hdel" => (Exact(2), Multibulk, Bool),
        "hexists" => (Exact(2), Multibulk, Bool),
        "hlen" => (Exact(1), Multibulk, Int),
        "hkeys" => (Exact(1), Multibulk, Array),
        "hvals" => (Exact(1), Multibulk, Array),
        "hgetall" => (Exact(1), Multibulk, Assoc),
        "hmset" => (AtLeast(3), Multibulk, Ok),
        "hincrby" => (Exact(3), Multibulk, Int),

        // sorting
        "sort" => (AtLeast(1), Inline, Array),

        // persistence
        "save" => (Exact(0), Inline, Ok),
        "bgsave" => (Exact(0), Inline, Ok),
        "bgrewriteaof" => (Exact(0), Inline, Ok),
        "lastsave" => (Exact(0), Inline, Int),

        // server
        "ping" => (Exact(0), Inline, Pong),
        "shutdown" => (Exact(0), Inline, Raw),
        "info" => (Exact(0), Inline, Raw),
        "slaveof" => (Exact(2), Inline, Ok),

        // unknown commands pass through with raw replies
        _ => (Any, Multibulk, Raw),
    };

    CommandDescriptor {
        name: name.to_string(),
        arity,
        encoding,
        reply,
    }
}
