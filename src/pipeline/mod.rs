//! Pipeline Module
//!
//! A pipeline amortizes round-trip latency: it queues commands without
//! touching the socket, then flushes them as one batched write and reads
//! the replies back in submission order.
//!
//! ## Write/Read Discipline
//!
//! All writes precede all reads for a given flush. This is required
//! correctness, not an optimization: a client that reads after every
//! write can deadlock when the server is still buffering a partially
//! transmitted command and cannot produce the awaited reply yet.
//!
//! ## Two Flush Shapes
//!
//! The source protocol's clients returned either a single result or a
//! sequence depending on how many commands were queued. That contract is
//! kept, but as two explicit call shapes instead of a polymorphic return:
//!
//! - [`Pipeline::flush`] returns all results in order
//!   (`None` for an empty batch - distinguishable from zero results).
//! - [`Pipeline::flush_one`] returns the single unwrapped result for a
//!   one-command batch.
//!
//! ## Example
//!
//! ```ignore
//! let mut pipe = client.pipeline();
//! pipe.cmd("set", vec![Bytes::from("a"), Bytes::from("1")])?;
//! pipe.cmd("incr", vec![Bytes::from("counter")])?;
//! pipe.cmd("get", vec![Bytes::from("a")])?;
//! let results = pipe.flush().await?.unwrap();
//! assert_eq!(results.len(), 3);
//! ```

use crate::client::Client;
use crate::commands::{lookup, CommandDescriptor, Value};
use crate::error::Result;
use bytes::Bytes;

/// A batch of commands queued against one client.
///
/// Borrows the client mutably for its lifetime, so no interleaved
/// single-command traffic can corrupt the reply order.
#[derive(Debug)]
pub struct Pipeline<'a> {
    client: &'a mut Client,
    queued: Vec<(CommandDescriptor, Vec<Bytes>)>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(client: &'a mut Client) -> Self {
        Self {
            client,
            queued: Vec::new(),
        }
    }

    /// Queues a command without executing it.
    ///
    /// Arity is validated immediately - before any I/O - so a malformed
    /// call fails at the call site, not in the middle of a flush.
    pub fn cmd(&mut self, name: &str, args: Vec<Bytes>) -> Result<&mut Self> {
        let descriptor = lookup(name);
        descriptor.check_arity(args.len())?;
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

    /// Executes the batch and returns every result in submission order.
    ///
    /// Returns `None` when nothing was queued; no I/O happens in that
    /// case.
    pub async fn flush(self) -> Result<Option<Vec<Value>>> {
        if self.queued.is_empty() {
            return Ok(None);
        }
        let results = self.client.exec_batch(&self.queued).await?;
        Ok(Some(results))
    }

    /// Executes a single-command batch and returns its result unwrapped.
    ///
    /// Returns `None` when nothing was queued.
    ///
    /// # Panics
    ///
    /// Panics if more than one command was queued; use [`Pipeline::flush`]
    /// for multi-command batches.
    pub async fn flush_one(self) -> Result<Option<Value>> {
        assert!(
            self.queued.len() <= 1,
            "flush_one called with {} queued commands; use flush()",
            self.queued.len()
        );
        Ok(self.flush().await?.and_then(|mut results| results.pop()))
    }
}
