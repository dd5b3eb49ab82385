//! SORT Option Builder
//!
//! The SORT command takes a small option language on the wire (`BY`,
//! `LIMIT`, `GET`, `ALPHA`, `ASC`/`DESC`, `STORE`). [`SortOptions`]
//! assembles those arguments so callers do not have to remember the
//! keyword order.

use bytes::Bytes;

/// Sort direction for [`SortOptions::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Options for the SORT command.
///
/// # Example
///
/// ```
/// use shoal::client::{Order, SortOptions};
///
/// let options = SortOptions::new()
///     .by(b"weight_*")
///     .limit(0, 10)
///     .order(Order::Descending)
///     .get(b"object_*");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    by: Option<Bytes>,
    limit: Option<(i64, i64)>,
    alpha: bool,
    order: Option<Order>,
    get: Vec<Bytes>,
    store: Option<Bytes>,
}

impl SortOptions {
    /// Creates an empty option set (plain numeric ascending sort).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts by the values of an external key pattern instead of the
    /// elements themselves.
    pub fn by(mut self, pattern: &[u8]) -> Self {
        self.by = Some(Bytes::copy_from_slice(pattern));
        self
    }

    /// Limits the result to `count` elements starting at `offset`.
    pub fn limit(mut self, offset: i64, count: i64) -> Self {
        self.limit = Some((offset, count));
        self
    }

    /// Sorts lexicographically instead of numerically.
    pub fn alpha(mut self) -> Self {
        self.alpha = true;
        self
    }

    /// Sets the sort direction.
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Fetches the values of an external key pattern for each element.
    /// May be given several times; each adds one GET clause.
    pub fn get(mut self, pattern: &[u8]) -> Self {
        self.get.push(Bytes::copy_from_slice(pattern));
        self
    }

    /// Stores the result in an external key instead of returning it.
    pub fn store(mut self, destination: &[u8]) -> Self {
        self.store = Some(Bytes::copy_from_slice(destination));
        self
    }

    /// Appends the wire arguments for this option set.
    pub(crate) fn append_args(&self, args: &mut Vec<Bytes>) {
        if let Some(by) = &self.by {
            args.push(Bytes::from_static(b"BY"));
            args.push(by.clone());
        }
        if let Some((offset, count)) = self.limit {
            args.push(Bytes::from_static(b"LIMIT"));
            args.push(Bytes::from(offset.to_string()));
            args.push(Bytes::from(count.to_string()));
        }
        if self.alpha {
            args.push(Bytes::from_static(b"ALPHA"));
        }
        match self.order {
            Some(Order::Ascending) => args.push(Bytes::from_static(b"ASC")),
            Some(Order::Descending) => args.push(Bytes::from_static(b"DESC")),
            None => {}
        }
        for pattern in &self.get {
            args.push(Bytes::from_static(b"GET"));
            args.push(pattern.clone());
        }
        if let Some(store) = &self.store {
            args.push(Bytes::from_static(b"STORE"));
            args.push(store.clone());
        }
    }
}
