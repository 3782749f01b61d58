//! Fixed-capacity rolling log
//!
//! [`BoundedLog`] keeps at most `capacity` items; pushing onto a full log
//! evicts the oldest entry. The session uses it for the feedback log, the
//! error log and the recently-played history.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer with push-and-evict-oldest semantics
///
/// Iteration order is oldest first.
///
/// # Examples
///
/// ```
/// use vinylvibe::bounded::BoundedLog;
///
/// let mut log = BoundedLog::new(2);
/// log.push("a");
/// log.push("b");
/// let evicted = log.push("c");
/// assert_eq!(evicted, Some("a"));
/// assert_eq!(log.to_vec(), vec!["b", "c"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundedLog<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedLog<T> {
    /// Create an empty log holding at most `capacity` items
    ///
    /// A capacity of zero is bumped to one so the most recent item is always
    /// observable.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append an item, returning the evicted oldest item if the log was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Maximum number of retained items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the log holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.items.iter()
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> BoundedLog<T> {
    /// Copy the items out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}
