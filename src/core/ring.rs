//! Fixed-capacity FIFO ring buffer.
//!
//! Every sample and beat buffer in the pipeline is one of these. Pushing past
//! capacity evicts the oldest element, so memory stays bounded no matter how
//! long a session runs.

use std::collections::vec_deque::Iter;
use std::collections::VecDeque;

/// An ordered sequence with a fixed maximum length.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer holding at most `capacity` items.
    ///
    /// A capacity of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item, evicting the oldest one when full.
    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove all items, keeping the capacity.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Most recently pushed item.
    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// Items in push order (oldest first).
    pub fn iter(&self) -> Iter<'_, T> {
        self.items.iter()
    }

    /// The most recent `n` items (or fewer), oldest first.
    pub fn recent(&self, n: usize) -> Iter<'_, T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.range(skip..)
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Copy the contents out in chronological order.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a RingBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
