//! Blocking Priority Queue
//!
//! Thread-safe queue that hands out items in decreasing priority order.
//!
//! Items are kept in a vector sorted ascending by the queue's order, so the
//! highest priority item sits at the back and `pop` is a `Vec::pop`. New
//! items go in at the lower bound of their priority class, i.e. in front of
//! equal items already queued. Popping from the back therefore yields equal
//! items oldest first.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Strict "lower priority than" relation between two items
pub type LessFn<T> = Box<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Priority queue with blocking, timed retrieval.
///
/// `less(a, b)` returning true means `a` has lower priority than `b`. Among
/// items the order considers equal, retrieval order is insertion order.
pub struct BlockingPriorityQueue<T> {
    /// Ascending by `less`; the back is the next item out
    items: Mutex<Vec<T>>,
    /// Signalled on insert
    available: Condvar,
    less: LessFn<T>,
}

impl<T> fmt::Debug for BlockingPriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingPriorityQueue")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: Ord + 'static> BlockingPriorityQueue<T> {
    /// Create an empty queue ordered by `T`'s natural order
    pub fn new() -> Self {
        Self::with_comparator(|a: &T, b: &T| a < b)
    }
}

impl<T: Ord + 'static> Default for BlockingPriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingPriorityQueue<T> {
    /// Create an empty queue using `less` as the priority order.
    ///
    /// `less` must be a strict weak order and free of side effects.
    pub fn with_comparator<F>(less: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self {
            items: Mutex::new(Vec::new()),
            available: Condvar::new(),
            less: Box::new(less),
        }
    }

    /// Index at which `item` goes: first slot not lower than `item`
    fn lower_bound(&self, items: &[T], item: &T) -> usize {
        items.partition_point(|existing| (self.less)(existing, item))
    }

    /// Insert an item and wake one waiting consumer
    pub fn insert(&self, item: T) {
        let mut items = self.items.lock();
        let index = self.lower_bound(&items, &item);
        items.insert(index, item);
        drop(items);

        self.available.notify_one();
    }

    /// Insert a copy of `item`
    pub fn insert_cloned(&self, item: &T)
    where
        T: Clone,
    {
        self.insert(item.clone());
    }

    /// Insert items in iteration order under a single lock acquisition
    pub fn extend<I>(&self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        // The iterator is caller code; drive it before taking the lock
        let incoming: Vec<T> = iter.into_iter().collect();
        let added = incoming.len();

        let mut items = self.items.lock();
        for item in incoming {
            let index = self.lower_bound(&items, &item);
            items.insert(index, item);
        }
        drop(items);

        match added {
            0 => {}
            1 => {
                self.available.notify_one();
            }
            _ => {
                self.available.notify_all();
            }
        }
    }

    /// Remove the highest priority item.
    ///
    /// When the queue is empty, waits up to `timeout` for an insert. A zero
    /// timeout never blocks. Returns `None` once the timeout has elapsed
    /// with nothing to take, including when another consumer took the item
    /// this call was woken for.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let mut items = self.items.lock();

        if items.is_empty() && !timeout.is_zero() {
            match Instant::now().checked_add(timeout) {
                Some(deadline) => {
                    while items.is_empty() {
                        if self.available.wait_until(&mut items, deadline).timed_out() {
                            break;
                        }
                    }
                }
                None => {
                    // Deadline not representable, wait without one
                    while items.is_empty() {
                        self.available.wait(&mut items);
                    }
                }
            }
        }

        let item = items.pop();
        if item.is_none() {
            tracing::trace!(?timeout, "Pop timed out on empty queue");
        }
        item
    }

    /// Remove the highest priority item without blocking
    pub fn try_pop(&self) -> Option<T> {
        self.pop(Duration::ZERO)
    }

    /// Out-parameter form of [`pop`](Self::pop).
    ///
    /// Returns true and overwrites `out` on success; leaves `out` untouched
    /// on timeout.
    pub fn pop_into(&self, out: &mut T, timeout: Duration) -> bool {
        match self.pop(timeout) {
            Some(item) => {
                *out = item;
                true
            }
            None => false,
        }
    }

    /// Number of queued items at the time of the call
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Check if the queue was empty at the time of the call
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
