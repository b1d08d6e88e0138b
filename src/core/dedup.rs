//! Bounded set of already-handled Discord message IDs.
//!
//! Gateway reconnects can redeliver `MESSAGE_CREATE`; the relay checks this set
//! before touching a link so the same message is never downloaded twice.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::core::config;

struct Inner {
    seen: HashSet<u64>,
    order: VecDeque<u64>,
}

/// Insertion-ordered set with bulk truncation of the oldest entries.
pub struct ProcessedMessages {
    inner: Mutex<Inner>,
    capacity: usize,
    evict: usize,
}

impl Default for ProcessedMessages {
    fn default() -> Self {
        Self::new(config::dedup::CAPACITY, config::dedup::EVICT)
    }
}

impl ProcessedMessages {
    /// `capacity` IDs are kept; once exceeded, the `evict` oldest are dropped.
    pub fn new(capacity: usize, evict: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                seen: HashSet::with_capacity(capacity + 1),
                order: VecDeque::with_capacity(capacity + 1),
            }),
            capacity,
            evict: evict.max(1),
        }
    }

    /// Records `id`. Returns `false` when it was already recorded.
    pub fn check_and_insert(&self, id: u64) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.seen.insert(id) {
            return false;
        }
        inner.order.push_back(id);

        if inner.order.len() > self.capacity {
            for _ in 0..self.evict {
                match inner.order.pop_front() {
                    Some(old) => {
                        inner.seen.remove(&old);
                    }
                    None => break,
                }
            }
        }
        true
    }

    pub fn contains(&self, id: u64) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
