//! Append-only query caches
//!
//! Relationship caches are never evicted. Because the graph only grows, a
//! positive reachability answer stays true forever; every other answer is
//! stamped with the graph generation it was computed at and recomputed once
//! the graph has been mutated since.

use std::cell::RefCell;
use std::collections::HashMap;

use trellis_core::DescriptorId;

/// How long a cached answer may be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// `true` is permanent, `false` only holds for the generation it was computed at
    Monotonic,
    /// Any answer only holds for the generation it was computed at
    Generation,
}

/// A cached boolean answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// The answer
    pub value: bool,
    /// Graph generation the answer was computed at
    pub generation: u64,
}

impl CacheEntry {
    fn usable(self, generation: u64, retention: Retention) -> bool {
        match retention {
            Retention::Monotonic => self.value || self.generation == generation,
            Retention::Generation => self.generation == generation,
        }
    }
}

/// Mapping from target descriptor to cached answer
///
/// Interior mutability lets queries memoize through `&self`; the graph is
/// single-writer, so a `RefCell` is sufficient.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RefCell<HashMap<DescriptorId, CacheEntry>>,
}

impl QueryCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached answer for `key`, if still trustworthy at `generation`
    #[must_use]
    pub fn lookup(&self, key: DescriptorId, generation: u64, retention: Retention) -> Option<bool> {
        self.entries
            .borrow()
            .get(&key)
            .filter(|entry| entry.usable(generation, retention))
            .map(|entry| entry.value)
    }

    /// Record an answer
    pub fn record(&self, key: DescriptorId, value: bool, generation: u64) {
        self.entries
            .borrow_mut()
            .insert(key, CacheEntry { value, generation });
    }

    /// Raw entry, stale or not
    #[must_use]
    pub fn entry(&self, key: DescriptorId) -> Option<CacheEntry> {
        self.entries.borrow().get(&key).copied()
    }

    /// Number of recorded answers
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every answer
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Clone for QueryCache {
    fn clone(&self) -> Self {
        Self {
            entries: RefCell::new(self.entries.borrow().clone()),
        }
    }
}
