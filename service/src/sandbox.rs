//! Per-instance mixin receivers
//!
//! Every sandboxed mixin gets a private receiver per host instance. Receivers
//! are created lazily on the first call that needs them and live as long as
//! the host instance. Slots are numbered graph-wide, so a bucket only stores
//! the slots its instance actually used.

use indexmap::IndexMap;
use indexmap::map::Entry;
use trellis_core::Result;

use crate::instance::Instance;

/// Private receivers of one instance, indexed by sandbox slot
#[derive(Debug, Clone, Default)]
pub struct SandboxBucket {
    slots: IndexMap<usize, Box<Instance>>,
}

impl SandboxBucket {
    /// Create an empty bucket
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Receiver at `slot`, if it has been created
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Instance> {
        self.slots.get(&slot).map(|receiver| &**receiver)
    }

    /// Receiver at `slot`, creating it with `create` on first use
    ///
    /// # Errors
    ///
    /// Propagates any error from `create`; the slot stays empty in that case.
    pub fn get_or_create<F>(&mut self, slot: usize, create: F) -> Result<&mut Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        match self.slots.entry(slot) {
            Entry::Occupied(entry) => Ok(&mut **entry.into_mut()),
            Entry::Vacant(entry) => Ok(&mut **entry.insert(Box::new(create()?))),
        }
    }

    /// Slots with a receiver, in creation order
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.keys().copied()
    }

    /// Number of receivers created so far
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.len()
    }
}
