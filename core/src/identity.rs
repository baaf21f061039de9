//! Identity registry for class descriptors, behaviors and member names
//!
//! Every descriptor and behavior receives a process-wide, monotonic identifier
//! the first time it is created. Identifiers are never reused, so an id minted
//! by one graph can never be confused with a descriptor owned by another.
//! Member names are interned so tables copied during composition share one
//! allocation per name.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Global identity registry
static REGISTRY: std::sync::LazyLock<IdentityRegistry> =
    std::sync::LazyLock::new(IdentityRegistry::new);

/// Stable identifier of a class descriptor, member bag or protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DescriptorId(u64);

impl DescriptorId {
    /// Raw numeric value of the identifier
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identifier of a behavior (callable member)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BehaviorId(u64);

impl BehaviorId {
    /// Raw numeric value of the identifier
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BehaviorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// Thread-safe identity registry
///
/// Descriptor and behavior ids come from separate counters; both only grow.
pub struct IdentityRegistry {
    next_descriptor: AtomicU64,
    next_behavior: AtomicU64,
    names: RwLock<HashMap<String, Arc<str>>>,
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRegistry {
    /// Create a new registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_descriptor: AtomicU64::new(0),
            next_behavior: AtomicU64::new(0),
            names: RwLock::new(HashMap::new()),
        }
    }

    /// Assign the next descriptor id
    pub fn assign_descriptor(&self) -> DescriptorId {
        DescriptorId(self.next_descriptor.fetch_add(1, Ordering::Relaxed))
    }

    /// Assign the next behavior id
    pub fn assign_behavior(&self) -> BehaviorId {
        BehaviorId(self.next_behavior.fetch_add(1, Ordering::Relaxed))
    }

    /// Intern a member name and return an `Arc<str>`
    pub fn intern(&self, name: &str) -> Arc<str> {
        {
            // A poisoned lock still holds a consistent map, so reads fall through to it
            let names = match self.names.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(interned) = names.get(name) {
                return Arc::clone(interned);
            }
        }

        let mut names = match self.names.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Another thread may have interned the name while we waited
        if let Some(interned) = names.get(name) {
            return Arc::clone(interned);
        }

        let interned: Arc<str> = Arc::from(name);
        names.insert(name.to_string(), Arc::clone(&interned));
        interned
    }

    /// Number of distinct interned names
    pub fn interned_count(&self) -> usize {
        self.names.read().map(|guard| guard.len()).unwrap_or(0)
    }
}

/// Assign a descriptor id from the global registry
pub fn next_descriptor_id() -> DescriptorId {
    REGISTRY.assign_descriptor()
}

/// Assign a behavior id from the global registry
pub fn next_behavior_id() -> BehaviorId {
    REGISTRY.assign_behavior()
}

/// Intern a member name using the global registry
pub fn intern(name: &str) -> Arc<str> {
    REGISTRY.intern(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let registry = IdentityRegistry::new();
        let a = registry.assign_descriptor();
        let b = registry.assign_descriptor();
        assert!(b > a);
        assert_eq!(b.get(), a.get() + 1);

        let f = registry.assign_behavior();
        let g = registry.assign_behavior();
        assert!(g > f);
    }

    #[test]
    fn test_global_ids_never_repeat() {
        let first = next_descriptor_id();
        let second = next_descriptor_id();
        assert_ne!(first, second);
    }

    #[test]
    fn test_name_interning() {
        let registry = IdentityRegistry::new();

        let a = registry.intern("feed");
        let b = registry.intern("feed");
        let c = registry.intern("walk");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.interned_count(), 2);
    }

    #[test]
    fn test_display() {
        let registry = IdentityRegistry::new();
        assert_eq!(registry.assign_descriptor().to_string(), "#0");
        assert_eq!(registry.assign_behavior().to_string(), "fn#0");
    }
}
