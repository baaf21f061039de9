//! Class descriptors and member bags

use std::fmt;
use std::sync::Arc;

use trellis_core::{DescriptorId, Fields, MemberTable};

use super::cache::QueryCache;

/// Constructor body run when a class is instantiated
pub type Initializer = Arc<dyn Fn(&mut Fields) + Send + Sync>;

/// What a descriptor can be used as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Constructible class; may extend, implement and be queried for assignability
    Class,
    /// Plain member bag; only usable as a composition source or ad-hoc protocol
    Bag,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => f.write_str("class"),
            Self::Bag => f.write_str("member bag"),
        }
    }
}

/// A node of the relationship graph
///
/// The member table is the descriptor's own table; inherited members are
/// found by delegating to the extension parent. Composition edges and
/// protocol edges only ever grow.
pub struct ClassDescriptor {
    pub(crate) id: DescriptorId,
    pub(crate) name: Arc<str>,
    pub(crate) kind: DescriptorKind,
    pub(crate) members: MemberTable,
    pub(crate) statics: MemberTable,
    pub(crate) extension_parent: Option<DescriptorId>,
    pub(crate) composition_sources: Vec<DescriptorId>,
    pub(crate) implemented_protocols: Vec<DescriptorId>,
    pub(crate) initializer: Option<Initializer>,
    pub(crate) reachability_cache: QueryCache,
    pub(crate) fulfillment_cache: QueryCache,
}

impl ClassDescriptor {
    pub(crate) fn new(
        id: DescriptorId,
        name: Arc<str>,
        kind: DescriptorKind,
        members: MemberTable,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            members,
            statics: MemberTable::new(),
            extension_parent: None,
            composition_sources: Vec::new(),
            implemented_protocols: Vec::new(),
            initializer: None,
            reachability_cache: QueryCache::new(),
            fulfillment_cache: QueryCache::new(),
        }
    }

    /// Stable identity
    #[must_use]
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class or member bag
    #[must_use]
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Whether this descriptor is a constructible class
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.kind == DescriptorKind::Class
    }

    /// Own (non-inherited) members
    #[must_use]
    pub fn members(&self) -> &MemberTable {
        &self.members
    }

    /// Own class-level members
    #[must_use]
    pub fn statics(&self) -> &MemberTable {
        &self.statics
    }

    /// Single-inheritance parent
    #[must_use]
    pub fn extension_parent(&self) -> Option<DescriptorId> {
        self.extension_parent
    }

    /// Mixins and multi-inherited parents, in composition order
    #[must_use]
    pub fn composition_sources(&self) -> &[DescriptorId] {
        &self.composition_sources
    }

    /// Nominally implemented protocols, in declaration order
    #[must_use]
    pub fn implemented_protocols(&self) -> &[DescriptorId] {
        &self.implemented_protocols
    }

    /// Memoized reachability answers keyed by target
    #[must_use]
    pub fn reachability_cache(&self) -> &QueryCache {
        &self.reachability_cache
    }

    /// Describe this descriptor for error messages
    pub(crate) fn describe(&self) -> String {
        format!("a {} ({})", self.kind, self.name)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("statics", &self.statics.keys().collect::<Vec<_>>())
            .field("extension_parent", &self.extension_parent)
            .field("composition_sources", &self.composition_sources)
            .field("implemented_protocols", &self.implemented_protocols)
            .finish_non_exhaustive()
    }
}
