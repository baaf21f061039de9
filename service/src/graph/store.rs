//! Relationship graph store
//!
//! Owns every descriptor of one class hierarchy together with its member
//! tables, extension parent, composition sources and implemented protocols.

use std::cell::Cell;
use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;
use trellis_core::identity::{self, next_descriptor_id};
use trellis_core::prelude::*;

use super::descriptor::{ClassDescriptor, DescriptorKind, Initializer};

/// Immediate parents of a descriptor: extension parent first, then composition sources
pub type Parents = SmallVec<[DescriptorId; 4]>;

/// The relationship graph of one class hierarchy
///
/// Composition operations take `&mut self`; queries take `&self` and memoize
/// through the descriptors' caches. The graph is `!Sync`: callers serialize
/// their own class-definition phase.
#[derive(Debug, Default)]
pub struct ClassGraph {
    descriptors: IndexMap<DescriptorId, ClassDescriptor>,
    config: TrellisConfig,
    generation: Cell<u64>,
    next_slot: usize,
}

impl ClassGraph {
    /// Create an empty graph with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given configuration
    #[must_use]
    pub fn with_config(config: TrellisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Number of mutations applied so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Number of registered descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no descriptor has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Register a new, empty class
    pub fn define_class(&mut self, name: &str) -> DescriptorId {
        self.register(name, DescriptorKind::Class, MemberTable::new())
    }

    /// Register a protocol: a class whose members describe required shapes
    pub fn define_protocol(&mut self, name: &str, requirements: MemberTable) -> DescriptorId {
        self.register(name, DescriptorKind::Class, requirements)
    }

    /// Register a plain member bag
    pub fn define_bag(&mut self, name: &str, members: MemberTable) -> DescriptorId {
        self.register(name, DescriptorKind::Bag, members)
    }

    fn register(&mut self, name: &str, kind: DescriptorKind, members: MemberTable) -> DescriptorId {
        let id = next_descriptor_id();
        debug!("Registered {kind} '{name}' as {id}");
        self.descriptors.insert(
            id,
            ClassDescriptor::new(id, Arc::from(name), kind, members),
        );
        self.bump_generation();
        id
    }

    /// Assign a member on a descriptor's own table
    ///
    /// # Errors
    ///
    /// Returns `NotAClass` if `id` is not registered in this graph.
    pub fn define_member(&mut self, id: DescriptorId, name: &str, value: impl Into<Value>) -> Result<()> {
        self.require_known(id, "Target", "define_member")?;
        self.descriptor_mut(id)?
            .members
            .insert(identity::intern(name), value.into());
        self.bump_generation();
        Ok(())
    }

    /// Assign a class-level member
    ///
    /// # Errors
    ///
    /// Returns `NotAClass` unless `id` is a class of this graph.
    pub fn define_static(&mut self, id: DescriptorId, name: &str, value: impl Into<Value>) -> Result<()> {
        self.require_class(id, "Class", "define_static")?;
        self.descriptor_mut(id)?
            .statics
            .insert(identity::intern(name), value.into());
        self.bump_generation();
        Ok(())
    }

    /// Set the constructor body run by `instantiate`
    ///
    /// # Errors
    ///
    /// Returns `NotAClass` unless `id` is a class of this graph.
    pub fn set_initializer<F>(&mut self, id: DescriptorId, initializer: F) -> Result<()>
    where
        F: Fn(&mut Fields) + Send + Sync + 'static,
    {
        self.require_class(id, "Class", "set_initializer")?;
        let initializer: Initializer = Arc::new(initializer);
        self.descriptor_mut(id)?.initializer = Some(initializer);
        Ok(())
    }

    /// Look up a descriptor
    #[must_use]
    pub fn descriptor(&self, id: DescriptorId) -> Option<&ClassDescriptor> {
        self.descriptors.get(&id)
    }

    /// Display name of a descriptor, or its id when unknown
    #[must_use]
    pub fn display_name(&self, id: DescriptorId) -> String {
        self.descriptors
            .get(&id)
            .map_or_else(|| id.to_string(), |descriptor| descriptor.name().to_string())
    }

    /// Extension parent of a descriptor
    #[must_use]
    pub fn extension_parent(&self, id: DescriptorId) -> Option<DescriptorId> {
        self.descriptors.get(&id)?.extension_parent
    }

    /// Composition sources of a descriptor
    #[must_use]
    pub fn composition_sources(&self, id: DescriptorId) -> &[DescriptorId] {
        self.descriptors
            .get(&id)
            .map_or(&[], |descriptor| descriptor.composition_sources())
    }

    /// Implemented protocols of a descriptor
    #[must_use]
    pub fn implemented_protocols(&self, id: DescriptorId) -> &[DescriptorId] {
        self.descriptors
            .get(&id)
            .map_or(&[], |descriptor| descriptor.implemented_protocols())
    }

    /// Resolve a member: own table first, then the extension chain
    #[must_use]
    pub fn lookup_member(&self, id: DescriptorId, name: &str) -> Option<&Value> {
        let mut current = Some(id);
        while let Some(descriptor) = current.and_then(|id| self.descriptors.get(&id)) {
            if let Some(value) = descriptor.members.get(name) {
                return Some(value);
            }
            current = descriptor.extension_parent;
        }
        None
    }

    /// Every member visible on a descriptor, own members first
    ///
    /// Names shadowed by a nearer descriptor appear once, with the nearer value.
    #[must_use]
    pub fn resolved_members(&self, id: DescriptorId) -> MemberTable {
        let mut resolved = MemberTable::new();
        let mut current = Some(id);
        while let Some(descriptor) = current.and_then(|id| self.descriptors.get(&id)) {
            for (name, value) in &descriptor.members {
                resolved
                    .entry(Arc::clone(name))
                    .or_insert_with(|| value.clone());
            }
            current = descriptor.extension_parent;
        }
        resolved
    }

    /// Extension parent followed by composition sources
    #[must_use]
    pub fn immediate_parents(&self, id: DescriptorId) -> Parents {
        let mut parents = Parents::new();
        if let Some(descriptor) = self.descriptors.get(&id) {
            parents.extend(descriptor.extension_parent);
            parents.extend(descriptor.composition_sources.iter().copied());
        }
        parents
    }

    /// Every descriptor reachable through extension and composition edges, nearest first
    ///
    /// Each descriptor appears once, however many paths lead to it.
    #[must_use]
    pub fn lineage(&self, id: DescriptorId) -> Vec<DescriptorId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            // Reverse so the extension parent is visited before composition sources
            stack.extend(self.immediate_parents(next).into_iter().rev());
        }
        order
    }

    pub(crate) fn require_known(
        &self,
        id: DescriptorId,
        role: &'static str,
        operation: &'static str,
    ) -> Result<&ClassDescriptor> {
        self.descriptors.get(&id).ok_or_else(|| {
            TrellisError::not_a_class(role, operation, format!("an unregistered descriptor {id}"))
        })
    }

    pub(crate) fn require_class(
        &self,
        id: DescriptorId,
        role: &'static str,
        operation: &'static str,
    ) -> Result<&ClassDescriptor> {
        let descriptor = self.require_known(id, role, operation)?;
        if descriptor.is_class() {
            Ok(descriptor)
        } else {
            Err(TrellisError::not_a_class(role, operation, descriptor.describe()))
        }
    }

    pub(crate) fn descriptor_mut(&mut self, id: DescriptorId) -> Result<&mut ClassDescriptor> {
        self.descriptors.get_mut(&id).ok_or_else(|| {
            TrellisError::not_a_class("Target", "update", format!("an unregistered descriptor {id}"))
        })
    }

    pub(crate) fn bump_generation(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    /// Reserve the next sandbox slot
    pub(crate) fn allocate_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_core::value::member_table;

    #[test]
    fn test_define_and_lookup() -> Result<()> {
        let mut graph = ClassGraph::new();
        let animal = graph.define_class("Animal");
        graph.define_member(animal, "legs", 4)?;

        assert_eq!(graph.lookup_member(animal, "legs"), Some(&Value::from(4)));
        assert_eq!(graph.lookup_member(animal, "wings"), None);
        assert_eq!(graph.display_name(animal), "Animal");
        Ok(())
    }

    #[test]
    fn test_lookup_delegates_to_extension_parent() -> Result<()> {
        let mut graph = ClassGraph::new();
        let animal = graph.define_class("Animal");
        graph.define_member(animal, "legs", 4)?;
        graph.define_member(animal, "sound", "...")?;
        let dog = graph.define_class("Dog");
        graph.extend(dog, animal)?;
        graph.define_member(dog, "sound", "woof")?;

        assert_eq!(graph.lookup_member(dog, "legs"), Some(&Value::from(4)));
        assert_eq!(graph.lookup_member(dog, "sound"), Some(&Value::from("woof")));

        let names: Vec<String> = graph
            .resolved_members(dog)
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["sound".to_string(), "legs".to_string()]);
        Ok(())
    }

    #[test]
    fn test_lineage_visits_diamond_once() -> Result<()> {
        let mut graph = ClassGraph::new();
        let base = graph.define_class("Base");
        let left = graph.define_class("Left");
        let right = graph.define_class("Right");
        let bottom = graph.define_class("Bottom");
        graph.extend(left, base)?;
        graph.extend(right, base)?;
        graph.extend(bottom, left)?;
        graph.multi_inherit(bottom, Some(right))?;

        let lineage = graph.lineage(bottom);
        assert_eq!(lineage, vec![bottom, left, base, right]);
        Ok(())
    }

    #[test]
    fn test_bags_are_not_classes() {
        let mut graph = ClassGraph::new();
        let bag = graph.define_bag("Counting", member_table([("count", 0)]));

        let err = graph.require_class(bag, "Target", "extend").unwrap_err();
        assert!(matches!(err, TrellisError::NotAClass { .. }));
        assert!(err.to_string().contains("member bag (Counting)"));
        assert!(graph.define_static(bag, "x", 1).is_err());
    }

    #[test]
    fn test_foreign_ids_are_rejected() {
        let mut other = ClassGraph::new();
        let foreign = other.define_class("Elsewhere");

        let mut graph = ClassGraph::new();
        let err = graph.define_member(foreign, "x", 1).unwrap_err();
        assert!(matches!(err, TrellisError::NotAClass { .. }));
    }

    #[test]
    fn test_mutations_advance_generation() -> Result<()> {
        let mut graph = ClassGraph::new();
        let before = graph.generation();
        let class = graph.define_class("Thing");
        graph.define_member(class, "x", 1)?;
        assert!(graph.generation() >= before + 2);
        Ok(())
    }
}
