//! Assignability queries
//!
//! `is_assignable_from` is a memoized reachability search over extension,
//! composition and protocol edges. Mixins create an is-a relationship just
//! like extension does.

use tracing::trace;
use trellis_core::prelude::*;

use crate::graph::{ClassGraph, Retention};
use crate::instance::Instance;

impl ClassGraph {
    /// Whether instances of `class` may be used where `other` is expected
    ///
    /// True when `other` is `class` itself, an extension ancestor, or reachable
    /// through any composition source or implemented protocol.
    ///
    /// # Errors
    ///
    /// Returns `NotAClass` if either argument is not a class of this graph.
    pub fn is_assignable_from(&self, class: DescriptorId, other: DescriptorId) -> Result<bool> {
        self.require_class(class, "Class", "isAssignableFrom")?;
        self.require_class(other, "Parent", "isAssignableFrom")?;
        Ok(self.reaches(class, other))
    }

    /// Whether `instance` was constructed from something assignable to `class`
    ///
    /// An absent instance is never an instance of anything.
    ///
    /// # Errors
    ///
    /// Returns `NotAClass` if `class` is not a class of this graph.
    pub fn is_a(&self, instance: Option<&Instance>, class: DescriptorId) -> Result<bool> {
        self.require_class(class, "Parent", "isA")?;
        Ok(instance.is_some_and(|instance| self.reaches(instance.class(), class)))
    }

    /// Reachability over any descriptor kind, without argument validation
    pub(crate) fn reaches(&self, from: DescriptorId, to: DescriptorId) -> bool {
        if from == to {
            return true;
        }
        let Some(descriptor) = self.descriptor(from) else {
            return false;
        };

        let memoize = self.config().cache.memoize_reachability;
        let generation = self.generation();
        if memoize
            && let Some(hit) =
                descriptor
                    .reachability_cache
                    .lookup(to, generation, Retention::Monotonic)
        {
            trace!("Reachability cache hit {from} -> {to}: {hit}");
            return hit;
        }

        let reachable = descriptor
            .extension_parent
            .is_some_and(|parent| self.reaches(parent, to))
            || descriptor
                .composition_sources
                .iter()
                .any(|&source| self.reaches(source, to))
            || descriptor
                .implemented_protocols
                .iter()
                .any(|&protocol| self.reaches(protocol, to));

        if memoize {
            descriptor.reachability_cache.record(to, reachable, generation);
        }
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hierarchy {
        graph: ClassGraph,
        child: DescriptorId,
        parent: DescriptorId,
        interface: DescriptorId,
        mixin: DescriptorId,
        other: DescriptorId,
        parents_interface: DescriptorId,
        parents_mixin: DescriptorId,
    }

    fn hierarchy() -> Hierarchy {
        let mut graph = ClassGraph::new();
        let interface = graph.define_class("InterfaceClass");
        let mixin = graph.define_class("MixinClass");
        let other = graph.define_class("OtherClass");
        let parents_interface = graph.define_class("ParentsInterface");
        let parents_mixin = graph.define_class("ParentsMixin");

        let parent = graph.define_class("ParentClass");
        graph
            .implement(parent, parents_interface)
            .expect("empty protocol is always implemented");
        graph
            .mixin(parent, Some(parents_mixin))
            .expect("empty mixin never conflicts");

        let child = graph.define_class("ChildClass");
        graph.extend(child, parent).expect("child is clean");
        graph.mixin(child, Some(mixin)).expect("empty mixin never conflicts");
        graph
            .implement(child, interface)
            .expect("empty protocol is always implemented");

        Hierarchy {
            graph,
            child,
            parent,
            interface,
            mixin,
            other,
            parents_interface,
            parents_mixin,
        }
    }

    #[test]
    fn test_reflexive() -> Result<()> {
        let h = hierarchy();
        assert!(h.graph.is_assignable_from(h.child, h.child)?);
        assert!(h.graph.is_assignable_from(h.other, h.other)?);
        Ok(())
    }

    #[test]
    fn test_direct_and_inherited_edges() -> Result<()> {
        let h = hierarchy();
        assert!(h.graph.is_assignable_from(h.child, h.parent)?);
        assert!(h.graph.is_assignable_from(h.child, h.interface)?);
        assert!(h.graph.is_assignable_from(h.child, h.mixin)?);
        assert!(h.graph.is_assignable_from(h.child, h.parents_interface)?);
        assert!(h.graph.is_assignable_from(h.child, h.parents_mixin)?);
        assert!(!h.graph.is_assignable_from(h.child, h.other)?);
        assert!(!h.graph.is_assignable_from(h.parent, h.child)?);
        Ok(())
    }

    #[test]
    fn test_results_are_memoized() -> Result<()> {
        let h = hierarchy();
        assert!(h.graph.is_assignable_from(h.child, h.parents_mixin)?);

        let cache = h.graph.descriptor(h.child).map(|d| d.reachability_cache());
        assert_eq!(cache.and_then(|c| c.lookup(h.parents_mixin, 0, Retention::Monotonic)), Some(true));
        Ok(())
    }

    #[test]
    fn test_negative_answer_recomputed_after_growth() -> Result<()> {
        let mut h = hierarchy();
        assert!(!h.graph.is_assignable_from(h.child, h.other)?);

        h.graph.mixin(h.child, Some(h.other))?;
        assert!(h.graph.is_assignable_from(h.child, h.other)?);
        Ok(())
    }

    #[test]
    fn test_rejects_bags_and_unknown_ids() {
        let mut h = hierarchy();
        let bag = h.graph.define_bag("Bag", MemberTable::new());

        let err = h.graph.is_assignable_from(bag, h.parent).unwrap_err();
        assert!(matches!(err, TrellisError::NotAClass { role: "Class", .. }));

        let err = h.graph.is_assignable_from(h.child, bag).unwrap_err();
        assert!(matches!(err, TrellisError::NotAClass { role: "Parent", .. }));
    }

    #[test]
    fn test_is_a() -> Result<()> {
        let h = hierarchy();
        let instance = h.graph.instantiate(h.child)?;

        assert!(!h.graph.is_a(None, h.child)?);
        assert!(h.graph.is_a(Some(&instance), h.child)?);
        assert!(h.graph.is_a(Some(&instance), h.interface)?);
        assert!(h.graph.is_a(Some(&instance), h.mixin)?);
        assert!(h.graph.is_a(Some(&instance), h.parent)?);
        assert!(h.graph.is_a(Some(&instance), h.parents_interface)?);
        assert!(h.graph.is_a(Some(&instance), h.parents_mixin)?);
        assert!(!h.graph.is_a(Some(&instance), h.other)?);
        Ok(())
    }

    #[test]
    fn test_is_a_rejects_bad_class_even_for_null_instance() {
        let mut h = hierarchy();
        let bag = h.graph.define_bag("Bag", MemberTable::new());
        let err = h.graph.is_a(None, bag).unwrap_err();
        assert!(matches!(err, TrellisError::NotAClass { operation: "isA", .. }));
    }
}
