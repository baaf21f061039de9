//! Diamond-safe multiple inheritance by copy
//!
//! `multi_inherit` folds a source's whole lineage (the source, its extension
//! ancestors and every composition source, transitively) into the target in
//! one call. Descriptors the target already derives from are skipped, so a
//! diamond contributes each ancestor once. Name collisions are resolved by
//! the override test: a version that was redefined on top of another one
//! wins over it; anything else is a conflict and nothing is applied.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use trellis_core::prelude::*;

use crate::graph::ClassGraph;

/// A member chosen for the target during planning
#[derive(Debug, Clone)]
struct Staged {
    value: Value,
    provider: DescriptorId,
}

impl ClassGraph {
    /// Copy every member of `source` and its lineage into `target`
    ///
    /// Idempotent: if `target` already derives from `source` nothing happens.
    /// The merge is atomic: either every member is applied or none is.
    ///
    /// # Errors
    ///
    /// - `NotAClass` if `target` is not a class, or `source` is unknown
    /// - `NullArgument` if `source` is absent
    /// - `PropertyConflict` on a collision with no override relationship
    /// - `CompositionCycle` if `source` already derives from `target`
    pub fn multi_inherit(&mut self, target: DescriptorId, source: Option<DescriptorId>) -> Result<()> {
        self.require_class(target, "Target", "inherit")?;
        let source = source.ok_or_else(|| TrellisError::null_argument("Parent", "inherit"))?;
        self.require_known(source, "Parent", "inherit")?;

        if self.reaches(target, source) {
            trace!(
                "{} already derives from {}",
                self.display_name(target),
                self.display_name(source)
            );
            return Ok(());
        }
        if self.reaches(source, target) {
            warn!(
                "Rejected inherit: {} already derives from {}",
                self.display_name(source),
                self.display_name(target)
            );
            return Err(TrellisError::cycle(
                self.display_name(target),
                self.display_name(source),
            ));
        }

        let staged = self.plan_merge(target, source)?;
        debug!(
            "{} inherits {} ({} members copied)",
            self.display_name(target),
            self.display_name(source),
            staged.len()
        );

        let target_descriptor = self.descriptor_mut(target)?;
        for (name, staged) in staged {
            target_descriptor.members.insert(name, staged.value);
        }
        target_descriptor.composition_sources.push(source);
        self.bump_generation();
        Ok(())
    }

    /// Whether `sub`'s version of `name` was redefined on top of `ancestor_value`
    ///
    /// Walks `sub`'s immediate parents (extension parent and composition
    /// sources) recursively, looking for one that still carries
    /// `ancestor_value`. Terminates on a match or when the ancestry is
    /// exhausted; each ancestor is visited once.
    #[must_use]
    pub fn is_overrider_of(&self, name: &str, sub: DescriptorId, ancestor_value: &Value) -> bool {
        match self.lookup_member(sub, name) {
            Some(current) if !current.same_as(ancestor_value) => {}
            _ => return false,
        }

        let mut seen = HashSet::new();
        let mut stack: Vec<DescriptorId> = self.immediate_parents(sub).into_vec();
        while let Some(parent) = stack.pop() {
            if !seen.insert(parent) {
                continue;
            }
            if self
                .lookup_member(parent, name)
                .is_some_and(|value| value.same_as(ancestor_value))
            {
                return true;
            }
            stack.extend(self.immediate_parents(parent));
        }
        false
    }

    /// Decide, without mutating anything, which members `source` contributes
    fn plan_merge(
        &self,
        target: DescriptorId,
        source: DescriptorId,
    ) -> Result<IndexMap<Arc<str>, Staged>> {
        let mut staged: IndexMap<Arc<str>, Staged> = IndexMap::new();

        for node in self.merge_lineage(target, source) {
            let Some(descriptor) = self.descriptor(node) else {
                continue;
            };
            for (name, value) in descriptor.members() {
                let current = staged
                    .get(name)
                    .map(|s| (s.value.clone(), s.provider))
                    .or_else(|| self.lookup_member(target, name).map(|v| (v.clone(), target)));

                match current {
                    None => {
                        staged.insert(
                            Arc::clone(name),
                            Staged {
                                value: value.clone(),
                                provider: node,
                            },
                        );
                    }
                    // Sandboxed wrappers count as their original; the installed one stays
                    Some((current, _)) if current.same_as(value) => {}
                    Some((_, provider)) if self.is_overrider_of(name, provider, value) => {
                        trace!(
                            "Keeping {}'s override of '{name}' over {}",
                            self.display_name(provider),
                            descriptor.name()
                        );
                    }
                    Some((current, _)) if self.is_overrider_of(name, node, &current) => {
                        trace!("{} overrides '{name}'", descriptor.name());
                        staged.insert(
                            Arc::clone(name),
                            Staged {
                                value: value.clone(),
                                provider: node,
                            },
                        );
                    }
                    Some(_) => {
                        warn!(
                            "Rejected inherit of {} into {}: '{name}' already present",
                            self.display_name(source),
                            self.display_name(target)
                        );
                        return Err(TrellisError::conflict(
                            name.to_string(),
                            self.display_name(source),
                            self.display_name(target),
                        ));
                    }
                }
            }
        }

        Ok(staged)
    }

    /// The source's lineage minus everything the target already derives from
    fn merge_lineage(&self, target: DescriptorId, source: DescriptorId) -> Vec<DescriptorId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![source];
        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            if self.reaches(target, node) {
                // Already folded in, together with everything above it
                continue;
            }
            order.push(node);
            stack.extend(self.immediate_parents(node).into_iter().rev());
        }
        order
    }
}
