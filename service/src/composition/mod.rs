//! Composition engine
//!
//! This module provides the three ways of building a class out of others:
//! - `extend`: single extension with delegation to the parent
//! - `mixin`: sandboxed mixins that keep their own per-instance state
//! - `multi_inherit`: diamond-safe multiple inheritance by copy (see [`merge`])
//!
//! Every operation validates its whole plan before touching the target, so a
//! rejected composition leaves the member table exactly as it was.

pub mod merge;

use std::sync::Arc;

use tracing::{debug, trace, warn};
use trellis_core::prelude::*;

use crate::graph::ClassGraph;

impl ClassGraph {
    /// Make `child` extend `parent`
    ///
    /// The child must be clean: no own members and no existing parent. The
    /// parent's own class-level members are copied onto the child; instance
    /// members stay on the parent and are found by delegation.
    ///
    /// # Errors
    ///
    /// - `NotAClass` if either argument is not a class of this graph
    /// - `DirtyTarget` if the child already has members or a parent
    /// - `CompositionCycle` if `parent` already derives from `child`
    pub fn extend(&mut self, child: DescriptorId, parent: DescriptorId) -> Result<()> {
        let child_descriptor = self.require_class(child, "Subclass", "extend")?;
        let parent_descriptor = self.require_class(parent, "Superclass", "extend")?;

        if let Some(member) = child_descriptor.members.keys().next() {
            return Err(TrellisError::dirty_target(
                member.to_string(),
                child_descriptor.name(),
            ));
        }
        if let Some(existing) = child_descriptor.extension_parent {
            return Err(TrellisError::dirty_target(
                format!("superclass {}", self.display_name(existing)),
                child_descriptor.name(),
            ));
        }
        if self.reaches(parent, child) {
            warn!(
                "Rejected extend: {} already derives from {}",
                parent_descriptor.name(),
                child_descriptor.name()
            );
            return Err(TrellisError::cycle(
                child_descriptor.name(),
                parent_descriptor.name(),
            ));
        }

        let statics: Vec<(Arc<str>, Value)> = parent_descriptor
            .statics
            .iter()
            .map(|(name, value)| (Arc::clone(name), value.clone()))
            .collect();

        debug!(
            "{} extends {} ({} static members copied)",
            child_descriptor.name(),
            parent_descriptor.name(),
            statics.len()
        );

        let child_descriptor = self.descriptor_mut(child)?;
        child_descriptor.statics.extend(statics);
        child_descriptor.extension_parent = Some(parent);
        self.bump_generation();
        Ok(())
    }

    /// Mix the behaviors of `source` into `target`, sandboxed
    ///
    /// Each behavior of the source that the target lacks is installed as a
    /// wrapper that runs against a private receiver owned by the instance, so
    /// mixin state never touches the host's fields. Data members are not
    /// mixed in. Mixing in a source twice is a no-op.
    ///
    /// # Errors
    ///
    /// - `NotAClass` if `target` is not a class, or `source` is unknown
    /// - `NullArgument` if `source` is absent
    /// - `PropertyConflict` if the target already has an unrelated member of the same name
    /// - `CompositionCycle` if `source` already derives from `target`
    pub fn mixin(&mut self, target: DescriptorId, source: Option<DescriptorId>) -> Result<()> {
        let target_descriptor = self.require_class(target, "Target", "mixin")?;
        let source = source.ok_or_else(|| TrellisError::null_argument("Mix", "mixin"))?;
        let source_descriptor = self.require_known(source, "Mix", "mixin")?;

        if target_descriptor.composition_sources.contains(&source) {
            trace!(
                "{} already mixed into {}",
                source_descriptor.name(),
                target_descriptor.name()
            );
            return Ok(());
        }
        if self.reaches(source, target) {
            warn!(
                "Rejected mixin: {} already derives from {}",
                source_descriptor.name(),
                target_descriptor.name()
            );
            return Err(TrellisError::cycle(
                target_descriptor.name(),
                source_descriptor.name(),
            ));
        }

        let mut planned: Vec<(Arc<str>, Behavior)> = Vec::new();
        for (name, value) in self.resolved_members(source) {
            let Value::Behavior(original) = value else {
                continue;
            };
            match self.lookup_member(target, &name) {
                None => planned.push((name, original)),
                Some(Value::Behavior(existing)) if existing.root().id() == original.root().id() => {}
                Some(_) => {
                    warn!(
                        "Rejected mixin of {} into {}: '{name}' already present",
                        source_descriptor.name(),
                        target_descriptor.name()
                    );
                    return Err(TrellisError::conflict(
                        name.to_string(),
                        source_descriptor.name(),
                        target_descriptor.name(),
                    ));
                }
            }
        }

        let slot = self.allocate_slot();
        debug!(
            "Mixing {} into {} at sandbox slot {slot} ({} behaviors)",
            self.display_name(source),
            self.display_name(target),
            planned.len()
        );

        let target_descriptor = self.descriptor_mut(target)?;
        for (name, original) in planned {
            target_descriptor.members.insert(
                name,
                Value::Behavior(Behavior::sandboxed(slot, source, original)),
            );
        }
        target_descriptor.composition_sources.push(source);
        self.bump_generation();
        Ok(())
    }
}
