//! Protocol conformance
//!
//! Two flavours of conformance are supported:
//! - nominal: `implement` checks a class once, at declaration time, and
//!   records the protocol as an edge of the relationship graph
//! - structural: `fulfills` / `class_fulfills` compare member categories on
//!   demand and memoize the answer per subject

pub mod reflect;

use tracing::{debug, trace, warn};
use trellis_core::prelude::*;

use crate::graph::{ClassGraph, Retention};
pub use reflect::{PlainObject, Prototype, Reflect};

impl ClassGraph {
    /// Declare that `class` implements `protocol`
    ///
    /// Every member the protocol declares (own or inherited) must be present
    /// on the class with the same runtime category; every class-level member
    /// of the protocol must be present among the class's statics. Call this
    /// once the class's members are defined: the check is not repeated later.
    ///
    /// # Errors
    ///
    /// - `NotAClass` if either argument is not a class of this graph
    /// - `MissingMembers` listing every missing or mismatched member
    /// - `CompositionCycle` if `protocol` already derives from `class`
    pub fn implement(&mut self, class: DescriptorId, protocol: DescriptorId) -> Result<()> {
        let class_descriptor = self.require_class(class, "Class", "implement")?;
        let protocol_descriptor = self.require_class(protocol, "Protocol", "implement")?;

        if class == protocol || class_descriptor.implemented_protocols.contains(&protocol) {
            return Ok(());
        }

        let mut missing: Vec<String> = self
            .resolved_members(protocol)
            .iter()
            .filter(|(name, required)| {
                self.lookup_member(class, name).map(Value::category) != Some(required.category())
            })
            .map(|(name, _)| name.to_string())
            .collect();
        missing.extend(
            protocol_descriptor
                .statics
                .iter()
                .filter(|(name, required)| {
                    class_descriptor.statics.get(*name).map(Value::category)
                        != Some(required.category())
                })
                .map(|(name, _)| format!("{name} (class method)")),
        );

        if !missing.is_empty() {
            warn!(
                "{} does not implement {}: missing {:?}",
                class_descriptor.name(),
                protocol_descriptor.name(),
                missing
            );
            return Err(TrellisError::missing_members(
                class_descriptor.name(),
                missing,
                protocol_descriptor.name(),
            ));
        }
        if self.reaches(protocol, class) {
            warn!(
                "Rejected implement: {} already derives from {}",
                protocol_descriptor.name(),
                class_descriptor.name()
            );
            return Err(TrellisError::cycle(
                class_descriptor.name(),
                protocol_descriptor.name(),
            ));
        }

        debug!(
            "{} implements {}",
            class_descriptor.name(),
            protocol_descriptor.name()
        );
        self.descriptor_mut(class)?.implemented_protocols.push(protocol);
        self.bump_generation();
        Ok(())
    }

    /// Whether `subject` structurally fulfills `protocol`
    ///
    /// Subjects constructed from a class that nominally derives from the
    /// protocol pass immediately. Otherwise the protocol's members are checked
    /// in declaration order and the first mismatch answers `false`. Sentinel
    /// requirements (`Value::Sentinel`) match any value of their category.
    ///
    /// An absent subject fulfills nothing.
    ///
    /// # Errors
    ///
    /// - `NullArgument` if `protocol` is absent
    /// - `NotAClass` if `protocol` is not registered in this graph
    pub fn fulfills(&self, subject: Option<&dyn Reflect>, protocol: Option<DescriptorId>) -> Result<bool> {
        let protocol = protocol.ok_or_else(|| TrellisError::null_argument("Protocol", "fulfills"))?;
        self.require_known(protocol, "Protocol", "fulfills")?;
        let Some(subject) = subject else {
            return Ok(false);
        };
        Ok(self.check_fulfills(subject, protocol))
    }

    /// Whether instances of `class` would fulfill `protocol` through the class's own members
    ///
    /// # Errors
    ///
    /// - `NullArgument` if `protocol` is absent
    /// - `NotAClass` if `class` is not a class, or `protocol` is unknown
    pub fn class_fulfills(&self, class: DescriptorId, protocol: Option<DescriptorId>) -> Result<bool> {
        let descriptor = self.require_class(class, "Class", "classFulfills")?;
        let protocol =
            protocol.ok_or_else(|| TrellisError::null_argument("Protocol", "classFulfills"))?;
        self.require_known(protocol, "Protocol", "classFulfills")?;
        Ok(self.check_fulfills(&Prototype::new(descriptor), protocol))
    }

    fn check_fulfills(&self, subject: &dyn Reflect, protocol: DescriptorId) -> bool {
        let memoize = self.config().cache.memoize_fulfillment;
        let generation = self.generation();
        let cache = subject.fulfillment_cache();
        if memoize && let Some(hit) = cache.lookup(protocol, generation, Retention::Generation) {
            trace!("Fulfillment cache hit for {protocol}: {hit}");
            return hit;
        }

        let result = self.structural_match(subject, protocol);
        if memoize {
            cache.record(protocol, result, generation);
        }
        result
    }

    fn structural_match(&self, subject: &dyn Reflect, protocol: DescriptorId) -> bool {
        let nominal = self.descriptor(protocol).is_some_and(|d| d.is_class())
            && subject
                .originating_class()
                .is_some_and(|class| self.reaches(class, protocol));
        if nominal {
            return true;
        }

        for (name, required) in self.resolved_members(protocol) {
            if subject.category_of(self, &name) != Some(required.category()) {
                trace!("Subject fails {protocol} at '{name}'");
                return false;
            }
        }
        true
    }
}
