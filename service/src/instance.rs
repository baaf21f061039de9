//! Instances and behavior invocation

use tracing::trace;
use trellis_core::identity;
use trellis_core::prelude::*;

use crate::graph::{ClassGraph, QueryCache};
use crate::sandbox::SandboxBucket;

/// An object constructed from a class of a [`ClassGraph`]
///
/// Fields hold the instance's own state. Members not found among the fields
/// are resolved through the class. Sandboxed mixins keep their state in the
/// instance's sandbox bucket, never in its fields.
#[derive(Debug, Clone)]
pub struct Instance {
    class: DescriptorId,
    fields: Fields,
    sandbox: SandboxBucket,
    pub(crate) fulfillment_cache: QueryCache,
}

impl Instance {
    fn new(class: DescriptorId, fields: Fields) -> Self {
        Self {
            class,
            fields,
            sandbox: SandboxBucket::new(),
            fulfillment_cache: QueryCache::new(),
        }
    }

    /// Descriptor this instance was constructed from
    #[must_use]
    pub fn class(&self) -> DescriptorId {
        self.class
    }

    /// Own fields
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Read an own field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write an own field
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(identity::intern(name), value.into());
        self.fulfillment_cache.clear();
    }

    /// Private mixin receivers
    #[must_use]
    pub fn sandbox(&self) -> &SandboxBucket {
        &self.sandbox
    }
}

impl ClassGraph {
    /// Construct an instance of `class`
    ///
    /// Data members visible on the class seed the instance's fields, then the
    /// class's initializer runs.
    ///
    /// # Errors
    ///
    /// Returns `NotAClass` if `class` is not a class of this graph.
    pub fn instantiate(&self, class: DescriptorId) -> Result<Instance> {
        self.require_class(class, "Class", "instantiate")?;
        self.build_receiver(class)
    }

    /// Build a receiver for any descriptor kind
    ///
    /// Sandboxed mixins use this to give bags a private receiver as well.
    pub(crate) fn build_receiver(&self, id: DescriptorId) -> Result<Instance> {
        let descriptor = self.require_known(id, "Class", "instantiate")?;
        let mut fields: Fields = self
            .resolved_members(id)
            .into_iter()
            .filter(|(_, value)| !value.is_behavior())
            .collect();
        if let Some(initializer) = &descriptor.initializer {
            initializer(&mut fields);
        }
        trace!("Built receiver for {} with {} fields", descriptor.name(), fields.len());
        Ok(Instance::new(id, fields))
    }

    /// Call the behavior `name` on `instance`
    ///
    /// An own field shadows the class's member of the same name.
    ///
    /// # Errors
    ///
    /// - `MemberNotFound` if neither the instance nor its class has the member
    /// - `NotCallable` if the member is not a behavior
    /// - any error raised while creating a sandbox receiver
    pub fn invoke(&self, instance: &mut Instance, name: &str, args: &[Value]) -> Result<Value> {
        let member = instance
            .fields
            .get(name)
            .or_else(|| self.lookup_member(instance.class, name))
            .cloned()
            .ok_or_else(|| TrellisError::member_not_found(name, self.display_name(instance.class)))?;
        let Value::Behavior(behavior) = member else {
            return Err(TrellisError::not_callable(
                name,
                self.display_name(instance.class),
                member.category().to_string(),
            ));
        };

        let result = self.call(&behavior, &mut instance.fields, &mut instance.sandbox, args);
        instance.fulfillment_cache.clear();
        result
    }

    fn call(
        &self,
        behavior: &Behavior,
        receiver: &mut Fields,
        sandbox: &mut SandboxBucket,
        args: &[Value],
    ) -> Result<Value> {
        match behavior.kind() {
            BehaviorKind::Native(body) => Ok(body(receiver, args)),
            BehaviorKind::Sandboxed(binding) => {
                let private =
                    sandbox.get_or_create(binding.slot, || self.build_receiver(binding.source))?;
                self.call(&binding.original, &mut private.fields, &mut private.sandbox, args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_core::value::member_table;

    fn counter_bag(graph: &mut ClassGraph, name: &str) -> DescriptorId {
        graph.define_bag(
            name,
            member_table([
                ("count", Value::from(0)),
                (
                    "increment",
                    Value::from(Behavior::native(|state, _| {
                        let next = state.get("count").and_then(Value::as_number).unwrap_or(0.0) + 1.0;
                        state.insert(identity::intern("count"), Value::from(next));
                        Value::from(next)
                    })),
                ),
            ]),
        )
    }

    #[test]
    fn test_instantiate_seeds_data_and_runs_initializer() -> Result<()> {
        let mut graph = ClassGraph::new();
        let animal = graph.define_class("Animal");
        graph.define_member(animal, "legs", 4)?;
        graph.set_initializer(animal, |fields| {
            fields.insert(identity::intern("name"), Value::from("rex"));
        })?;

        let instance = graph.instantiate(animal)?;
        assert_eq!(instance.class(), animal);
        assert_eq!(instance.field("legs"), Some(&Value::from(4)));
        assert_eq!(instance.field("name"), Some(&Value::from("rex")));
        Ok(())
    }

    #[test]
    fn test_instantiate_rejects_bags() {
        let mut graph = ClassGraph::new();
        let bag = graph.define_bag("Bag", MemberTable::new());
        let err = graph.instantiate(bag).unwrap_err();
        assert!(matches!(err, TrellisError::NotAClass { operation: "instantiate", .. }));
    }

    #[test]
    fn test_invoke_native_behavior_mutates_fields() -> Result<()> {
        let mut graph = ClassGraph::new();
        let counter = graph.define_class("Counter");
        graph.define_member(counter, "count", 0)?;
        let bag = counter_bag(&mut graph, "Counting");
        let increment = graph
            .descriptor(bag)
            .and_then(|bag| bag.members().get("increment").cloned())
            .expect("bag has increment");
        graph.define_member(counter, "increment", increment)?;

        let mut instance = graph.instantiate(counter)?;
        graph.invoke(&mut instance, "increment", &[])?;
        let result = graph.invoke(&mut instance, "increment", &[])?;

        assert_eq!(result, Value::from(2));
        assert_eq!(instance.field("count"), Some(&Value::from(2)));
        Ok(())
    }

    #[test]
    fn test_sandboxed_mixin_keeps_private_state() -> Result<()> {
        let mut graph = ClassGraph::new();
        let host = graph.define_class("Host");
        graph.define_member(host, "count", "host-owned")?;
        let counting = counter_bag(&mut graph, "Counting");
        graph.mixin(host, Some(counting))?;

        let mut first = graph.instantiate(host)?;
        let mut second = graph.instantiate(host)?;
        graph.invoke(&mut first, "increment", &[])?;
        graph.invoke(&mut first, "increment", &[])?;
        let second_result = graph.invoke(&mut second, "increment", &[])?;

        assert_eq!(first.field("count"), Some(&Value::from("host-owned")));
        assert_eq!(second_result, Value::from(1));
        assert_eq!(first.sandbox().occupied(), 1);
        let private = first.sandbox().get(0).map(|receiver| receiver.field("count").cloned());
        assert_eq!(private, Some(Some(Value::from(2))));
        Ok(())
    }

    #[test]
    fn test_invoke_errors() -> Result<()> {
        let mut graph = ClassGraph::new();
        let class = graph.define_class("Thing");
        graph.define_member(class, "size", 3)?;
        let mut instance = graph.instantiate(class)?;

        let err = graph.invoke(&mut instance, "missing", &[]).unwrap_err();
        assert!(matches!(err, TrellisError::MemberNotFound { .. }));
        let err = graph.invoke(&mut instance, "size", &[]).unwrap_err();
        assert!(matches!(err, TrellisError::NotCallable { ref category, .. } if category == "number"));
        Ok(())
    }
}
