//! Structural reflection over fulfillment subjects

use trellis_core::identity;
use trellis_core::prelude::*;

use crate::graph::{ClassDescriptor, ClassGraph, QueryCache};
use crate::instance::Instance;

/// Anything whose members can be checked against a protocol's shape
pub trait Reflect {
    /// Runtime category of the member `name`, if the subject has one
    fn category_of(&self, graph: &ClassGraph, name: &str) -> Option<Category>;

    /// Class the subject was constructed from, if any
    fn originating_class(&self) -> Option<DescriptorId>;

    /// Per-subject memo of structural answers, keyed by protocol
    fn fulfillment_cache(&self) -> &QueryCache;
}

impl Reflect for Instance {
    fn category_of(&self, graph: &ClassGraph, name: &str) -> Option<Category> {
        self.field(name)
            .or_else(|| graph.lookup_member(self.class(), name))
            .map(Value::category)
    }

    fn originating_class(&self) -> Option<DescriptorId> {
        Some(self.class())
    }

    fn fulfillment_cache(&self) -> &QueryCache {
        &self.fulfillment_cache
    }
}

/// A free-standing object: fields only, no class
#[derive(Debug, Clone, Default)]
pub struct PlainObject {
    fields: Fields,
    fulfillment_cache: QueryCache,
}

impl PlainObject {
    /// Create an object from a field table
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            fulfillment_cache: QueryCache::new(),
        }
    }

    /// Create an object from a JSON object literal
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `json` is not a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(Self::new(trellis_core::value::fields_from_json_map(map))),
            other => Err(TrellisError::serialization(format!(
                "expected a JSON object, found {other}"
            ))),
        }
    }

    /// Builder-style field assignment
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Read a field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Write a field; previously cached answers no longer apply
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(identity::intern(name), value.into());
        self.fulfillment_cache.clear();
    }

    /// All fields
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }
}

impl Reflect for PlainObject {
    fn category_of(&self, _graph: &ClassGraph, name: &str) -> Option<Category> {
        self.fields.get(name).map(Value::category)
    }

    fn originating_class(&self) -> Option<DescriptorId> {
        None
    }

    fn fulfillment_cache(&self) -> &QueryCache {
        &self.fulfillment_cache
    }
}

/// The shared member table of a class, seen as a subject
///
/// Caches on the descriptor itself so repeated `class_fulfills` calls share answers.
#[derive(Debug, Clone, Copy)]
pub struct Prototype<'g> {
    descriptor: &'g ClassDescriptor,
}

impl<'g> Prototype<'g> {
    pub(crate) fn new(descriptor: &'g ClassDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Reflect for Prototype<'_> {
    fn category_of(&self, graph: &ClassGraph, name: &str) -> Option<Category> {
        graph
            .lookup_member(self.descriptor.id(), name)
            .map(Value::category)
    }

    fn originating_class(&self) -> Option<DescriptorId> {
        self.descriptor.is_class().then(|| self.descriptor.id())
    }

    fn fulfillment_cache(&self) -> &QueryCache {
        &self.descriptor.fulfillment_cache
    }
}
