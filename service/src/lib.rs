//! # Trellis Service
//!
//! Runtime class-relationship engine: compose classes out of other classes
//! and member bags, then ask how they relate.
//!
//! ## Overview
//!
//! A [`ClassGraph`] owns every class of one hierarchy and offers:
//!
//! - **Extension**: single inheritance with delegation to the parent
//! - **Sandboxed mixins**: behaviors copied in, state kept per instance and per mixin
//! - **Multiple inheritance**: diamond-safe member merging with override detection
//! - **Nominal protocols**: `implement` checks a class once and records the edge
//! - **Structural protocols**: `fulfills` checks any object's shape on demand
//! - **Assignability**: memoized reachability over every relationship edge
//!
//! ## Quick Start
//!
//! ```rust
//! use trellis_service::prelude::*;
//! use trellis_core::value::member_table;
//!
//! fn main() -> Result<()> {
//!     let mut graph = ClassGraph::new();
//!
//!     let animal = graph.define_class("Animal");
//!     graph.define_member(animal, "legs", 4)?;
//!
//!     let dog = graph.define_class("Dog");
//!     graph.extend(dog, animal)?;
//!     graph.define_member(dog, "bark", Behavior::native(|_, _| Value::from("woof")))?;
//!
//!     let pet = graph.define_protocol("Pet", member_table([("bark", Category::Behavior)]));
//!     graph.implement(dog, pet)?;
//!
//!     let mut rex = graph.instantiate(dog)?;
//!     assert_eq!(graph.invoke(&mut rex, "bark", &[])?, Value::from("woof"));
//!     assert!(graph.is_a(Some(&rex), animal)?);
//!     assert!(graph.is_a(Some(&rex), pet)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Composition operations validate their whole plan before mutating
//! anything. A rejected `extend`, `mixin`, `multi_inherit` or `implement`
//! leaves the target exactly as it was.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)] // subjective determination
#![allow(clippy::missing_panics_doc)] // panics only in tests

/// Relationship graph, descriptors and query caches
pub mod graph;

/// Extension, sandboxed mixins and multiple inheritance
pub mod composition;

/// Assignability queries
pub mod assignability;

/// Nominal and structural protocol conformance
pub mod conformance;

/// Instances and behavior invocation
pub mod instance;

/// Per-instance mixin receivers
pub mod sandbox;

/// Tracing subscriber setup
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude;

pub use conformance::{PlainObject, Prototype, Reflect};
pub use graph::{ClassDescriptor, ClassGraph, DescriptorKind};
pub use instance::Instance;
pub use sandbox::SandboxBucket;
pub use trellis_core::prelude::*;
