//! Relationship graph
//!
//! This module provides the arena that owns every class and member bag:
//! - Descriptors with their member tables and relationship edges
//! - Append-only query caches stamped with the graph generation

pub mod cache;
pub mod descriptor;
pub mod store;

pub use cache::{CacheEntry, QueryCache, Retention};
pub use descriptor::{ClassDescriptor, DescriptorKind, Initializer};
pub use store::{ClassGraph, Parents};
