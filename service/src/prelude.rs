//! Prelude module for the trellis engine
//!
//! This module re-exports commonly used types for convenient import.

// Re-export core types
pub use trellis_core::prelude::*;

// Re-export the graph and its subjects
pub use crate::conformance::{PlainObject, Reflect};
pub use crate::graph::{ClassGraph, DescriptorKind};
pub use crate::instance::Instance;
