//! # Trellis Core
//!
//! Core types for the trellis class-relationship engine.
//!
//! This crate provides the building blocks shared by the engine and its
//! callers: stable identities for descriptors and behaviors, the runtime value
//! model the engine reflects on, the error taxonomy, and configuration.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error types for composition and queries
pub mod error;

/// Stable identifiers and member-name interning
pub mod identity;

/// Runtime values, categories and behaviors
pub mod value;

/// Configuration types
pub mod config;

pub use config::{CacheConfig, LoggingConfig, TrellisConfig};
pub use error::{Result, TrellisError};
pub use identity::{BehaviorId, DescriptorId};
pub use value::{Behavior, BehaviorKind, Category, Fields, MemberTable, SandboxBinding, Value};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{Result, TrellisError};
    pub use crate::identity::{BehaviorId, DescriptorId};
    pub use crate::value::*;
}
