//! Error types for composition and relationship queries

use thiserror::Error;

/// Main error type for trellis operations
///
/// All failures are raised synchronously to the immediate caller. Failed
/// compositions leave the target's member table untouched.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// An argument expected to be a constructible class descriptor was not
    #[error("{role} definition for {operation} must be a constructor, was {found}.")]
    NotAClass {
        /// Which argument was wrong ("Target", "Parent", "Protocol", ...)
        role: &'static str,
        /// Operation that rejected it
        operation: &'static str,
        /// What was found instead
        found: String,
    },

    /// A required argument was absent
    #[error("{role} for {operation} must not be null or undefined.")]
    NullArgument {
        /// Which argument was absent
        role: &'static str,
        /// Operation that rejected it
        operation: &'static str,
    },

    /// Extension attempted on a class that already has members or a parent
    #[error(
        "Prototype must be clean to extend another class. {member} has already been defined on the prototype of {class}."
    )]
    DirtyTarget {
        /// First offending member (or the existing parent)
        member: String,
        /// Class that was not clean
        class: String,
    },

    /// Composition would silently overwrite an unrelated implementation
    #[error("Could not copy {member} from {source_name} to {target} as it was already present.")]
    PropertyConflict {
        /// Conflicting member name
        member: String,
        /// Display name of the composition source
        source_name: String,
        /// Display name of the target class
        target: String,
    },

    /// Nominal protocol declaration rejected
    #[error("Class {class} does not implement the attributes '{}' from protocol {protocol}.", .members.join("', '"))]
    MissingMembers {
        /// Class that was checked
        class: String,
        /// Every missing or mismatched member, in protocol order
        members: Vec<String>,
        /// Display name of the protocol
        protocol: String,
    },

    /// Composition would make the relationship graph cyclic
    #[error("Cannot compose {source_name} into {target}: {source_name} already derives from {target}.")]
    CompositionCycle {
        /// Display name of the target class
        target: String,
        /// Display name of the composition source
        source_name: String,
    },

    /// Invocation of a member that does not exist
    #[error("{class} has no member '{member}'.")]
    MemberNotFound {
        /// Member name
        member: String,
        /// Display name of the receiver's class
        class: String,
    },

    /// Invocation of a data member
    #[error("Member '{member}' of {class} is a {category}, not a function.")]
    NotCallable {
        /// Member name
        member: String,
        /// Display name of the receiver's class
        class: String,
        /// Runtime category of the member
        category: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type alias for trellis operations
pub type Result<T> = std::result::Result<T, TrellisError>;

impl TrellisError {
    /// Create a not-a-class error
    #[must_use]
    pub fn not_a_class(role: &'static str, operation: &'static str, found: impl Into<String>) -> Self {
        Self::NotAClass {
            role,
            operation,
            found: found.into(),
        }
    }

    /// Create a null-argument error
    #[must_use]
    pub fn null_argument(role: &'static str, operation: &'static str) -> Self {
        Self::NullArgument { role, operation }
    }

    /// Create a dirty-target error
    #[must_use]
    pub fn dirty_target(member: impl Into<String>, class: impl Into<String>) -> Self {
        Self::DirtyTarget {
            member: member.into(),
            class: class.into(),
        }
    }

    /// Create a property conflict error
    #[must_use]
    pub fn conflict(
        member: impl Into<String>,
        source_name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::PropertyConflict {
            member: member.into(),
            source_name: source_name.into(),
            target: target.into(),
        }
    }

    /// Create a missing-members error
    #[must_use]
    pub fn missing_members(
        class: impl Into<String>,
        members: Vec<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self::MissingMembers {
            class: class.into(),
            members,
            protocol: protocol.into(),
        }
    }

    /// Create a composition cycle error
    #[must_use]
    pub fn cycle(target: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::CompositionCycle {
            target: target.into(),
            source_name: source_name.into(),
        }
    }

    /// Create a member-not-found error
    #[must_use]
    pub fn member_not_found(member: impl Into<String>, class: impl Into<String>) -> Self {
        Self::MemberNotFound {
            member: member.into(),
            class: class.into(),
        }
    }

    /// Create a not-callable error
    #[must_use]
    pub fn not_callable(
        member: impl Into<String>,
        class: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self::NotCallable {
            member: member.into(),
            class: class.into(),
            category: category.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError(message.into())
    }

    /// Whether this error left the composition target untouched by contract
    #[must_use]
    pub fn is_composition_rejection(&self) -> bool {
        matches!(
            self,
            Self::DirtyTarget { .. }
                | Self::PropertyConflict { .. }
                | Self::MissingMembers { .. }
                | Self::CompositionCycle { .. }
        )
    }
}

impl From<serde_yaml::Error> for TrellisError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for TrellisError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = TrellisError::conflict("f", "Source", "Target");
        assert!(matches!(err, TrellisError::PropertyConflict { .. }));
        assert!(err.is_composition_rejection());

        let err = TrellisError::null_argument("Mix", "mixin");
        assert!(!err.is_composition_rejection());
    }

    #[test]
    fn test_error_display() {
        let err = TrellisError::conflict("clashingThingy", "parent", "target");
        assert_eq!(
            err.to_string(),
            "Could not copy clashingThingy from parent to target as it was already present."
        );

        let err = TrellisError::missing_members(
            "Class",
            vec!["interfaceMethod".into(), "anotherInterfaceMethod".into()],
            "Interface",
        );
        assert_eq!(
            err.to_string(),
            "Class Class does not implement the attributes 'interfaceMethod', 'anotherInterfaceMethod' from protocol Interface."
        );

        let err = TrellisError::not_a_class("Target", "inherit", "a member bag");
        assert_eq!(
            err.to_string(),
            "Target definition for inherit must be a constructor, was a member bag."
        );

        let err = TrellisError::null_argument("Parent", "inherit");
        assert_eq!(err.to_string(), "Parent for inherit must not be null or undefined.");
    }

    #[test]
    fn test_error_conversions() {
        let yaml_err = serde_yaml::from_str::<Vec<u8>>(": : :").unwrap_err();
        let err: TrellisError = yaml_err.into();
        assert!(matches!(err, TrellisError::SerializationError(_)));
    }
}
