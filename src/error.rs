//! Error types for topology conversion.
//!
//! Configuration errors abort the resource being visited and propagate to the
//! driver. Unresolvable references are not errors at all: the identifier
//! normalizer logs them and hands back a best-effort identifier.

/// Errors raised while turning a resource occurrence into topology records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("{direction} rule of security group {group} must have either cidr_blocks or security_groups")]
    MalformedRule { group: String, direction: String },

    #[error("Invalid CIDR block '{value}': {reason}")]
    InvalidCidr { value: String, reason: String },

    #[error("Invalid count '{value}' for resource {resource}")]
    InvalidCount { resource: String, value: String },

    #[error("Attribute '{attribute}' of {resource} must be {expected}")]
    InvalidAttribute {
        resource: String,
        attribute: String,
        expected: String,
    },

    #[error("Failed to serialize topology: {0}")]
    Serialization(String),
}

impl TopologyError {
    /// Returns true for errors caused by the input configuration rather than
    /// by a broken internal invariant
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, Self::Serialization(_))
    }
}

pub type TopologyResult<T> = Result<T, TopologyError>;
