//! Error types for the component tree.

use thiserror::Error;

use crate::types::MonitorKey;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Why a container refused to accept a child.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    /// The would-be parent is not a container.
    #[error("'{parent}' is not a container")]
    NotAContainer { parent: String },

    /// Accepting the child would make it its own ancestor.
    #[error("adding '{child}' to '{parent}' would create a cycle")]
    WouldCycle { parent: String, child: String },

    /// A sibling already carries this name.
    #[error("'{parent}' already has a child named '{name}'")]
    DuplicateName { parent: String, name: String },

    /// Children must be named.
    #[error("cannot add an anonymous component to '{parent}'")]
    Anonymous { parent: String },
}

/// Structured error type for the component tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A lookup that required a result found no qualifying ancestor.
    #[error("component '{name}' is not attached to a {key} ancestor")]
    NotAttached { name: String, key: MonitorKey },

    /// Attach attempted on a component that already has a parent.
    #[error("component '{name}' already has a parent")]
    AlreadyHasParent { name: String },

    /// The container refused the child.
    #[error(transparent)]
    Refused(#[from] Refusal),

    /// Components cannot be serialized or deserialized.
    #[error("{operation} of a component is not supported")]
    NotSupported { operation: String },

    /// Index is not an allocated component.
    #[error("no component at index {index}")]
    UnknownComponent { index: usize },

    /// Configuration text could not be parsed.
    #[error("invalid tree configuration: {0}")]
    Config(String),
}

impl TreeError {
    /// Create a not-attached error.
    pub fn not_attached(name: impl Into<String>, key: MonitorKey) -> Self {
        Self::NotAttached {
            name: name.into(),
            key,
        }
    }

    /// Create a not-supported error for the given operation.
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }
}
