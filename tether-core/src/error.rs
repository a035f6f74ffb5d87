//! Error types shared across the crate.

use thiserror::Error;

use crate::dom::NodeId;

/// Result alias used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors produced by the path accessor, the store and the document model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The path string was empty.
    #[error("invalid argument: path must be a non-empty string")]
    EmptyPath,

    /// The path contained an empty segment (`a..b`, `.a`, `a.`).
    #[error("invalid argument: path `{0}` contains an empty segment")]
    EmptySegment(String),

    /// The value used as a root was not a composite.
    #[error("invalid argument: root must be a composite value, found {0}")]
    NotComposite(&'static str),

    /// The node id does not belong to the document.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The operation requires an element but the node is not one.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// Inserting the node would create a cycle or move the document root.
    #[error("cannot insert node {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// The node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Initial state could not be parsed.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The binding configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BindError {
    /// Whether this error is one of the invalid-argument conditions raised
    /// at the path accessor boundary.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            BindError::EmptyPath | BindError::EmptySegment(_) | BindError::NotComposite(_)
        )
    }
}
