//! Error types for tree operations.

use crate::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node is not an element: {0}")]
    NotAnElement(NodeId),

    #[error("node is not a text node: {0}")]
    NotText(NodeId),

    #[error("node has no parent: {0}")]
    NotAttached(NodeId),

    #[error("would create cycle")]
    CycleDetected,

    #[error("cannot reparent the document root")]
    CannotMoveRoot,

    #[error("change observation is not supported by this document")]
    ObservationUnsupported,
}
