//! Node identity and node payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node within one [`Document`](crate::Document) arena.
///
/// Ids are never reused; a detached node keeps its id and can be reinserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Payload of a node: an element with attributes, or a text node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        tag: String,
        /// Attribute pairs in set order.
        attributes: Vec<(String, String)>,
    },
    Text {
        text: String,
    },
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                text: text.to_string(),
            },
            parent: None,
            children: Vec::new(),
        }
    }
}
