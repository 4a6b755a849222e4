//! # Document
//!
//! Arena-backed mutable document tree.
//!
//! A Document owns every node it ever created. Structural mutation keeps
//! parent/child links consistent and validates before applying:
//!
//! - inserting a node under its own descendant is rejected (cycle)
//! - the root can never be reparented or removed
//! - attribute/text operations check the node kind first
//!
//! While an observation root is set (see [`observe`](Document::observe)),
//! every mutation whose target lies inside that root's subtree queues a
//! [`MutationRecord`](crate::MutationRecord) carrying the pre-mutation value.

use crate::errors::DomError;
use crate::node::{NodeData, NodeId, NodeKind};
use crate::observer::{MutationRecord, ObservationState, RemovedChild};
use std::cmp::Ordering;

/// Mutable document tree with optional change observation.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    pub(crate) observation: ObservationState,
}

impl Document {
    /// Create a document whose root is an element with the given tag.
    pub fn new(root_tag: &str) -> Self {
        Self::build(root_tag, true)
    }

    /// Create a document that lacks the change-observation mechanism.
    ///
    /// [`observe`](Document::observe) on such a document fails with
    /// [`DomError::ObservationUnsupported`]; everything else behaves
    /// identically. This models host environments without change
    /// notification.
    pub fn without_observation(root_tag: &str) -> Self {
        Self::build(root_tag, false)
    }

    fn build(root_tag: &str, observation_supported: bool) -> Self {
        Self {
            nodes: vec![NodeData::element(root_tag)],
            root: NodeId(0),
            observation: ObservationState::new(observation_supported),
        }
    }

    /// The root node. Always an element, never detachable.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::text(text))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    pub fn exists(&self, node: NodeId) -> bool {
        (node.0 as usize) < self.nodes.len()
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes
            .get_mut(id.0 as usize)
            .ok_or(DomError::NodeNotFound(id))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).ok().and_then(|n| n.parent)
    }

    /// Children of a node; empty for text nodes and unknown ids.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Position of a node within its parent's child list.
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.node(node).ok().map(|n| &n.kind)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Text { text } => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text { .. } => None,
        }
    }

    /// Attribute pairs in set order; empty for text nodes.
    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        match self.kind(node) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// True when `ancestor` is a strict ancestor of `node` in the live tree.
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// True when `node` is `ancestor` itself or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.is_ancestor_of(ancestor, node)
    }

    /// Pre-order traversal of a subtree, starting with `node` itself.
    pub fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Compare two nodes by document position (pre-order).
    ///
    /// An ancestor precedes its descendants; siblings compare by child
    /// index. Nodes in disjoint detached trees compare by the identity of
    /// their topmost ancestors, which is arbitrary but stable.
    pub fn compare_tree_order(&self, a: NodeId, b: NodeId) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let path_a = self.path_from_top(a);
        let path_b = self.path_from_top(b);
        if path_a[0] != path_b[0] {
            return path_a[0].cmp(&path_b[0]);
        }
        let mut i = 0;
        while i < path_a.len() && i < path_b.len() && path_a[i] == path_b[i] {
            i += 1;
        }
        if i == path_a.len() {
            return Ordering::Less; // a is an ancestor of b
        }
        if i == path_b.len() {
            return Ordering::Greater;
        }
        let siblings = self.children(path_a[i - 1]);
        let ia = siblings.iter().position(|&c| c == path_a[i]);
        let ib = siblings.iter().position(|&c| c == path_b[i]);
        ia.cmp(&ib)
    }

    /// Ancestor chain from the topmost ancestor down to the node itself.
    fn path_from_top(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = vec![node];
        let mut current = node;
        while let Some(p) = self.parent(current) {
            path.push(p);
            current = p;
        }
        path.reverse();
        path
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Set an attribute, recording the previous value if observed.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let old = match &self.node(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text { .. } => return Err(DomError::NotAnElement(node)),
        };
        if self.should_record(node) {
            self.queue_record(MutationRecord::Attribute {
                target: node,
                name: name.to_string(),
                old_value: old.clone(),
            });
        }
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(node)?.kind {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
        Ok(())
    }

    /// Remove an attribute. A no-op (and unrecorded) when absent.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let old = match &self.node(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            NodeKind::Text { .. } => return Err(DomError::NotAnElement(node)),
        };
        let Some(old) = old else { return Ok(()) };
        if self.should_record(node) {
            self.queue_record(MutationRecord::Attribute {
                target: node,
                name: name.to_string(),
                old_value: Some(old),
            });
        }
        if let NodeKind::Element { attributes, .. } = &mut self.node_mut(node)?.kind {
            attributes.retain(|(n, _)| n != name);
        }
        Ok(())
    }

    /// Replace a text node's content, recording the previous value.
    pub fn set_text(&mut self, node: NodeId, value: &str) -> Result<(), DomError> {
        let old = match &self.node(node)?.kind {
            NodeKind::Text { text } => text.clone(),
            NodeKind::Element { .. } => return Err(DomError::NotText(node)),
        };
        if self.should_record(node) {
            self.queue_record(MutationRecord::CharacterData {
                target: node,
                old_value: old,
            });
        }
        if let NodeKind::Text { text } = &mut self.node_mut(node)?.kind {
            *text = value.to_string();
        }
        Ok(())
    }

    /// Append a child at the end of an element's child list.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let end = self.node(parent)?.children.len();
        self.insert_child(parent, end, child)
    }

    /// Insert a child at an index (clamped to the current child count).
    ///
    /// A currently-attached child is detached first, so a move produces two
    /// child-list records: one removal, one addition.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        match &self.node(parent)?.kind {
            NodeKind::Element { .. } => {}
            NodeKind::Text { .. } => return Err(DomError::NotAnElement(parent)),
        }
        self.node(child)?;
        if child == self.root {
            return Err(DomError::CannotMoveRoot);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::CycleDetected);
        }
        if self.parent(child).is_some() {
            self.detach(child)?;
        }
        let index = index.min(self.node(parent)?.children.len());
        if self.should_record(parent) {
            self.queue_record(MutationRecord::ChildList {
                target: parent,
                removed: Vec::new(),
                added: vec![child],
            });
        }
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Detach a node from its parent. The node (and its subtree) survives
    /// and can be reinserted later.
    pub fn remove_child(&mut self, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        self.detach(child)
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(child).ok_or(DomError::NotAttached(child))?;
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == child)
            .ok_or(DomError::NotAttached(child))?;
        // Containment is checked before the link is cut.
        if self.should_record(parent) {
            self.queue_record(MutationRecord::ChildList {
                target: parent,
                removed: vec![RemovedChild { node: child, index }],
                added: Vec::new(),
            });
        }
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        Ok(())
    }
}
