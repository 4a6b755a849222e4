//! # Change Observation
//!
//! Records every mutation under an observed root as a [`MutationRecord`].
//!
//! Records queue in observed (oldest-first) order and are drained with
//! [`Document::take_records`]. Each record is self-sufficient to undo the
//! change it represents given only the post-mutation tree: attribute and
//! text records carry the previous value, child-list records carry each
//! removed child's position at removal time.
//!
//! Whether a mutation is recorded is decided against the tree as it stands
//! when the mutation is requested, so a removal is attributed to the parent
//! the child is detached from.

use crate::document::Document;
use crate::errors::DomError;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::mem;

/// One atomic, reversible change to the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MutationRecord {
    /// An attribute was set or removed. `old_value` is `None` when the
    /// attribute did not exist before.
    Attribute {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },

    /// A text node's content changed.
    CharacterData { target: NodeId, old_value: String },

    /// Children were removed from or added to an element.
    ChildList {
        target: NodeId,
        removed: Vec<RemovedChild>,
        added: Vec<NodeId>,
    },
}

impl MutationRecord {
    /// The node the change happened on; for child-list changes, the parent.
    pub fn target(&self) -> NodeId {
        match self {
            MutationRecord::Attribute { target, .. }
            | MutationRecord::CharacterData { target, .. }
            | MutationRecord::ChildList { target, .. } => *target,
        }
    }
}

/// A removed child together with its index in the parent at removal time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedChild {
    pub node: NodeId,
    pub index: usize,
}

#[derive(Debug)]
pub(crate) struct ObservationState {
    supported: bool,
    root: Option<NodeId>,
    pending: Vec<MutationRecord>,
}

impl ObservationState {
    pub fn new(supported: bool) -> Self {
        Self {
            supported,
            root: None,
            pending: Vec::new(),
        }
    }
}

impl Document {
    /// Start recording changes under `root` (the root itself included).
    ///
    /// Replaces any previous observation root.
    pub fn observe(&mut self, root: NodeId) -> Result<(), DomError> {
        if !self.observation.supported {
            return Err(DomError::ObservationUnsupported);
        }
        if !self.exists(root) {
            return Err(DomError::NodeNotFound(root));
        }
        self.observation.root = Some(root);
        Ok(())
    }

    /// Stop recording and drop any undelivered records.
    pub fn disconnect(&mut self) {
        self.observation.root = None;
        self.observation.pending.clear();
    }

    pub fn is_observing(&self) -> bool {
        self.observation.root.is_some()
    }

    pub fn observed_root(&self) -> Option<NodeId> {
        self.observation.root
    }

    /// Drain the pending records, oldest first.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        mem::take(&mut self.observation.pending)
    }

    pub fn has_pending_records(&self) -> bool {
        !self.observation.pending.is_empty()
    }

    pub(crate) fn should_record(&self, target: NodeId) -> bool {
        match self.observation.root {
            Some(root) => self.contains(root, target),
            None => false,
        }
    }

    pub(crate) fn queue_record(&mut self, record: MutationRecord) {
        tracing::debug!("recorded {:?}", record);
        self.observation.pending.push(record);
    }
}
