//! # Pre-batch Tree Snapshot
//!
//! Answers "was A an ancestor of B immediately before this batch?" without
//! touching the live tree.
//!
//! The snapshot is a per-batch lookup of previous-parent overrides. A node
//! removed during the batch gets its removal target as override; every other
//! node answers through its live parent. Overrides are derived newest-first
//! so a node removed more than once resolves to its earliest (pre-batch)
//! parent.
//!
//! Nodes *added* during the batch deliberately get no override: their parent
//! from before the batch may lie outside the batch's visibility, and forcing
//! a reconstruction would lose information about concurrent moves. This is a
//! conservative approximation carried over from the original design — a node
//! both removed elsewhere and added into the guarded subtree in one batch
//! can be misclassified for bubbling.

use domlock_dom::{Document, MutationRecord, NodeId};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Query-only reconstruction of pre-batch ancestry. Created fresh per batch
/// and discarded after dispatch.
#[derive(Debug)]
pub struct RevertedTree {
    previous_parent: HashMap<NodeId, NodeId>,
    /// Lazily filled on first lookup per node; batches are small but the
    /// live tree can be large.
    cache: RefCell<HashMap<NodeId, Option<NodeId>>>,
}

impl RevertedTree {
    /// Build the snapshot for a batch in observed (oldest-first) order.
    pub fn for_batch(batch: &[MutationRecord]) -> Self {
        let mut previous_parent = HashMap::new();
        for record in batch.iter().rev() {
            if let MutationRecord::ChildList {
                target, removed, ..
            } = record
            {
                for child in removed {
                    // Newest-first iteration means the earliest removal is
                    // inserted last and wins.
                    previous_parent.insert(child.node, *target);
                }
            }
        }
        Self {
            previous_parent,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// True when `ancestor` strictly contained `node` before the batch.
    pub fn is_ancestor_of(&self, doc: &Document, ancestor: NodeId, node: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut current = node;
        while let Some(parent) = self.previous_parent_of(doc, current) {
            if parent == ancestor {
                return true;
            }
            if !seen.insert(parent) {
                tracing::warn!("cycle in previous-parent chain at {}", parent);
                return false;
            }
            current = parent;
        }
        false
    }

    fn previous_parent_of(&self, doc: &Document, node: NodeId) -> Option<NodeId> {
        if let Some(&cached) = self.cache.borrow().get(&node) {
            return cached;
        }
        let parent = self
            .previous_parent
            .get(&node)
            .copied()
            .or_else(|| doc.parent(node));
        self.cache.borrow_mut().insert(node, parent);
        parent
    }
}
