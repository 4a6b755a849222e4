//! # Listener Registry
//!
//! The set of (node, handler) pairs currently interested in mutation
//! batches, kept in bubbling order: innermost node first, so a descendant
//! can claim records before its ancestors see them. Unrelated nodes
//! tie-break by document order, preceding node first.
//!
//! The registry is a cloneable handle created alongside the guarded root
//! and shared with the lock and with application components; a handler may
//! register or unregister listeners mid-dispatch, which only affects the
//! next pass because dispatch iterates a snapshot of the order.
//!
//! The order is recomputed on every registration (O(n log n) resort).
//! Listener counts are small relative to batch frequency, so this is a
//! known scaling limit rather than a defect.

use crate::dispatch::MutationsEvent;
use domlock_dom::{Document, NodeId};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

pub type HandlerResult = Result<(), Box<dyn std::error::Error>>;

/// Handler invoked per (batch, listener) pair. Receives the live document
/// (mutations made here are unobserved and therefore kept) and the filtered
/// event for this listener.
pub type ListenerHandler = dyn Fn(&mut Document, &MutationsEvent<'_>) -> HandlerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// One live registration, as seen by the dispatcher.
#[derive(Clone)]
pub struct ListenerEntry {
    pub id: ListenerId,
    pub node: NodeId,
    pub handler: Rc<ListenerHandler>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    /// Kept sorted innermost-first; stable for equal nodes.
    entries: Vec<ListenerEntry>,
}

/// Shared handle to the listener set for one guarded root.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a node and resort the dispatch order.
    pub fn register<F>(&self, doc: &Document, node: NodeId, handler: F) -> ListenerId
    where
        F: Fn(&mut Document, &MutationsEvent<'_>) -> HandlerResult + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.entries.push(ListenerEntry {
            id,
            node,
            handler: Rc::new(handler),
        });
        inner
            .entries
            .sort_by(|a, b| bubbling_order(doc, a.node, b.node));
        id
    }

    /// Remove a registration. Returns false when the id is unknown.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.id != id);
        inner.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Stable snapshot of the current bubbling order for one dispatch pass.
    pub fn depth_first_order(&self) -> Vec<ListenerEntry> {
        self.inner.borrow().entries.clone()
    }
}

/// Innermost-first: a descendant precedes its ancestors; unrelated nodes
/// fall back to document order. This is post-order document position.
fn bubbling_order(doc: &Document, a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        Ordering::Equal
    } else if doc.is_ancestor_of(a, b) {
        Ordering::Greater
    } else if doc.is_ancestor_of(b, a) {
        Ordering::Less
    } else {
        doc.compare_tree_order(a, b)
    }
}
