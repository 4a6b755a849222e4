//! # Batch Dispatch
//!
//! Walks the listener order for one batch, filtering records per listener
//! through the pre-batch snapshot, with live claim/stop-propagation control.
//!
//! A record reaches a listener when its target is the listener's node or a
//! previous-descendant of it, and no inner listener has claimed it yet. A
//! claimed record is invisible to every later (outer) listener of the same
//! pass. The pass ends early once every record is claimed.
//!
//! Handler failures are isolated: a failing handler is logged and the pass
//! continues with the remaining listeners.

use crate::registry::ListenerEntry;
use crate::snapshot::RevertedTree;
use domlock_dom::{Document, MutationRecord, NodeId};
use std::cell::RefCell;
use std::collections::HashSet;
use std::ptr;

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Listeners whose handler was invoked (empty filters are skipped).
    pub notified: usize,
    /// Records claimed via stop-propagation by the end of the pass.
    pub claimed: usize,
    pub handler_failures: usize,
}

/// The filtered view of one batch for one listener.
///
/// Records appear in the batch's original (oldest-first) order; no further
/// ordering is guaranteed. The claim set is shared across the whole pass,
/// so stopping propagation here hides records from every later listener.
pub struct MutationsEvent<'a> {
    batch: &'a [MutationRecord],
    indices: Vec<usize>,
    claimed: &'a RefCell<HashSet<usize>>,
    snapshot: &'a RevertedTree,
}

impl<'a> MutationsEvent<'a> {
    /// The records relevant to this listener, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &'a MutationRecord> + '_ {
        let batch = self.batch;
        self.indices.iter().map(move |&i| &batch[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Claim every record in this event, hiding them from outer listeners.
    pub fn stop_propagation(&self) {
        let mut claimed = self.claimed.borrow_mut();
        claimed.extend(self.indices.iter().copied());
    }

    /// Claim a single record previously obtained from this event. Returns
    /// false when the record is not part of this event.
    pub fn stop_record(&self, record: &MutationRecord) -> bool {
        let index = self
            .indices
            .iter()
            .copied()
            .find(|&i| ptr::eq(&self.batch[i], record));
        match index {
            Some(i) => {
                self.claimed.borrow_mut().insert(i);
                true
            }
            None => false,
        }
    }

    /// Narrow this event to records targeting `node` or one of its
    /// previous-descendants, per the pre-batch snapshot.
    pub fn mutations_in(&self, doc: &Document, node: NodeId) -> Vec<&'a MutationRecord> {
        self.indices
            .iter()
            .map(|&i| &self.batch[i])
            .filter(|r| {
                let target = r.target();
                target == node || self.snapshot.is_ancestor_of(doc, node, target)
            })
            .collect()
    }
}

/// Notify every listed listener of the records relevant to its subtree.
pub fn dispatch(
    doc: &mut Document,
    batch: &[MutationRecord],
    snapshot: &RevertedTree,
    order: &[ListenerEntry],
) -> DispatchReport {
    let mut report = DispatchReport::default();
    if batch.is_empty() || order.is_empty() {
        return report;
    }
    let claimed = RefCell::new(HashSet::new());
    for entry in order {
        let indices: Vec<usize> = (0..batch.len())
            .filter(|i| !claimed.borrow().contains(i))
            .filter(|&i| {
                let target = batch[i].target();
                target == entry.node || snapshot.is_ancestor_of(doc, entry.node, target)
            })
            .collect();
        if indices.is_empty() {
            continue;
        }
        let event = MutationsEvent {
            batch,
            indices,
            claimed: &claimed,
            snapshot,
        };
        report.notified += 1;
        if let Err(err) = (*entry.handler)(doc, &event) {
            tracing::error!("mutation listener {:?} failed: {}", entry.id, err);
            report.handler_failures += 1;
        }
        if claimed.borrow().len() == batch.len() {
            break;
        }
    }
    report.claimed = claimed.into_inner().len();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ListenerRegistry;
    use std::rc::Rc;

    struct Fixture {
        doc: Document,
        outer: NodeId,
        inner: NodeId,
        text: NodeId,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new("root");
        let root = doc.root();
        let outer = doc.create_element("outer");
        let inner = doc.create_element("inner");
        let text = doc.create_text("a");
        doc.append_child(root, outer).unwrap();
        doc.append_child(outer, inner).unwrap();
        doc.append_child(inner, text).unwrap();
        Fixture {
            doc,
            outer,
            inner,
            text,
        }
    }

    fn text_batch(f: &mut Fixture) -> Vec<MutationRecord> {
        let root = f.doc.root();
        f.doc.observe(root).unwrap();
        f.doc.set_text(f.text, "b").unwrap();
        let batch = f.doc.take_records();
        f.doc.disconnect();
        batch
    }

    #[test]
    fn bubbles_innermost_first() {
        let mut f = fixture();
        let batch = text_batch(&mut f);
        let snapshot = RevertedTree::for_batch(&batch);

        let log = Rc::new(RefCell::new(Vec::new()));
        let registry = ListenerRegistry::new();
        for node in [f.doc.root(), f.inner, f.outer] {
            let log = log.clone();
            registry.register(&f.doc, node, move |_, event| {
                log.borrow_mut().push((node, event.len()));
                Ok(())
            });
        }

        let order = registry.depth_first_order();
        let report = dispatch(&mut f.doc, &batch, &snapshot, &order);
        assert_eq!(report.notified, 3);
        assert_eq!(
            *log.borrow(),
            vec![(f.inner, 1), (f.outer, 1), (f.doc.root(), 1)]
        );
    }

    #[test]
    fn stop_propagation_hides_records_from_ancestors() {
        let mut f = fixture();
        let batch = text_batch(&mut f);
        let snapshot = RevertedTree::for_batch(&batch);

        let log = Rc::new(RefCell::new(Vec::new()));
        let registry = ListenerRegistry::new();
        {
            let log = log.clone();
            let inner = f.inner;
            registry.register(&f.doc, inner, move |_, event| {
                log.borrow_mut().push(inner);
                event.stop_propagation();
                Ok(())
            });
        }
        {
            let log = log.clone();
            let outer = f.outer;
            registry.register(&f.doc, outer, move |_, _| {
                log.borrow_mut().push(outer);
                Ok(())
            });
        }

        let order = registry.depth_first_order();
        let report = dispatch(&mut f.doc, &batch, &snapshot, &order);
        assert_eq!(*log.borrow(), vec![f.inner]);
        assert_eq!(report.notified, 1);
        assert_eq!(report.claimed, 1);
    }

    #[test]
    fn stop_record_claims_one_record_only() {
        let mut f = fixture();
        let root = f.doc.root();
        f.doc.observe(root).unwrap();
        f.doc.set_text(f.text, "b").unwrap();
        f.doc.set_attribute(f.inner, "data-x", "1").unwrap();
        let batch = f.doc.take_records();
        f.doc.disconnect();
        let snapshot = RevertedTree::for_batch(&batch);

        let seen_by_outer = Rc::new(RefCell::new(Vec::new()));
        let registry = ListenerRegistry::new();
        registry.register(&f.doc, f.inner, |_, event| {
            let first = event.records().next().unwrap();
            assert!(event.stop_record(first));
            Ok(())
        });
        {
            let seen = seen_by_outer.clone();
            registry.register(&f.doc, f.outer, move |_, event| {
                seen.borrow_mut().extend(event.records().cloned());
                Ok(())
            });
        }

        let order = registry.depth_first_order();
        dispatch(&mut f.doc, &batch, &snapshot, &order);
        // The text record was claimed; only the attribute record bubbles.
        assert_eq!(seen_by_outer.borrow().len(), 1);
        assert_eq!(seen_by_outer.borrow()[0].target(), f.inner);
    }

    #[test]
    fn listeners_outside_target_subtree_are_skipped() {
        let mut f = fixture();
        let root = f.doc.root();
        let sibling = f.doc.create_element("aside");
        f.doc.append_child(root, sibling).unwrap();
        let batch = text_batch(&mut f);
        let snapshot = RevertedTree::for_batch(&batch);

        let called = Rc::new(RefCell::new(false));
        let registry = ListenerRegistry::new();
        {
            let called = called.clone();
            registry.register(&f.doc, sibling, move |_, _| {
                *called.borrow_mut() = true;
                Ok(())
            });
        }

        let order = registry.depth_first_order();
        let report = dispatch(&mut f.doc, &batch, &snapshot, &order);
        assert!(!*called.borrow());
        assert_eq!(report.notified, 0);
    }

    #[test]
    fn empty_registry_is_a_no_op() {
        let mut f = fixture();
        let batch = text_batch(&mut f);
        let snapshot = RevertedTree::for_batch(&batch);
        let report = dispatch(&mut f.doc, &batch, &snapshot, &[]);
        assert_eq!(report, DispatchReport::default());
    }

    #[test]
    fn failing_handler_does_not_abort_the_pass() {
        let mut f = fixture();
        let batch = text_batch(&mut f);
        let snapshot = RevertedTree::for_batch(&batch);

        let outer_ran = Rc::new(RefCell::new(false));
        let registry = ListenerRegistry::new();
        registry.register(&f.doc, f.inner, |_, _| Err("listener broke".into()));
        {
            let outer_ran = outer_ran.clone();
            registry.register(&f.doc, f.outer, move |_, _| {
                *outer_ran.borrow_mut() = true;
                Ok(())
            });
        }

        let order = registry.depth_first_order();
        let report = dispatch(&mut f.doc, &batch, &snapshot, &order);
        assert!(*outer_ran.borrow());
        assert_eq!(report.handler_failures, 1);
        assert_eq!(report.notified, 2);
    }

    #[test]
    fn mutations_in_filters_by_previous_subtree() {
        // A record targeting a node that was detached during the batch
        // still counts as "inside" its previous parent's subtree.
        let mut f = fixture();
        let root = f.doc.root();
        f.doc.observe(root).unwrap();
        f.doc.set_attribute(f.inner, "data-x", "1").unwrap();
        f.doc.remove_child(f.inner).unwrap();
        let batch = f.doc.take_records();
        f.doc.disconnect();
        let snapshot = RevertedTree::for_batch(&batch);

        let counts = Rc::new(RefCell::new((0usize, 0usize)));
        let registry = ListenerRegistry::new();
        {
            let counts = counts.clone();
            let outer = f.outer;
            let inner = f.inner;
            registry.register(&f.doc, root, move |doc, event| {
                let mut counts = counts.borrow_mut();
                counts.0 = event.mutations_in(doc, outer).len();
                counts.1 = event.mutations_in(doc, inner).len();
                Ok(())
            });
        }

        let order = registry.depth_first_order();
        dispatch(&mut f.doc, &batch, &snapshot, &order);
        // Both records happened under `outer`; only the attribute change
        // targeted `inner` or its previous descendants.
        assert_eq!(*counts.borrow(), (2, 1));
    }
}
