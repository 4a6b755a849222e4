//! # Mutation Lock
//!
//! Per-guarded-root state machine between *observing* (native changes are
//! captured and undone) and *unlocked* (changes pass through).
//!
//! The single loop-prevention discipline: observation stops before any
//! revert or dispatch runs and resumes exactly once afterwards, so the
//! engine's own writes, and writes made by listener handlers, are never
//! re-observed.
//!
//! [`DomLock::mutate`] is the sanctioned write path for application code;
//! the [`unlock_for_render`](DomLock::unlock_for_render) /
//! [`lock_after_render`](DomLock::lock_after_render) pair (or the RAII
//! [`RenderScope`]) suspends observation for framework-driven re-renders.
//! Suspension nests: a depth counter makes the outermost release the one
//! that resumes observation.

use crate::dispatch::{dispatch, DispatchReport};
use crate::errors::GuardError;
use crate::registry::ListenerRegistry;
use crate::revert::{revert_batch, RevertFailure};
use crate::snapshot::RevertedTree;
use domlock_dom::{Document, DomError, MutationRecord, NodeId};

/// Outcome of processing one observed batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Records in the batch.
    pub records: usize,
    /// Records that could not be undone (reported, non-fatal).
    pub revert_failures: Vec<RevertFailure>,
    pub dispatch: DispatchReport,
}

/// Guards one subtree of a document.
pub struct DomLock {
    registry: ListenerRegistry,
    root: Option<NodeId>,
    /// Live observe state; mirrors whether the document currently records.
    observing: bool,
    render_depth: u32,
    /// Set when the document lacks the observation mechanism; the lock then
    /// degrades to a permanently-unlocked passthrough.
    degraded: bool,
}

impl DomLock {
    pub fn new(registry: ListenerRegistry) -> Self {
        Self {
            registry,
            root: None,
            observing: false,
            render_depth: 0,
            degraded: false,
        }
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// True while native changes to the guarded subtree will be undone.
    pub fn is_locked(&self) -> bool {
        self.observing
    }

    /// True when the lock constructed without an observation mechanism.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Attach the lock to a guarded root and start observing.
    ///
    /// When the document lacks the observation mechanism the lock mounts in
    /// degraded mode instead of failing: `mutate` becomes a passthrough and
    /// nothing is ever reverted.
    pub fn mount(&mut self, doc: &mut Document, root: NodeId) -> Result<(), GuardError> {
        if !doc.exists(root) {
            return Err(GuardError::Dom(DomError::NodeNotFound(root)));
        }
        self.unmount(doc);
        self.root = Some(root);
        match doc.observe(root) {
            Ok(()) => {
                self.observing = true;
                tracing::debug!("guarding {}", root);
            }
            Err(DomError::ObservationUnsupported) => {
                self.degraded = true;
                tracing::warn!("change observation unavailable; guarded region stays unlocked");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// Detach from the guarded root, processing any still-pending batch
    /// first so the tree is never left half-reverted.
    pub fn unmount(&mut self, doc: &mut Document) -> Option<BatchReport> {
        let report = if self.observing {
            let pending = doc.take_records();
            let report = if pending.is_empty() {
                None
            } else {
                Some(self.process_batch(doc, pending))
            };
            self.suspend_observation(doc);
            report
        } else {
            None
        };
        self.root = None;
        self.render_depth = 0;
        self.degraded = false;
        report
    }

    /// Process the pending batch, if any: pause observation, build the
    /// pre-batch snapshot, undo the changes, notify listeners with the
    /// pre-revert batch, resume observation.
    ///
    /// This is the deferred observation callback of the host mechanism,
    /// surfaced as an explicit synchronous step.
    pub fn poll(&mut self, doc: &mut Document) -> Option<BatchReport> {
        if !self.observing {
            return None;
        }
        let batch = doc.take_records();
        if batch.is_empty() {
            return None;
        }
        let report = self.process_batch(doc, batch);
        self.resume_observation(doc);
        Some(report)
    }

    /// Run an authorized mutation against the guarded root.
    ///
    /// Any pending native batch is processed first so `f` sees a clean,
    /// consistent tree. `f` runs with observation paused, so its changes
    /// are never reverted. Taking `&mut self` makes re-entrant calls
    /// unrepresentable, which enforces at-most-one mutation in flight per
    /// lock; render suspension nests via the depth counter instead.
    pub fn mutate<T>(
        &mut self,
        doc: &mut Document,
        f: impl FnOnce(&mut Document, NodeId) -> T,
    ) -> Result<T, GuardError> {
        let root = self.root.ok_or(GuardError::NoGuardedRoot)?;
        if self.degraded {
            return Ok(f(doc, root));
        }
        let was_observing = self.observing;
        if was_observing {
            let pending = doc.take_records();
            if pending.is_empty() {
                self.suspend_observation(doc);
            } else {
                self.process_batch(doc, pending);
            }
        }
        let value = f(doc, root);
        if was_observing {
            self.resume_observation(doc);
        }
        Ok(value)
    }

    /// Suspend observation for a framework-driven render. Must be paired
    /// with [`lock_after_render`](DomLock::lock_after_render) on every exit
    /// path; prefer [`render_scope`](DomLock::render_scope).
    pub fn unlock_for_render(&mut self, doc: &mut Document) {
        if self.render_depth == 0 && self.observing {
            let pending = doc.take_records();
            if pending.is_empty() {
                self.suspend_observation(doc);
            } else {
                self.process_batch(doc, pending);
            }
        }
        self.render_depth += 1;
    }

    /// Release one render suspension; the outermost release resumes
    /// observation. An unbalanced call is logged and ignored.
    pub fn lock_after_render(&mut self, doc: &mut Document) {
        if self.render_depth == 0 {
            tracing::warn!("lock_after_render without matching unlock_for_render");
            return;
        }
        self.render_depth -= 1;
        if self.render_depth == 0 {
            self.resume_observation(doc);
        }
    }

    /// Scoped render suspension, released on drop.
    pub fn render_scope<'a>(&'a mut self, doc: &'a mut Document) -> RenderScope<'a> {
        self.unlock_for_render(doc);
        RenderScope { lock: self, doc }
    }

    /// Revert and dispatch one batch. Leaves observation suspended; the
    /// caller decides when to resume.
    fn process_batch(&mut self, doc: &mut Document, batch: Vec<MutationRecord>) -> BatchReport {
        self.suspend_observation(doc);
        tracing::debug!("processing batch of {} records", batch.len());
        let snapshot = RevertedTree::for_batch(&batch);
        let revert_failures = revert_batch(doc, &batch);
        let order = self.registry.depth_first_order();
        let dispatch = dispatch(doc, &batch, &snapshot, &order);
        BatchReport {
            records: batch.len(),
            revert_failures,
            dispatch,
        }
    }

    fn suspend_observation(&mut self, doc: &mut Document) {
        if self.observing {
            doc.disconnect();
            self.observing = false;
        }
    }

    fn resume_observation(&mut self, doc: &mut Document) {
        if self.observing || self.degraded || self.render_depth > 0 {
            return;
        }
        if let Some(root) = self.root {
            match doc.observe(root) {
                Ok(()) => self.observing = true,
                Err(err) => tracing::error!("could not resume observation: {}", err),
            }
        }
    }
}

/// RAII handle for a render suspension; re-locks on drop, including on
/// early returns and panics.
pub struct RenderScope<'a> {
    lock: &'a mut DomLock,
    doc: &'a mut Document,
}

impl RenderScope<'_> {
    pub fn doc(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for RenderScope<'_> {
    fn drop(&mut self) {
        self.lock.lock_after_render(self.doc);
    }
}
