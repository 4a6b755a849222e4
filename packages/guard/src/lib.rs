//! # Guarded Region Engine
//!
//! Guards a subtree of a live [`Document`](domlock_dom::Document) against
//! uncontrolled edits while keeping the owning application in charge.
//!
//! ## Architecture
//!
//! ```text
//! native edit mutates the tree
//!                 ↓
//! ┌─────────────────────────────────────────────┐
//! │ DomLock: observe → revert → notify          │
//! │  - poll() drains the pending record batch   │
//! │  - observation pauses for the whole pass    │
//! │  - unauthorized changes are undone          │
//! │  - mutate() is the sanctioned write path    │
//! └─────────────────────────────────────────────┘
//!                 ↓
//! ┌─────────────────────────────────────────────┐
//! │ RevertedTree: pre-batch ancestry snapshot   │
//! └─────────────────────────────────────────────┘
//!                 ↓
//! ┌─────────────────────────────────────────────┐
//! │ dispatch: bubbling, innermost listener      │
//! │ first, with claim/stop-propagation          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Observe, then decide**: native changes land in the tree first; the
//!    lock undoes them afterwards unless they came through [`DomLock::mutate`]
//! 2. **Dispatch against the past**: listeners are matched to records using
//!    the tree shape from before the batch, not after
//! 3. **Isolation**: one failing revert or listener never aborts the rest of
//!    the pass

mod dispatch;
mod errors;
mod lock;
mod registry;
mod revert;
mod snapshot;

pub use dispatch::{dispatch, DispatchReport, MutationsEvent};
pub use errors::GuardError;
pub use lock::{BatchReport, DomLock, RenderScope};
pub use registry::{HandlerResult, ListenerEntry, ListenerHandler, ListenerId, ListenerRegistry};
pub use revert::{revert_batch, RevertFailure};
pub use snapshot::RevertedTree;

// Re-export common types for convenience
pub use domlock_dom::{Document, DomError, MutationRecord, NodeId, RemovedChild};
