//! # Document Tree
//!
//! In-memory mutable document tree with change observation.
//!
//! This crate provides the tree half of the guarded-region engine:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ dom: live tree + change records             │
//! │  - Arena-backed element/text nodes          │
//! │  - Validated structural mutation            │
//! │  - Document-order and ancestry queries      │
//! │  - Observation: record every change under   │
//! │    an observed root as a MutationRecord     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ guard: lock + revert + dispatch             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Records are reversible**: every [`MutationRecord`] carries the old
//!    value (or removal position) needed to undo it against the current tree
//! 2. **Validate, then apply**: structural mutations reject cycles and
//!    type mismatches before touching the tree
//! 3. **Observation is passive**: recording never changes mutation behavior;
//!    a document built without observation support behaves identically
//!    except that `observe` fails

mod document;
mod errors;
mod node;
mod observer;

pub use document::Document;
pub use errors::DomError;
pub use node::{NodeId, NodeKind};
pub use observer::{MutationRecord, RemovedChild};
