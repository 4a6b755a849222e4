//! # Revert Algorithm
//!
//! Undoes a recorded batch, newest record first.
//!
//! Later records can depend on tree shape established by earlier ones, so
//! undoing in reverse chronological order restores the intermediate states
//! correctly, like popping an undo stack. Within one child-list record the
//! same rule applies to the per-child lists: last recorded, first undone.
//!
//! A record whose target no longer accepts the undo operation is reported
//! in the returned list and skipped; the rest of the batch still reverts.

use domlock_dom::{Document, DomError, MutationRecord};
use thiserror::Error;

/// A single record that could not be undone.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("could not revert record {record_index}: {source}")]
pub struct RevertFailure {
    /// Index of the record in the batch (oldest-first order).
    pub record_index: usize,
    #[source]
    pub source: DomError,
}

/// Undo every record of `batch` against `doc`, newest first.
///
/// The caller is expected to have paused observation; reverts performed
/// while observing would be recorded and re-reverted forever.
pub fn revert_batch(doc: &mut Document, batch: &[MutationRecord]) -> Vec<RevertFailure> {
    let mut failures = Vec::new();
    for (record_index, record) in batch.iter().enumerate().rev() {
        match record {
            MutationRecord::Attribute {
                target,
                name,
                old_value,
            } => {
                let result = match old_value {
                    Some(value) => doc.set_attribute(*target, name, value),
                    None => doc.remove_attribute(*target, name),
                };
                if let Err(source) = result {
                    report(&mut failures, record_index, source);
                }
            }
            MutationRecord::CharacterData { target, old_value } => {
                if let Err(source) = doc.set_text(*target, old_value) {
                    report(&mut failures, record_index, source);
                }
            }
            MutationRecord::ChildList {
                target,
                removed,
                added,
            } => {
                for child in removed.iter().rev() {
                    if let Err(source) = doc.insert_child(*target, child.index, child.node) {
                        report(&mut failures, record_index, source);
                    }
                }
                for &child in added.iter().rev() {
                    if doc.parent(child).is_some() {
                        if let Err(source) = doc.remove_child(child) {
                            report(&mut failures, record_index, source);
                        }
                    }
                }
            }
        }
    }
    failures
}

fn report(failures: &mut Vec<RevertFailure>, record_index: usize, source: DomError) {
    let failure = RevertFailure {
        record_index,
        source,
    };
    tracing::warn!("{}", failure);
    failures.push(failure);
}
