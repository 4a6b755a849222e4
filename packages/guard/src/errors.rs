//! Error types for the guard engine.

use domlock_dom::DomError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GuardError {
    /// The mutation API was used without a mounted guarded root. This is a
    /// programming error at the call site, not a recoverable runtime
    /// condition.
    #[error("no guarded root is mounted")]
    NoGuardedRoot,

    #[error("tree error: {0}")]
    Dom(#[from] DomError),
}
