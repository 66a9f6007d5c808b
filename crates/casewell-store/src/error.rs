//! Error types for the store layer

use thiserror::Error;

/// Errors surfaced by the client-side cache
#[derive(Error, Debug)]
pub enum StoreError {
    /// No authenticated identity, or no active case, for an operation that
    /// requires one. Rejected before any optimistic mutation.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The remote store could not complete the call. Whether local state was
    /// rolled back depends on the operation (see `IndicatorStore`).
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Input rejected before any mutation occurred
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// No cached entity with the given id
    #[error("Not found: {0}")]
    NotFound(String),
}
