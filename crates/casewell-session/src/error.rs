//! Error types for the session controller

use thiserror::Error;

/// Errors surfaced by [`CaseSession`](crate::CaseSession) operations
///
/// `ValidationFailed` and `PreconditionFailed` are rejected synchronously,
/// before any optimistic mutation. The remaining variants report remote
/// failures after the local cache has already been adjusted according to
/// each operation's rollback-or-keep policy.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Input rejected before any mutation (empty narrative, empty title)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// No authenticated identity for an operation that requires one
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// The remote store could not complete the call
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The analysis service failed or returned a malformed response
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// No cached entity with the given id
    #[error("Not found: {0}")]
    NotFound(String),

    /// A mutually exclusive operation is already in flight
    #[error("Operation already in flight: {0}")]
    Busy(&'static str),
}
