//! Casewell Session Layer
//!
//! The top-level orchestrator of one case-management session: the
//! [`CaseSession`] owns the active case, the chat timeline, and the
//! submission state machine, and composes the indicator cache, the history
//! feeds, the analysis client and the notifier behind one serialized entry
//! point for the UI.
//!
//! The UI only reads snapshots and dispatches intents; it never mutates the
//! cached state directly.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{CaseSession, SUBMIT_FAILURE_NOTICE};
