//! Casewell Domain Layer
//!
//! This crate contains the core entity model for the Casewell session cache:
//! the types shared by every other layer and the trait boundaries behind
//! which all external collaborators (remote document store, analysis
//! service, identity provider) live.
//!
//! ## Key Concepts
//!
//! - **Case**: the unit of work - a narrative, its indicators, its chat history
//! - **Indicator**: a scored, weighted factor (positive or negative) affecting
//!   a case's reunification prognosis
//! - **Message**: one append-only entry in a case's chat timeline
//! - **Prognosis score**: normalized [0,10] aggregate derived from weighted
//!   indicators (see [`prognosis`])
//!
//! ## Architecture
//!
//! - Entity types and the pure scorer live here
//! - Infrastructure implementations (caches, clients) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod case;
pub mod identity;
pub mod indicator;
pub mod message;
pub mod prognosis;
pub mod time;
pub mod traits;

// Re-exports for convenience
pub use case::{Case, CaseId, CasePatch, CaseStatus};
pub use identity::UserIdentity;
pub use indicator::{Indicator, IndicatorDraft, IndicatorId, IndicatorKind, IndicatorPatch};
pub use message::{IndicatorReport, Message, MessageId, Sender};
pub use prognosis::PrognosisResult;
pub use traits::{Cursor, ExtractionOutcome, Page};
