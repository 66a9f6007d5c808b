//! Casewell Store Layer
//!
//! The client-side cache over the remote document store:
//!
//! - [`IndicatorStore`]: authoritative per-case indicator cache with
//!   optimistic mutations and defined rollback-or-keep policies
//! - [`PagedFeed`]: serialized cursor-based pagination over ordered
//!   collections
//! - [`MemoryStore`]: in-process [`CaseStore`] implementation with failure
//!   injection, for tests and offline development
//!
//! The remote store itself is an external collaborator behind the
//! [`CaseStore`] trait; this crate never talks to a network directly.
//!
//! [`CaseStore`]: casewell_domain::traits::CaseStore

#![warn(missing_docs)]

pub mod error;
pub mod feed;
pub mod indicator;
pub mod memory;

pub use error::StoreError;
pub use feed::{FeedPage, PagedFeed, PAGE_SIZE};
pub use indicator::IndicatorStore;
pub use memory::{MemoryError, MemoryStore};
