//! Trait definitions for external collaborators
//!
//! These traits define the boundaries between the session cache and its
//! infrastructure: the remote document store, the narrative-analysis
//! service, and the identity provider. Implementations live in other crates
//! (and in-process fakes live next to them for tests).

use crate::case::{Case, CaseId, CasePatch};
use crate::identity::UserIdentity;
use crate::indicator::{Indicator, IndicatorId, IndicatorPatch};
use crate::message::{Message, MessageId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque pagination token marking the end of the last retrieved page
///
/// Produced by the store, handed back verbatim on the next request. Two
/// sequential pages under the same cursor chain cover disjoint ranges, so
/// appending pages never duplicates items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a store-produced token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of an ordered collection
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in this page, in collection order
    pub items: Vec<T>,
    /// Cursor for the next page, when one may exist
    pub next_cursor: Option<Cursor>,
    /// False once a short page has been reached
    pub has_more: bool,
}

impl<T> Page<T> {
    /// An empty, exhausted page
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_more: false,
        }
    }
}

/// Trait for the remote document store
///
/// Document-oriented CRUD with query-by-field, order-by, limit and
/// start-after-cursor pagination. All calls are single atomic remote
/// operations; the caller owns optimistic caching and rollback policy.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Error type for store operations
    type Error: fmt::Display + Send + Sync + 'static;

    /// Persist a new case; returns the store-assigned id
    async fn create_case(&self, case: &Case) -> Result<CaseId, Self::Error>;

    /// Apply a partial update to a case
    async fn update_case(&self, id: CaseId, patch: &CasePatch) -> Result<(), Self::Error>;

    /// List cases owned by `owner_id`, ordered by `created_at` descending
    async fn list_cases(
        &self,
        owner_id: &str,
        limit: usize,
        after: Option<&Cursor>,
    ) -> Result<Page<Case>, Self::Error>;

    /// Persist a new indicator; returns the store-assigned id
    async fn create_indicator(&self, indicator: &Indicator) -> Result<IndicatorId, Self::Error>;

    /// Apply a partial update to an indicator
    async fn update_indicator(
        &self,
        case_id: CaseId,
        id: IndicatorId,
        patch: &IndicatorPatch,
    ) -> Result<(), Self::Error>;

    /// Delete an indicator
    async fn delete_indicator(&self, case_id: CaseId, id: IndicatorId)
        -> Result<(), Self::Error>;

    /// Fetch all indicators for a case, ordered by `created_at` descending
    async fn list_indicators(&self, case_id: CaseId) -> Result<Vec<Indicator>, Self::Error>;

    /// Persist a new chat message; returns the store-assigned id
    async fn create_message(&self, message: &Message) -> Result<MessageId, Self::Error>;

    /// List messages for a case, ordered by `timestamp` ascending
    async fn list_messages(
        &self,
        case_id: CaseId,
        limit: usize,
        after: Option<&Cursor>,
    ) -> Result<Page<Message>, Self::Error>;
}

/// One indicator as reported by the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedIndicator {
    /// Indicator category label
    pub category: Option<String>,
    /// Evidence text (direct quotes from the narrative)
    pub description: String,
    /// Score in [0, 10]; the service usually seeds 1
    #[serde(default)]
    pub score: Option<f64>,
    /// Weight in [0, 10], when the service provides one
    #[serde(default)]
    pub weight: Option<f64>,
    /// Extraction confidence in [0, 1], when the service provides one
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Overall prognosis as reported by the analysis service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedPrognosis {
    /// Narrative assessment text
    pub assessment: String,
    /// Numeric score, when the service provides one
    #[serde(default)]
    pub score: Option<f64>,
}

/// Full response of one extraction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Indicators supporting reunification
    #[serde(default)]
    pub positive_indicators: Vec<ExtractedIndicator>,
    /// Indicators against reunification
    #[serde(default)]
    pub negative_indicators: Vec<ExtractedIndicator>,
    /// Overall prognosis, when the service produced one
    #[serde(default)]
    pub overall_prognosis: Option<ExtractedPrognosis>,
}

/// Trait for the narrative-analysis service
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Error type for analysis operations
    type Error: fmt::Display + Send + Sync + 'static;

    /// Extract indicators from a case narrative. One atomic remote call.
    async fn extract(&self, narrative: &str) -> Result<ExtractionOutcome, Self::Error>;

    /// Generate a sample narrative for prefilling the input
    async fn generate_sample(&self) -> Result<String, Self::Error>;
}

/// Trait for the identity provider
///
/// Absence of a user means `Sender::Anonymous` for chat messages and
/// `PreconditionFailed` for operations that persist remotely.
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Identity provider with a fixed answer
///
/// Covers both the signed-in and the signed-out session in tests and in
/// deployments where identity is established once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    /// A provider that always reports `user`
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    /// A provider that always reports no user
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}
