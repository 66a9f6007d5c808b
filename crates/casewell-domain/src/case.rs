//! Case module - the unit of work holding a narrative and its history

use crate::time::now_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a case based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(uuid::Uuid);

impl CaseId {
    /// Generate a new UUIDv7-based CaseId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a CaseId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid case id: {}", e))
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Open and accepting narrative submissions
    Active,
    /// Decision reached; read-only for the worker
    Closed,
    /// Retained for record-keeping only
    Archived,
}

/// A child-welfare case: a narrative, its indicators, and its chat history
///
/// Cases are created locally with optimistic ids and persisted to the remote
/// store; they are never deleted locally (remote deletion is out of scope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Unique identifier
    pub id: CaseId,

    /// Uid of the worker who owns the case
    pub owner_id: String,

    /// Short human-readable title
    pub title: String,

    /// Latest submitted narrative text
    pub narrative: String,

    /// Lifecycle status
    pub status: CaseStatus,

    /// Creation timestamp (Unix millis)
    pub created_at: u64,

    /// Last-modified timestamp (Unix millis)
    pub updated_at: u64,
}

impl Case {
    /// Create a new active case owned by `owner_id`
    pub fn new(owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: CaseId::new(),
            owner_id: owner_id.into(),
            title: title.into(),
            narrative: String::new(),
            status: CaseStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to an existing case
#[derive(Debug, Clone, Default)]
pub struct CasePatch {
    /// New title
    pub title: Option<String>,
    /// New narrative text
    pub narrative: Option<String>,
    /// New lifecycle status
    pub status: Option<CaseStatus>,
}

impl CasePatch {
    /// Apply this patch in place, stamping `updated_at`
    pub fn apply(&self, case: &mut Case) {
        if let Some(title) = &self.title {
            case.title = title.clone();
        }
        if let Some(narrative) = &self.narrative {
            case.narrative = narrative.clone();
        }
        if let Some(status) = self.status {
            case.status = status;
        }
        case.updated_at = now_millis();
    }
}
