//! Message module - one append-only entry in a case's chat timeline

use crate::case::CaseId;
use crate::indicator::Indicator;
use crate::prognosis::PrognosisResult;
use crate::time::now_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a chat message based on UUIDv7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(uuid::Uuid);

impl MessageId {
    /// Generate a new UUIDv7-based MessageId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse a MessageId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid message id: {}", e))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "uid")]
pub enum Sender {
    /// An authenticated worker, identified by uid
    User(String),
    /// The analysis side of the conversation
    System,
    /// A worker without an authenticated identity
    Anonymous,
}

/// Structured extraction output attached to a system message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    /// Indicators supporting reunification
    pub positive: Vec<Indicator>,
    /// Indicators against reunification
    pub negative: Vec<Indicator>,
    /// Aggregate prognosis for this submission, when derived
    pub prognosis: Option<PrognosisResult>,
}

/// One entry in a case's chat timeline
///
/// Messages are append-only and ordered by `timestamp` ascending; after an
/// optimistic insert only the id may be reconciled, never the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: MessageId,

    /// Case this message belongs to
    pub case_id: CaseId,

    /// Message body
    pub content: String,

    /// Author
    pub sender: Sender,

    /// Ordering key (Unix millis)
    pub timestamp: u64,

    /// Extraction results, for system messages that carry them
    pub indicators: Option<IndicatorReport>,

    /// True for system messages reporting a failed submission
    pub error: bool,
}

impl Message {
    /// A worker-authored narrative message
    pub fn user(case_id: CaseId, content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: MessageId::new(),
            case_id,
            content: content.into(),
            sender,
            timestamp: now_millis(),
            indicators: None,
            error: false,
        }
    }

    /// A system message carrying structured extraction results
    pub fn report(case_id: CaseId, content: impl Into<String>, report: IndicatorReport) -> Self {
        Self {
            id: MessageId::new(),
            case_id,
            content: content.into(),
            sender: Sender::System,
            timestamp: now_millis(),
            indicators: Some(report),
            error: false,
        }
    }

    /// A system message reporting a failed submission
    pub fn failure(case_id: CaseId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            case_id,
            content: content.into(),
            sender: Sender::System,
            timestamp: now_millis(),
            indicators: None,
            error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_defaults() {
        let case_id = CaseId::new();
        let msg = Message::user(case_id, "Jane, age 7...", Sender::User("u1".into()));
        assert_eq!(msg.case_id, case_id);
        assert!(!msg.error);
        assert!(msg.indicators.is_none());
    }

    #[test]
    fn test_failure_message_is_flagged() {
        let msg = Message::failure(CaseId::new(), "Failed to analyze the narrative.");
        assert!(msg.error);
        assert_eq!(msg.sender, Sender::System);
    }

    #[test]
    fn test_sender_serialization_shape() {
        let json = serde_json::to_string(&Sender::User("u1".into())).unwrap();
        assert!(json.contains("user"));
        assert!(json.contains("u1"));
        let back: Sender = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Sender::User("u1".into()));
    }
}
