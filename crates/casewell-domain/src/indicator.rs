//! Indicator module - a scored, weighted prognosis factor

use crate::case::CaseId;
use crate::time::now_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive bounds for indicator `weight` and `score`.
pub const SCALE_MIN: f64 = 0.0;
/// Upper bound of the indicator scale.
pub const SCALE_MAX: f64 = 10.0;

/// Default weight assigned when the extraction service omits one.
pub const DEFAULT_WEIGHT: f64 = 1.0;
/// Default score assigned when the extraction service omits one.
pub const DEFAULT_SCORE: f64 = 1.0;

/// Unique identifier for an indicator based on UUIDv7
///
/// UUIDv7 keeps locally-generated ids chronologically sortable and unique
/// without coordinating with the remote store; the store may still hand back
/// its own id on create, which the cache reconciles in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorId(uuid::Uuid);

impl IndicatorId {
    /// Generate a new UUIDv7-based IndicatorId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Parse an IndicatorId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid indicator id: {}", e))
    }
}

impl Default for IndicatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an indicator argues for or against reunification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Factor supporting a favorable prognosis
    Positive,
    /// Factor against a favorable prognosis
    Negative,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Positive => write!(f, "positive"),
            IndicatorKind::Negative => write!(f, "negative"),
        }
    }
}

/// A single prognosis factor extracted from (or entered against) a case
///
/// Identity is the `id` alone; the cache enforces uniqueness by id, not by
/// content. `weight`, `score` and `confidence` are clamped into range at
/// construction and on every patch, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    /// Unique identifier
    pub id: IndicatorId,

    /// Case this indicator belongs to
    pub case_id: CaseId,

    /// Positive or negative
    pub kind: IndicatorKind,

    /// Evidence text (direct quotes from the narrative, or user-entered)
    pub text: String,

    /// Indicator category (e.g. "Parental Stability and Functioning")
    pub category: Option<String>,

    /// Where the indicator came from (extraction model, user, import)
    pub source: Option<String>,

    /// Relative importance in [0, 10]
    pub weight: f64,

    /// Strength of the evidence in [0, 10]
    pub score: f64,

    /// Extraction confidence in [0, 1], when known
    pub confidence: Option<f64>,

    /// Creation timestamp (Unix millis)
    pub created_at: u64,

    /// Last-modified timestamp (Unix millis)
    pub updated_at: u64,
}

/// Clamp a value onto the indicator scale [0, 10]
pub fn clamp_scale(value: f64) -> f64 {
    if value.is_nan() {
        return SCALE_MIN;
    }
    value.clamp(SCALE_MIN, SCALE_MAX)
}

/// Clamp a value onto the unit interval [0, 1]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Caller-supplied fields for creating an indicator
///
/// The cache fills in the id, case id and timestamps on insert.
#[derive(Debug, Clone)]
pub struct IndicatorDraft {
    /// Positive or negative
    pub kind: IndicatorKind,
    /// Evidence text; must be non-blank
    pub text: String,
    /// Optional category label
    pub category: Option<String>,
    /// Optional source label
    pub source: Option<String>,
    /// Weight in [0, 10]; out-of-range values are clamped
    pub weight: f64,
    /// Score in [0, 10]; out-of-range values are clamped
    pub score: f64,
    /// Optional confidence in [0, 1]
    pub confidence: Option<f64>,
}

impl IndicatorDraft {
    /// Create a draft with default weight and score
    pub fn new(kind: IndicatorKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            category: None,
            source: None,
            weight: DEFAULT_WEIGHT,
            score: DEFAULT_SCORE,
            confidence: None,
        }
    }
}

impl Indicator {
    /// Materialize a draft into a full indicator for `case_id`
    ///
    /// Assigns a fresh local id and timestamps and clamps numeric fields.
    pub fn from_draft(case_id: CaseId, draft: IndicatorDraft) -> Self {
        let now = now_millis();
        Self {
            id: IndicatorId::new(),
            case_id,
            kind: draft.kind,
            text: draft.text,
            category: draft.category,
            source: draft.source,
            weight: clamp_scale(draft.weight),
            score: clamp_scale(draft.score),
            confidence: draft.confidence.map(clamp_unit),
            created_at: now,
            updated_at: now,
        }
    }

    /// Weighted contribution of this indicator to the prognosis score
    pub fn contribution(&self) -> f64 {
        clamp_scale(self.score) * clamp_scale(self.weight)
    }
}

/// Partial update applied to an existing indicator
///
/// `None` fields are left untouched. `kind` may change, which is why cache
/// lookups for updates scan both partitions.
#[derive(Debug, Clone, Default)]
pub struct IndicatorPatch {
    /// New kind, if changing
    pub kind: Option<IndicatorKind>,
    /// New evidence text
    pub text: Option<String>,
    /// New category (Some(None) clears it)
    pub category: Option<Option<String>>,
    /// New source (Some(None) clears it)
    pub source: Option<Option<String>>,
    /// New weight, clamped to [0, 10]
    pub weight: Option<f64>,
    /// New score, clamped to [0, 10]
    pub score: Option<f64>,
    /// New confidence, clamped to [0, 1] (Some(None) clears it)
    pub confidence: Option<Option<f64>>,
}

impl IndicatorPatch {
    /// Apply this patch in place, stamping `updated_at`
    pub fn apply(&self, indicator: &mut Indicator) {
        if let Some(kind) = self.kind {
            indicator.kind = kind;
        }
        if let Some(text) = &self.text {
            indicator.text = text.clone();
        }
        if let Some(category) = &self.category {
            indicator.category = category.clone();
        }
        if let Some(source) = &self.source {
            indicator.source = source.clone();
        }
        if let Some(weight) = self.weight {
            indicator.weight = clamp_scale(weight);
        }
        if let Some(score) = self.score {
            indicator.score = clamp_scale(score);
        }
        if let Some(confidence) = self.confidence {
            indicator.confidence = confidence.map(clamp_unit);
        }
        indicator.updated_at = now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_clamps_out_of_range_values() {
        let mut draft = IndicatorDraft::new(IndicatorKind::Positive, "stable housing");
        draft.weight = 42.0;
        draft.score = -3.0;
        draft.confidence = Some(1.5);

        let indicator = Indicator::from_draft(CaseId::new(), draft);
        assert_eq!(indicator.weight, SCALE_MAX);
        assert_eq!(indicator.score, SCALE_MIN);
        assert_eq!(indicator.confidence, Some(1.0));
    }

    #[test]
    fn test_patch_applies_only_present_fields() {
        let case_id = CaseId::new();
        let mut indicator = Indicator::from_draft(
            case_id,
            IndicatorDraft::new(IndicatorKind::Positive, "regular visitation"),
        );
        let before_kind = indicator.kind;

        let patch = IndicatorPatch {
            score: Some(7.0),
            ..Default::default()
        };
        patch.apply(&mut indicator);

        assert_eq!(indicator.score, 7.0);
        assert_eq!(indicator.kind, before_kind);
        assert_eq!(indicator.text, "regular visitation");
    }

    #[test]
    fn test_patch_can_flip_kind_and_clear_category() {
        let mut indicator = Indicator::from_draft(
            CaseId::new(),
            IndicatorDraft::new(IndicatorKind::Positive, "history of relapse"),
        );
        indicator.category = Some("Chronic and Persistent Problems".to_string());

        let patch = IndicatorPatch {
            kind: Some(IndicatorKind::Negative),
            category: Some(None),
            weight: Some(99.0),
            ..Default::default()
        };
        patch.apply(&mut indicator);

        assert_eq!(indicator.kind, IndicatorKind::Negative);
        assert_eq!(indicator.category, None);
        assert_eq!(indicator.weight, SCALE_MAX);
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = IndicatorId::new();
        let parsed = IndicatorId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_clamp_scale_handles_nan() {
        assert_eq!(clamp_scale(f64::NAN), SCALE_MIN);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }
}
