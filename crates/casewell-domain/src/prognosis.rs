//! Prognosis scoring module
//!
//! Implements the deterministic weighted formula that turns an indicator set
//! into a normalized [0, 10] prognosis score. Pure and side-effect-free:
//! identical inputs always yield an identical result, independent of call
//! order or prior state, so callers recompute on every indicator mutation
//! rather than caching.

use crate::indicator::{clamp_scale, Indicator, SCALE_MAX, SCALE_MIN};
use serde::{Deserialize, Serialize};

/// Score returned when there are no weighted indicators to judge
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Assessment label for the neutral result
pub const NEUTRAL_ASSESSMENT: &str = "neutral";

/// Aggregate prognosis derived from a weighted indicator set
///
/// Never persisted on its own - always attached to a chat message or
/// recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrognosisResult {
    /// Normalized score in [0, 10], rounded to 2 decimal places
    pub score: f64,
    /// Human-readable label; the default band label unless the caller
    /// supplies a richer assessment (e.g. from the analysis service)
    pub assessment: String,
}

impl PrognosisResult {
    /// Replace the assessment label, keeping the score
    pub fn with_assessment(mut self, assessment: impl Into<String>) -> Self {
        self.assessment = assessment.into();
        self
    }
}

/// Compute the aggregate prognosis for a set of indicators
///
/// Three steps:
/// 1. Contribution: each indicator contributes `score * weight`, both
///    clamped to [0, 10] first.
/// 2. Raw score: `(positive_sum - negative_sum) / total_weight`, where
///    `total_weight` sums weights across both partitions. Zero total weight
///    yields the neutral result (5.0, "neutral").
/// 3. Normalization: `((raw + 1) / 2) * 10`, clamped to [0, 10] and rounded
///    to 2 decimal places.
pub fn score(positives: &[Indicator], negatives: &[Indicator]) -> PrognosisResult {
    let positive_sum: f64 = positives.iter().map(Indicator::contribution).sum();
    let negative_sum: f64 = negatives.iter().map(Indicator::contribution).sum();

    let total_weight: f64 = positives
        .iter()
        .chain(negatives.iter())
        .map(|i| clamp_scale(i.weight))
        .sum();

    if total_weight == 0.0 {
        return PrognosisResult {
            score: NEUTRAL_SCORE,
            assessment: NEUTRAL_ASSESSMENT.to_string(),
        };
    }

    let raw = (positive_sum - negative_sum) / total_weight;
    let normalized = ((raw + 1.0) / 2.0) * 10.0;
    let bounded = normalized.clamp(SCALE_MIN, SCALE_MAX);
    let rounded = round2(bounded);

    PrognosisResult {
        score: rounded,
        assessment: assessment_band(rounded).to_string(),
    }
}

/// Default label for a numeric score, by band
pub fn assessment_band(score: f64) -> &'static str {
    if score < 2.5 {
        "poor"
    } else if score < 4.5 {
        "guarded"
    } else if score <= 5.5 {
        "neutral"
    } else if score <= 7.5 {
        "fair"
    } else {
        "favorable"
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseId;
    use crate::indicator::{IndicatorDraft, IndicatorKind};
    use proptest::prelude::*;

    fn indicator(kind: IndicatorKind, weight: f64, score_val: f64) -> Indicator {
        let mut draft = IndicatorDraft::new(kind, "evidence");
        draft.weight = weight;
        draft.score = score_val;
        Indicator::from_draft(CaseId::new(), draft)
    }

    #[test]
    fn test_empty_input_is_neutral() {
        let result = score(&[], &[]);
        assert_eq!(result.score, 5.0);
        assert_eq!(result.assessment, "neutral");
    }

    #[test]
    fn test_zero_weights_are_neutral() {
        let positives = vec![indicator(IndicatorKind::Positive, 0.0, 8.0)];
        let negatives = vec![indicator(IndicatorKind::Negative, 0.0, 8.0)];
        assert_eq!(score(&positives, &negatives).score, 5.0);
    }

    #[test]
    fn test_balanced_indicators_are_neutral() {
        let positives = vec![indicator(IndicatorKind::Positive, 2.0, 3.0)];
        let negatives = vec![indicator(IndicatorKind::Negative, 2.0, 3.0)];
        let result = score(&positives, &negatives);
        assert_eq!(result.score, 5.0);
        assert_eq!(result.assessment, "neutral");
    }

    #[test]
    fn test_positive_only_scores_above_neutral() {
        // raw = (1*1)/1 = 1.0 -> ((1+1)/2)*10 = 10.0
        let positives = vec![indicator(IndicatorKind::Positive, 1.0, 1.0)];
        let result = score(&positives, &[]);
        assert_eq!(result.score, 10.0);
        assert_eq!(result.assessment, "favorable");
    }

    #[test]
    fn test_negative_only_scores_below_neutral() {
        // raw = -(1*1)/1 = -1.0 -> 0.0
        let negatives = vec![indicator(IndicatorKind::Negative, 1.0, 1.0)];
        let result = score(&[], &negatives);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.assessment, "poor");
    }

    #[test]
    fn test_large_contributions_stay_bounded() {
        // raw = (10*10)/10 = 10, normalization would reach 55 unclamped
        let positives = vec![indicator(IndicatorKind::Positive, 10.0, 10.0)];
        let result = score(&positives, &[]);
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn test_rounding_to_two_decimals() {
        // raw = (2*1 - 1*1) / 3 = 1/3 -> ((1/3 + 1)/2)*10 = 6.666...
        let positives = vec![indicator(IndicatorKind::Positive, 2.0, 1.0)];
        let negatives = vec![indicator(IndicatorKind::Negative, 1.0, 1.0)];
        let result = score(&positives, &negatives);
        assert_eq!(result.score, 6.67);
    }

    #[test]
    fn test_with_assessment_overrides_label() {
        let result = score(&[], &[]).with_assessment("reunification likely");
        assert_eq!(result.score, 5.0);
        assert_eq!(result.assessment, "reunification likely");
    }

    proptest! {
        #[test]
        fn prop_score_stays_in_bounds(
            pos in prop::collection::vec((0.0f64..=10.0, 0.0f64..=10.0), 0..8),
            neg in prop::collection::vec((0.0f64..=10.0, 0.0f64..=10.0), 0..8),
        ) {
            let positives: Vec<_> = pos
                .iter()
                .map(|(w, s)| indicator(IndicatorKind::Positive, *w, *s))
                .collect();
            let negatives: Vec<_> = neg
                .iter()
                .map(|(w, s)| indicator(IndicatorKind::Negative, *w, *s))
                .collect();

            let result = score(&positives, &negatives);
            prop_assert!(result.score >= 0.0);
            prop_assert!(result.score <= 10.0);
        }

        #[test]
        fn prop_score_is_deterministic(
            pos in prop::collection::vec((0.0f64..=10.0, 0.0f64..=10.0), 0..8),
            neg in prop::collection::vec((0.0f64..=10.0, 0.0f64..=10.0), 0..8),
        ) {
            let positives: Vec<_> = pos
                .iter()
                .map(|(w, s)| indicator(IndicatorKind::Positive, *w, *s))
                .collect();
            let negatives: Vec<_> = neg
                .iter()
                .map(|(w, s)| indicator(IndicatorKind::Negative, *w, *s))
                .collect();

            let first = score(&positives, &negatives);
            let second = score(&positives, &negatives);
            prop_assert_eq!(first, second);
        }
    }
}
