//! Parse analysis-service output into an extraction outcome

use crate::error::AnalysisError;
use casewell_domain::traits::ExtractionOutcome;
use serde_json::Value;
use tracing::warn;

/// Parse a service response body into an [`ExtractionOutcome`]
///
/// Handles markdown-fenced JSON, surfaces service-reported `{"error": ...}`
/// bodies as typed failures, and drops indicators with blank descriptions
/// rather than failing the whole extraction over one bad item.
pub fn parse_extraction(response: &str) -> Result<ExtractionOutcome, AnalysisError> {
    let json_str = extract_json(response)?;

    let value: Value = serde_json::from_str(&json_str)
        .map_err(|e| AnalysisError::InvalidFormat(format!("JSON parse error: {}", e)))?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(AnalysisError::Service(error.to_string()));
    }

    let mut outcome: ExtractionOutcome = serde_json::from_value(value)
        .map_err(|e| AnalysisError::InvalidFormat(e.to_string()))?;

    retain_valid(&mut outcome.positive_indicators, "positive");
    retain_valid(&mut outcome.negative_indicators, "negative");

    Ok(outcome)
}

fn retain_valid(
    indicators: &mut Vec<casewell_domain::traits::ExtractedIndicator>,
    partition: &str,
) {
    indicators.retain(|i| {
        if i.description.trim().is_empty() {
            warn!(partition, "dropping extracted indicator with empty description");
            false
        } else {
            true
        }
    });
}

/// Extract JSON from a response, handling markdown code blocks
///
/// The service is instructed to emit raw JSON, but the underlying model
/// sometimes wraps it in ``` fences anyway.
fn extract_json(response: &str) -> Result<String, AnalysisError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(AnalysisError::InvalidFormat("empty code block".to_string()));
        }
        // Skip first line (```json or ```) and last line (```)
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else if trimmed.is_empty() {
        Err(AnalysisError::InvalidFormat("empty response".to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN: &str = r#"{
        "positive_indicators": [
            {"category": "Strong Parent-Child Relationship", "description": "Child expresses desire to return home", "score": 1}
        ],
        "negative_indicators": [
            {"category": "Chronic and Persistent Problems", "description": "History of relapse", "score": 1},
            {"category": "Cumulative Risk Factors", "description": "Unstable housing situation", "score": 1}
        ],
        "overall_prognosis": {"assessment": "Guarded; recent progress is real but fragile."}
    }"#;

    #[test]
    fn test_parses_plain_json() {
        let outcome = parse_extraction(PLAIN).unwrap();
        assert_eq!(outcome.positive_indicators.len(), 1);
        assert_eq!(outcome.negative_indicators.len(), 2);
        assert!(outcome.overall_prognosis.unwrap().assessment.starts_with("Guarded"));
    }

    #[test]
    fn test_strips_markdown_fences() {
        let fenced = format!("```json\n{}\n```", PLAIN);
        let outcome = parse_extraction(&fenced).unwrap();
        assert_eq!(outcome.negative_indicators.len(), 2);
    }

    #[test]
    fn test_service_error_body_is_typed() {
        let result = parse_extraction(r#"{"error": "Failed to extract indicators"}"#);
        assert!(matches!(result, Err(AnalysisError::Service(_))));
    }

    #[test]
    fn test_blank_descriptions_are_dropped_not_fatal() {
        let body = r#"{
            "positive_indicators": [
                {"category": "x", "description": "  "},
                {"category": "y", "description": "Regular visitation maintained"}
            ],
            "negative_indicators": []
        }"#;
        let outcome = parse_extraction(body).unwrap();
        assert_eq!(outcome.positive_indicators.len(), 1);
    }

    #[test]
    fn test_garbage_is_invalid_format() {
        assert!(matches!(
            parse_extraction("not json at all"),
            Err(AnalysisError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_extraction(""),
            Err(AnalysisError::InvalidFormat(_))
        ));
    }
}
