//! HTTP client for the deployed analysis functions

use crate::config::HttpAnalysisConfig;
use crate::error::AnalysisError;
use crate::parser::parse_extraction;
use async_trait::async_trait;
use casewell_domain::traits::{AnalysisClient, ExtractionOutcome};
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{debug, info};

/// `AnalysisClient` backed by the remote extraction and sample functions
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    config: HttpAnalysisConfig,
}

impl HttpAnalysisClient {
    /// Create a client for the configured endpoints
    pub fn new(config: HttpAnalysisConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn post_for_text(&self, url: &str, body: Value) -> Result<String, AnalysisError> {
        let response = self.http.post(url).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16(), text));
        }
        Ok(text)
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    type Error = AnalysisError;

    async fn extract(&self, narrative: &str) -> Result<ExtractionOutcome, Self::Error> {
        info!(chars = narrative.len(), "requesting indicator extraction");

        let body = json!({ "case_info": narrative });
        let text = timeout(
            self.config.timeout,
            self.post_for_text(&self.config.extract_url, body),
        )
        .await
        .map_err(|_| AnalysisError::Timeout)??;

        debug!(chars = text.len(), "extraction response received");
        let outcome = parse_extraction(&text)?;
        info!(
            positive = outcome.positive_indicators.len(),
            negative = outcome.negative_indicators.len(),
            "extraction parsed"
        );
        Ok(outcome)
    }

    async fn generate_sample(&self) -> Result<String, Self::Error> {
        info!("requesting sample narrative");

        let text = timeout(
            self.config.timeout,
            self.post_for_text(&self.config.sample_url, json!({})),
        )
        .await
        .map_err(|_| AnalysisError::Timeout)??;

        // The function may respond with raw text or {"narrative": "..."}.
        let narrative = match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => match map.get("narrative").and_then(Value::as_str) {
                Some(n) => n.to_string(),
                None => {
                    if let Some(error) = map.get("error").and_then(Value::as_str) {
                        return Err(AnalysisError::Service(error.to_string()));
                    }
                    return Err(AnalysisError::InvalidFormat(
                        "sample response missing narrative".to_string(),
                    ));
                }
            },
            Ok(Value::String(s)) => s,
            _ => text,
        };

        if narrative.trim().is_empty() {
            return Err(AnalysisError::InvalidFormat(
                "empty sample narrative".to_string(),
            ));
        }
        Ok(narrative)
    }
}
