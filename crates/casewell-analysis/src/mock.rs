//! Mock analysis client for deterministic testing

use crate::error::AnalysisError;
use async_trait::async_trait;
use casewell_domain::traits::{AnalysisClient, ExtractedIndicator, ExtractionOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned narrative returned by default, matching the reference sample case
const DEFAULT_SAMPLE: &str = "Jane has been in foster care for 2 years. Her parents have \
completed a substance abuse program and are seeking reunification. The parents have \
maintained regular visitation, and Jane expresses a desire to return home, but there is \
a history of relapse, the housing situation remains unstable, and the family support \
system is limited.";

/// `AnalysisClient` returning pre-configured responses without any network
///
/// Queued outcomes are consumed first; once the queue is empty, the default
/// outcome is returned. Failures are injected per call kind.
pub struct MockAnalysisClient {
    default_outcome: Mutex<ExtractionOutcome>,
    queued: Mutex<VecDeque<ExtractionOutcome>>,
    sample: Mutex<String>,
    fail_extract: Mutex<Option<String>>,
    fail_sample: Mutex<Option<String>>,
    extract_calls: AtomicUsize,
    sample_calls: AtomicUsize,
}

impl Default for MockAnalysisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalysisClient {
    /// Create a mock returning an empty outcome and the canned sample
    pub fn new() -> Self {
        Self {
            default_outcome: Mutex::new(ExtractionOutcome {
                positive_indicators: Vec::new(),
                negative_indicators: Vec::new(),
                overall_prognosis: None,
            }),
            queued: Mutex::new(VecDeque::new()),
            sample: Mutex::new(DEFAULT_SAMPLE.to_string()),
            fail_extract: Mutex::new(None),
            fail_sample: Mutex::new(None),
            extract_calls: AtomicUsize::new(0),
            sample_calls: AtomicUsize::new(0),
        }
    }

    /// Set the outcome returned when the queue is empty
    pub fn set_outcome(&self, outcome: ExtractionOutcome) {
        *self.default_outcome.lock().unwrap() = outcome;
    }

    /// Queue an outcome to be returned by the next `extract` call
    pub fn queue_outcome(&self, outcome: ExtractionOutcome) {
        self.queued.lock().unwrap().push_back(outcome);
    }

    /// Make every `extract` call fail with `message` until cleared
    pub fn fail_extract(&self, message: impl Into<String>) {
        *self.fail_extract.lock().unwrap() = Some(message.into());
    }

    /// Set the sample narrative returned by `generate_sample`
    pub fn set_sample(&self, narrative: impl Into<String>) {
        *self.sample.lock().unwrap() = narrative.into();
    }

    /// Make every `generate_sample` call fail with `message` until cleared
    pub fn fail_sample(&self, message: impl Into<String>) {
        *self.fail_sample.lock().unwrap() = Some(message.into());
    }

    /// Clear injected failures
    pub fn clear_failures(&self) {
        *self.fail_extract.lock().unwrap() = None;
        *self.fail_sample.lock().unwrap() = None;
    }

    /// Number of `extract` calls so far
    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    /// Number of `generate_sample` calls so far
    pub fn sample_calls(&self) -> usize {
        self.sample_calls.load(Ordering::SeqCst)
    }

    /// Convenience: an outcome with `positive` and `negative` indicators,
    /// each with the service's default score of 1 and no weight
    pub fn outcome_with_counts(positive: usize, negative: usize) -> ExtractionOutcome {
        let build = |prefix: &str, n: usize| -> Vec<ExtractedIndicator> {
            (0..n)
                .map(|i| ExtractedIndicator {
                    category: Some(format!("{} category {}", prefix, i)),
                    description: format!("{} indicator {}", prefix, i),
                    score: Some(1.0),
                    weight: None,
                    confidence: None,
                })
                .collect()
        };
        ExtractionOutcome {
            positive_indicators: build("positive", positive),
            negative_indicators: build("negative", negative),
            overall_prognosis: None,
        }
    }
}

#[async_trait]
impl AnalysisClient for MockAnalysisClient {
    type Error = AnalysisError;

    async fn extract(&self, _narrative: &str) -> Result<ExtractionOutcome, Self::Error> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_extract.lock().unwrap().clone() {
            return Err(AnalysisError::Service(message));
        }
        if let Some(queued) = self.queued.lock().unwrap().pop_front() {
            return Ok(queued);
        }
        Ok(self.default_outcome.lock().unwrap().clone())
    }

    async fn generate_sample(&self) -> Result<String, Self::Error> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_sample.lock().unwrap().clone() {
            return Err(AnalysisError::Service(message));
        }
        Ok(self.sample.lock().unwrap().clone())
    }
}
