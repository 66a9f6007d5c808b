//! Configuration for the HTTP analysis client

use std::time::Duration;

/// Default per-call timeout; extraction runs a large model and can be slow
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Endpoints and limits for [`HttpAnalysisClient`](crate::HttpAnalysisClient)
#[derive(Debug, Clone)]
pub struct HttpAnalysisConfig {
    /// URL of the indicator-extraction function
    pub extract_url: String,

    /// URL of the sample-narrative function
    pub sample_url: String,

    /// Per-call timeout
    pub timeout: Duration,
}

impl HttpAnalysisConfig {
    /// Configuration for the given endpoints with the default timeout
    pub fn new(extract_url: impl Into<String>, sample_url: impl Into<String>) -> Self {
        Self {
            extract_url: extract_url.into(),
            sample_url: sample_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
