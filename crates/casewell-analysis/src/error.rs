//! Error types for the analysis clients

use thiserror::Error;

/// Errors that can occur talking to the analysis service
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Network-level failure reaching the service
    #[error("Communication error: {0}")]
    Communication(String),

    /// Non-success HTTP status from the service
    #[error("Service returned HTTP {0}: {1}")]
    Status(u16, String),

    /// The service reported an application-level error
    #[error("Service error: {0}")]
    Service(String),

    /// Response body was not the expected JSON shape
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    /// The call exceeded the configured timeout
    #[error("Analysis timeout")]
    Timeout,
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Communication(e.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::InvalidFormat(e.to_string())
    }
}
