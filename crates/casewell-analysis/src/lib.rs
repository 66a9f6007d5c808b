//! Casewell Analysis Layer
//!
//! Implementations of the `AnalysisClient` trait from `casewell-domain`:
//!
//! - [`HttpAnalysisClient`]: calls the deployed extraction and
//!   sample-narrative functions over HTTPS
//! - [`MockAnalysisClient`]: deterministic in-process client for tests
//!
//! The extraction service responds with a JSON document of positive and
//! negative indicators plus an overall prognosis; models occasionally wrap
//! that JSON in markdown fences despite instructions, so the parser strips
//! them before deserializing.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod parser;

pub use config::HttpAnalysisConfig;
pub use error::AnalysisError;
pub use http::HttpAnalysisClient;
pub use mock::MockAnalysisClient;
