//! Error types for overhead-tracker

use thiserror::Error;

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Failures from external sources and the store
///
/// None of these are fatal: the cycle maps them to a skipped step or an
/// un-enriched notification and carries on.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Transport or status failure talking to an external source
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// External source did not answer within its deadline
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// Invalid configuration (bad file, zero quota, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Position store failure
    #[error("Store error: {0}")]
    Store(#[from] overhead_common::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
