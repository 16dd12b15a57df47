//! Error handling

use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MonitorError {
    /// Batch rejected before streaming started (user visible, no retry)
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Channel reported an error or broke; partial stats are kept
    #[error("Stream error after {ingested} records: {message}")]
    Stream { message: String, ingested: u64 },

    /// Single-item probe failed; only the caller sees this
    #[error("Probe failed: {0}")]
    Probe(String),

    /// Probe input is missing a required field
    #[error("Invalid probe input: missing {0}")]
    InvalidProbeInput(String),

    /// Event payload missing expected fields; the event is skipped
    #[error("Malformed event: {0}")]
    MalformedEvent(String),
}
