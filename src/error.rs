//! Error types for Energy Balance

use thiserror::Error;

/// Errors that can occur while turning health samples into a report
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format summary: {0}")]
    Format(#[from] std::fmt::Error),

    /// A metric had no data for the requested period. Tolerated by the pipeline.
    #[error("No data for metric source: {0}")]
    MissingMetricData(String),

    #[error("Unknown sleep stage code: {0}")]
    UnknownSleepStage(i64),

    #[error("Analysis window needs at least 2 usable days, found {available}")]
    InsufficientWindow { available: usize },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
