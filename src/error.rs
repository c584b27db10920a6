//! Error types for Gaze Flux

use thiserror::Error;

/// Errors that can occur while computing eye-tracking metrics or assembling a report
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Malformed or empty input where a computation needs at least one fixation,
    /// or a lookup of an AOI that is not present in the log.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An aggregate has zero contributing rows. Callers skip the dependent output.
    #[error("No data: {0}")]
    NoData(String),

    /// A participant result lacks an AOI present in the cohort union.
    #[error("{participant} has no data for AOI '{aoi}'")]
    MissingAoi { aoi: String, participant: String },

    #[error("Failed to parse fixation data: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Rendering error: {0}")]
    RenderError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetricsError {
    /// Whether the error only gates optional output rather than failing the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MetricsError::NoData(_) | MetricsError::MissingAoi { .. })
    }
}
