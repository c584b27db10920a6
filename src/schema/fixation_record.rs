//! gaze.fixation.v1 record definition
//!
//! One row of a cGOM fixation export. Column names from the export
//! ("Start time", "End time", "Fixation time") are accepted as aliases of the
//! snake_case fields.

use crate::types::Fixation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current schema version
pub const SCHEMA_VERSION: &str = "gaze.fixation.v1";

/// Raw fixation row as supplied by the data-loading collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationRecord {
    /// Schema version; records without one are read as the current version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Participant the row belongs to, for pooled files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    /// Area-of-interest label
    #[serde(alias = "AOI", alias = "label")]
    pub aoi: String,
    /// Fixation start in seconds
    #[serde(alias = "Start time")]
    pub start_time: f64,
    /// Fixation end in seconds
    #[serde(alias = "End time")]
    pub end_time: f64,
    /// Fixation duration in seconds; derived from the timestamps when absent
    #[serde(
        default,
        alias = "Fixation time",
        alias = "fixation_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixation_time: Option<f64>,
}

impl FixationRecord {
    pub fn new(aoi: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            schema_version: None,
            participant: None,
            aoi: aoi.into(),
            start_time,
            end_time,
            fixation_time: None,
        }
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(version) = &self.schema_version {
            if version != SCHEMA_VERSION {
                return Err(ValidationError::InvalidSchemaVersion {
                    expected: SCHEMA_VERSION.to_string(),
                    actual: version.clone(),
                });
            }
        }

        if self.aoi.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }

        if !self.start_time.is_finite() || !self.end_time.is_finite() {
            return Err(ValidationError::NonFiniteTime);
        }

        if self.end_time < self.start_time {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_time,
                end: self.end_time,
            });
        }

        if let Some(duration) = self.fixation_time {
            if !duration.is_finite() || duration < 0.0 {
                return Err(ValidationError::InvalidDuration(duration));
            }
        }

        Ok(())
    }

    /// Convert into a fixation, deriving the duration when it was not supplied
    pub fn to_fixation(&self) -> Fixation {
        match self.fixation_time {
            Some(duration) => {
                Fixation::with_duration(self.aoi.clone(), self.start_time, self.end_time, duration)
            }
            None => Fixation::new(self.aoi.clone(), self.start_time, self.end_time),
        }
    }
}

/// Record validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("AOI label is empty")]
    EmptyLabel,

    #[error("Start or end time is not a finite number")]
    NonFiniteTime,

    #[error("End time {end} is before start time {start}")]
    EndBeforeStart { start: f64, end: f64 },

    #[error("Fixation time {0} is not a non-negative number")]
    InvalidDuration(f64),

    #[error("Participant is empty")]
    EmptyParticipant,

    #[error("Event '{0}' is not a Task{{n}} label")]
    UnknownEvent(String),
}
