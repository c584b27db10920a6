//! Task event record definition
//!
//! One row of an eye-tracker event export: a participant, an event label of
//! the form `Task{n}` and the time in seconds at which it was logged. Column
//! names of the export ("Participant", "Event", "Seconds") are accepted as
//! aliases.

use crate::schema::fixation_record::ValidationError;
use serde::{Deserialize, Serialize};

/// Prefix of task event labels
pub const TASK_EVENT_PREFIX: &str = "Task";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    #[serde(alias = "Participant")]
    pub participant: String,
    /// Event label, `Task1`, `Task2`, ...
    #[serde(alias = "Event")]
    pub event: String,
    #[serde(alias = "Seconds")]
    pub seconds: f64,
}

impl TaskEvent {
    pub fn new(participant: impl Into<String>, event: impl Into<String>, seconds: f64) -> Self {
        Self {
            participant: participant.into(),
            event: event.into(),
            seconds,
        }
    }

    /// 1-based task number of a `Task{n}` label
    pub fn task_number(&self) -> Option<usize> {
        let number: usize = self
            .event
            .trim()
            .strip_prefix(TASK_EVENT_PREFIX)?
            .trim()
            .parse()
            .ok()?;
        (number > 0).then_some(number)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.participant.trim().is_empty() {
            return Err(ValidationError::EmptyParticipant);
        }
        if self.task_number().is_none() {
            return Err(ValidationError::UnknownEvent(self.event.clone()));
        }
        if !self.seconds.is_finite() {
            return Err(ValidationError::NonFiniteTime);
        }
        Ok(())
    }
}
