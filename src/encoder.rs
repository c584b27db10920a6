//! Report encoding
//!
//! This module encodes a cohort run and its chapters into the JSON report
//! payload handed to the document-assembly collaborator.

use crate::chapters::ChapterOutput;
use crate::error::MetricsError;
use crate::pipeline::{CohortRun, SkippedParticipant};
use crate::tasks::TaskTimes;
use crate::types::{CohortMetrics, ParticipantMetrics};
use crate::{GAZE_FLUX_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// Current report payload version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete report payload.
///
/// NaN statistics are written as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPayload {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub participants: Vec<ParticipantMetrics>,
    pub skipped: Vec<SkippedParticipant>,
    pub cohort: Option<CohortMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_times: Option<TaskTimes>,
    pub chapters: Vec<ChapterOutput>,
}

/// Report encoder for producing JSON payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a run and its chapters into a payload
    pub fn encode(&self, run: &CohortRun, chapters: &[ChapterOutput]) -> ReportPayload {
        ReportPayload {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: GAZE_FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            participants: run.participants.clone(),
            skipped: run.skipped.clone(),
            cohort: run.cohort.clone(),
            task_times: run.task_times.clone(),
            chapters: chapters.to_vec(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        run: &CohortRun,
        chapters: &[ChapterOutput],
    ) -> Result<String, MetricsError> {
        let payload = self.encode(run, chapters);
        serde_json::to_string_pretty(&payload).map_err(MetricsError::JsonError)
    }
}
