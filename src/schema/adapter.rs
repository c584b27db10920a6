//! Adapters for fixation records and task events
//!
//! Parses JSON arrays and NDJSON, validates rows, and splits pooled files into
//! per-participant logs without reordering any participant's rows.

use crate::error::MetricsError;
use crate::schema::fixation_record::{FixationRecord, ValidationError};
use crate::schema::task_event::TaskEvent;
use crate::types::EventLog;
use serde::de::DeserializeOwned;

/// Adapter for converting raw fixation records to event logs
pub struct FixationAdapter;

impl FixationAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<FixationRecord>, MetricsError> {
        parse_json_array(json)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<FixationRecord>, MetricsError> {
        parse_json_lines(ndjson)
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[FixationRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    participant: record.participant.clone(),
                    error,
                })
            })
            .collect()
    }

    /// Convert records into one participant's event log, in record order
    pub fn to_event_log(
        records: &[FixationRecord],
        participant: &str,
    ) -> Result<EventLog, MetricsError> {
        let mut fixations = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            record.validate().map_err(|e| {
                MetricsError::InvalidInput(format!(
                    "{}: malformed fixation at row {}: {}",
                    participant,
                    idx + 1,
                    e
                ))
            })?;
            fixations.push(record.to_fixation());
        }
        Ok(EventLog::new(participant, fixations))
    }

    /// Split a pooled record set into per-participant logs.
    ///
    /// Participants appear in first-seen order. Records without a participant
    /// go to `default_participant`; a file that also names that participant
    /// explicitly is `InvalidInput`, since the two logs would interleave.
    pub fn split_by_participant(
        records: &[FixationRecord],
        default_participant: &str,
    ) -> Result<Vec<(String, Vec<FixationRecord>)>, MetricsError> {
        let unnamed = records.iter().any(|r| r.participant.is_none());
        let named_default = records
            .iter()
            .any(|r| r.participant.as_deref() == Some(default_participant));
        if unnamed && named_default {
            return Err(MetricsError::InvalidInput(format!(
                "records without a participant would merge into the explicit '{}' rows",
                default_participant
            )));
        }

        let mut groups: Vec<(String, Vec<FixationRecord>)> = Vec::new();
        for record in records {
            let participant = record
                .participant
                .as_deref()
                .unwrap_or(default_participant);
            match groups.iter_mut().find(|(p, _)| p == participant) {
                Some((_, rows)) => rows.push(record.clone()),
                None => groups.push((participant.to_string(), vec![record.clone()])),
            }
        }
        Ok(groups)
    }
}

/// Adapter for task event exports
pub struct TaskEventAdapter;

impl TaskEventAdapter {
    pub fn parse_array(json: &str) -> Result<Vec<TaskEvent>, MetricsError> {
        parse_json_array(json)
    }

    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<TaskEvent>, MetricsError> {
        parse_json_lines(ndjson)
    }
}

fn parse_json_array<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, MetricsError> {
    let rows: Vec<T> = serde_json::from_str(json)?;
    Ok(rows)
}

fn parse_json_lines<T: DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, MetricsError> {
    let mut rows = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(row) => rows.push(row),
            Err(e) => {
                return Err(MetricsError::ParseError(format!(
                    "Failed to parse line {}: {}",
                    line_num + 1,
                    e
                )));
            }
        }
    }
    Ok(rows)
}

/// Result of record validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub participant: Option<String>,
    pub error: ValidationError,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ndjson() -> &'static str {
        r#"{"participant": "P1", "aoi": "Screen", "start_time": 0.0, "end_time": 0.4}
{"participant": "P2", "aoi": "Knob", "start_time": 0.0, "end_time": 0.2}

{"participant": "P1", "aoi": "Knob", "start_time": 0.5, "end_time": 0.9}
{"aoi": "Alarm", "start_time": 0.0, "end_time": 0.3}
"#
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let records = FixationAdapter::parse_ndjson(sample_ndjson()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[2].aoi, "Knob");
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"aoi\": \"A\", \"start_time\": 0.0, \"end_time\": 1.0}\nnot json\n";
        let err = FixationAdapter::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"AOI": "Screen", "Start time": 0.0, "End time": 0.5, "Fixation time": 0.5},
            {"AOI": "Knob", "Start time": 0.5, "End time": 0.7, "Fixation time": 0.2}
        ]"#;
        let records = FixationAdapter::parse_array(json).unwrap();
        let log = FixationAdapter::to_event_log(&records, "Participant 1").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.labels().collect::<Vec<_>>(), vec!["Screen", "Knob"]);
    }

    #[test]
    fn test_split_preserves_order() {
        let records = FixationAdapter::parse_ndjson(sample_ndjson()).unwrap();
        let groups = FixationAdapter::split_by_participant(&records, "Participant 1").unwrap();

        let names: Vec<&str> = groups.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2", "Participant 1"]);

        let p1: Vec<&str> = groups[0].1.iter().map(|r| r.aoi.as_str()).collect();
        assert_eq!(p1, vec!["Screen", "Knob"]);
    }

    #[test]
    fn test_split_rejects_unnamed_rows_colliding_with_default() {
        let mut named = FixationRecord::new("Screen", 0.0, 0.5);
        named.participant = Some("Participant 1".to_string());
        let unnamed = FixationRecord::new("Knob", 0.0, 0.5);

        let err = FixationAdapter::split_by_participant(&[named.clone(), unnamed.clone()], "Participant 1")
            .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
        assert!(err.to_string().contains("Participant 1"));

        let groups = FixationAdapter::split_by_participant(&[named, unnamed], "Participant 2").unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_malformed_row_names_participant() {
        let records = vec![
            FixationRecord::new("Screen", 0.0, 1.0),
            FixationRecord::new("Screen", 2.0, 1.0),
        ];
        let err = FixationAdapter::to_event_log(&records, "Participant 7").unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
        assert!(message.contains("Participant 7"));
        assert!(message.contains("row 2"));
    }

    #[test]
    fn test_parse_task_events_ndjson() {
        let input = "{\"Participant\": \"P1\", \"Event\": \"Task1\", \"Seconds\": 2.0}\n\n{\"participant\": \"P1\", \"event\": \"Task1\", \"seconds\": 9.5}\n";
        let events = TaskEventAdapter::parse_ndjson(input).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].seconds, 9.5);

        let err = TaskEventAdapter::parse_ndjson("{\"event\": \"Task1\"}\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_validate_records() {
        let records = vec![
            FixationRecord::new("Screen", 0.0, 1.0),
            FixationRecord::new("", 0.0, 1.0),
        ];
        let failures = FixationAdapter::validate_records(&records);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].error, ValidationError::EmptyLabel);
    }
}
