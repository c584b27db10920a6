//! Metrics pipeline orchestration
//!
//! This module provides the public API for eye-tracking metrics processing.
//! It runs every participant log through AOI extraction, dwell segmentation,
//! revisit counting and transition counting, then folds the results into a
//! cohort view and encodes the report.

use crate::aggregate::MetricsAggregator;
use crate::aoi::areas_of_interest;
use crate::chapters::assemble_chapters;
use crate::config::ReportConfig;
use crate::dwell::DwellSegmenter;
use crate::encoder::ReportEncoder;
use crate::error::MetricsError;
use crate::fixations::fixation_durations;
use crate::render::CollectingSink;
use crate::revisits::RevisitCounter;
use crate::schema::{FixationAdapter, FixationRecord, TaskEvent};
use crate::tasks::{TaskTimer, TaskTimes};
use crate::transitions::TransitionMatrixBuilder;
use crate::types::{CohortMetrics, DwellStrategy, EventLog, ParticipantMetrics};
use serde::Serialize;

/// Name given to records that carry no participant field
pub const DEFAULT_PARTICIPANT: &str = "Participant 1";

/// Compute every per-participant metric from one event log.
///
/// # Arguments
/// * `log` - Ordered fixations of one participant
/// * `strategy` - How dwell durations are derived
///
/// # Returns
/// The participant's AOIs, dwell table, revisits, transitions and fixation samples
pub fn compute_participant(
    log: &EventLog,
    strategy: DwellStrategy,
) -> Result<ParticipantMetrics, MetricsError> {
    log.require_non_empty("metrics computation")?;

    // Stage 1: AOIs in first-seen order
    let aois = areas_of_interest(log);

    // Stage 2: Dwell episodes and their statistics
    let dwell = DwellSegmenter::segment_for(&aois, log, strategy)?;

    // Stage 3: Revisits
    let revisits = RevisitCounter::count(&aois, log)?;

    // Stage 4: Transitions
    let transitions = TransitionMatrixBuilder::build(&aois, log)?;

    // Stage 5: Fixation duration samples
    let fixations = fixation_durations(&aois, log);

    log::debug!(
        "{}: {} fixations over {} AOIs, {} transitions",
        log.participant(),
        log.len(),
        aois.len(),
        transitions.total()
    );

    Ok(ParticipantMetrics {
        participant: log.participant().to_string(),
        fixation_count: log.len(),
        aois,
        dwell,
        revisits,
        transitions,
        fixations,
    })
}

/// Convert a JSON array of fixation records to report JSON (stateless, one-shot).
///
/// Records are split by their `participant` field; records without one belong
/// to `Participant 1`, unless the file also names that participant, in which
/// case the whole file is skipped. Charts are collected in memory and not written.
///
/// # Example
/// ```ignore
/// let report_json = fixations_to_report(json, &ReportConfig::default())?;
/// ```
pub fn fixations_to_report(json: &str, config: &ReportConfig) -> Result<String, MetricsError> {
    // Stage 1: Parse records
    let records = FixationAdapter::parse_array(json)?;

    // Stage 2: Per-participant metrics
    let mut processor = MetricsProcessor::from_config(config);
    processor.add_records(&records, DEFAULT_PARTICIPANT);

    // Stage 3: Cohort aggregation
    let run = processor.finish()?;

    // Stage 4: Chapters
    let mut sink = CollectingSink::new();
    let chapters = assemble_chapters(&run, config, &mut sink)?;

    // Stage 5: Encode
    ReportEncoder::new().encode_to_json(&run, &chapters)
}

/// A participant or input source left out of the cohort, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedParticipant {
    /// 1-based position among all inputs, computed or skipped
    pub position: usize,
    pub participant: String,
    pub reason: String,
}

/// Outcome of one report run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRun {
    /// Participants that were computed, in input order
    pub participants: Vec<ParticipantMetrics>,
    pub skipped: Vec<SkippedParticipant>,
    /// Absent when no participant produced metrics
    pub cohort: Option<CohortMetrics>,
    /// Present when task events were supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_times: Option<TaskTimes>,
}

impl CohortRun {
    /// Input position of every computed participant, in `participants` order.
    ///
    /// Skipped inputs keep their positions, so figure numbers stay aligned
    /// with the input order.
    pub fn input_positions(&self) -> Vec<usize> {
        let mut positions = Vec::with_capacity(self.participants.len());
        let mut position = 0;
        for _ in &self.participants {
            position += 1;
            while self.skipped.iter().any(|s| s.position == position) {
                position += 1;
            }
            positions.push(position);
        }
        positions
    }

    /// 1-based input position of a computed participant, used in figure names
    pub fn position_of(&self, participant: &str) -> Option<usize> {
        let index = self
            .participants
            .iter()
            .position(|p| p.participant == participant)?;
        self.input_positions().get(index).copied()
    }
}

/// Stateful processor that accumulates participants for one cohort.
///
/// A malformed participant log is recorded as skipped and does not stop the
/// remaining participants.
pub struct MetricsProcessor {
    strategy: DwellStrategy,
    task_names: Vec<String>,
    inputs: usize,
    participants: Vec<ParticipantMetrics>,
    skipped: Vec<SkippedParticipant>,
    task_events: Vec<TaskEvent>,
}

impl Default for MetricsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProcessor {
    /// Create a processor using episode-based dwell times
    pub fn new() -> Self {
        Self::with_strategy(DwellStrategy::default())
    }

    /// Create a processor with a specific dwell strategy
    pub fn with_strategy(strategy: DwellStrategy) -> Self {
        Self {
            strategy,
            task_names: Vec::new(),
            inputs: 0,
            participants: Vec::new(),
            skipped: Vec::new(),
            task_events: Vec::new(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        let mut processor = Self::with_strategy(config.dwell_strategy);
        processor.task_names = config.time_on_task.task_names.clone();
        processor
    }

    /// Compute one participant's metrics.
    ///
    /// Returns `false` when the log was rejected and recorded as skipped.
    pub fn add_log(&mut self, log: &EventLog) -> bool {
        let position = self.next_position();
        match compute_participant(log, self.strategy) {
            Ok(metrics) => {
                self.participants.push(metrics);
                true
            }
            Err(e) => {
                self.skip(position, log.participant(), &e);
                false
            }
        }
    }

    /// Split raw records by participant and add every resulting log.
    ///
    /// A record set that cannot be split is skipped as a whole under
    /// `default_participant`.
    pub fn add_records(&mut self, records: &[FixationRecord], default_participant: &str) {
        let groups = match FixationAdapter::split_by_participant(records, default_participant) {
            Ok(groups) => groups,
            Err(e) => {
                self.skip_input(default_participant, &e);
                return;
            }
        };

        for (participant, rows) in groups {
            match FixationAdapter::to_event_log(&rows, &participant) {
                Ok(log) => {
                    self.add_log(&log);
                }
                Err(e) => self.skip_input(&participant, &e),
            }
        }
    }

    /// Record an input that could not be read or parsed.
    ///
    /// It takes an input position like a participant would, so later
    /// participants keep their numbering.
    pub fn skip_input(&mut self, source: &str, error: &MetricsError) {
        let position = self.next_position();
        self.skip(position, source, error);
    }

    /// Add task events for the time-on-task table
    pub fn add_task_events(&mut self, events: &[TaskEvent]) {
        self.task_events.extend_from_slice(events);
    }

    fn next_position(&mut self) -> usize {
        self.inputs += 1;
        self.inputs
    }

    fn skip(&mut self, position: usize, participant: &str, error: &MetricsError) {
        log::warn!("Skipping {}: {}", participant, error);
        self.skipped.push(SkippedParticipant {
            position,
            participant: participant.to_string(),
            reason: error.to_string(),
        });
    }

    /// Number of participants computed so far
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn skipped(&self) -> &[SkippedParticipant] {
        &self.skipped
    }

    /// Fold the accumulated participants into a cohort
    pub fn finish(self) -> Result<CohortRun, MetricsError> {
        let cohort = match MetricsAggregator::fold(&self.participants) {
            Ok(cohort) => Some(cohort),
            Err(e) if e.is_recoverable() => {
                log::warn!("No cohort aggregate: {}", e);
                None
            }
            Err(e) => return Err(e),
        };

        let task_times = if self.task_events.is_empty() {
            None
        } else {
            Some(TaskTimer::compute(&self.task_events, &self.task_names))
        };

        log::info!(
            "Cohort run: {} participants, {} skipped",
            self.participants.len(),
            self.skipped.len()
        );

        Ok(CohortRun {
            participants: self.participants,
            skipped: self.skipped,
            cohort,
            task_times,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Fixation;

    fn log_of(participant: &str, labels: &[&str]) -> EventLog {
        let fixations = labels
            .iter()
            .enumerate()
            .map(|(i, aoi)| Fixation::new(*aoi, i as f64, i as f64 + 0.5))
            .collect();
        EventLog::new(participant, fixations)
    }

    #[test]
    fn test_compute_participant() {
        let log = log_of("Participant 1", &["A", "B", "A", "A", "C"]);
        let metrics = compute_participant(&log, DwellStrategy::EpisodeBased).unwrap();

        assert_eq!(metrics.participant, "Participant 1");
        assert_eq!(metrics.fixation_count, 5);
        assert_eq!(metrics.aois, vec!["A", "B", "C"]);
        assert_eq!(metrics.revisits.get("A"), Some(2));
        assert_eq!(metrics.transitions.total(), 4);
        assert_eq!(metrics.fixations.get("A").unwrap().len(), 3);
    }

    #[test]
    fn test_compute_participant_empty_log() {
        let log = EventLog::new("Participant 3", vec![]);
        let err = compute_participant(&log, DwellStrategy::EpisodeBased).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
        assert!(err.to_string().contains("Participant 3"));
    }

    #[test]
    fn test_processor_skips_bad_participant() {
        let mut processor = MetricsProcessor::new();
        assert!(processor.add_log(&log_of("Participant 1", &["A", "B"])));
        assert!(!processor.add_log(&EventLog::new("Participant 2", vec![])));
        assert!(processor.add_log(&log_of("Participant 3", &["B", "C"])));

        assert_eq!(processor.participant_count(), 2);
        assert_eq!(processor.skipped()[0].participant, "Participant 2");

        let run = processor.finish().unwrap();
        let cohort = run.cohort.unwrap();
        assert_eq!(cohort.participants, vec!["Participant 1", "Participant 3"]);
        assert_eq!(cohort.aois, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_processor_without_participants_has_no_cohort() {
        let run = MetricsProcessor::new().finish().unwrap();
        assert!(run.cohort.is_none());
        assert!(run.participants.is_empty());
    }

    #[test]
    fn test_add_records_splits_and_skips_malformed() {
        let mut good = FixationRecord::new("Screen", 0.0, 1.0);
        good.participant = Some("P1".to_string());
        let mut bad = FixationRecord::new("Knob", 2.0, 1.0);
        bad.participant = Some("P2".to_string());
        let orphan = FixationRecord::new("Knob", 0.0, 0.5);

        let mut processor = MetricsProcessor::new();
        processor.add_records(&[good, bad, orphan], DEFAULT_PARTICIPANT);

        let run = processor.finish().unwrap();
        let names: Vec<&str> = run.participants.iter().map(|p| p.participant.as_str()).collect();
        assert_eq!(names, vec!["P1", "Participant 1"]);
        assert_eq!(run.skipped.len(), 1);
        assert!(run.skipped[0].reason.contains("row 1"));
        assert_eq!(run.skipped[0].position, 2);
        assert_eq!(run.position_of("Participant 1"), Some(3));
    }

    #[test]
    fn test_input_positions_survive_skips() {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["A", "B"]));
        processor.add_log(&EventLog::new("Participant 2", vec![]));
        processor.add_log(&log_of("Participant 3", &["B", "C"]));
        processor.add_log(&log_of("Participant 4", &["C", "A"]));

        let run = processor.finish().unwrap();
        assert_eq!(run.input_positions(), vec![1, 3, 4]);
        assert_eq!(run.position_of("Participant 3"), Some(3));
        assert_eq!(run.position_of("Participant 2"), None);
    }

    #[test]
    fn test_unreadable_input_keeps_numbering() {
        let mut processor = MetricsProcessor::new();
        let error = MetricsError::ParseError("Failed to parse line 3: expected value".to_string());
        processor.skip_input("data/participant1.ndjson", &error);
        processor.add_log(&log_of("Participant 2", &["A", "B"]));

        let run = processor.finish().unwrap();
        assert_eq!(run.skipped[0].participant, "data/participant1.ndjson");
        assert_eq!(run.skipped[0].position, 1);
        assert!(run.skipped[0].reason.contains("line 3"));
        assert_eq!(run.position_of("Participant 2"), Some(2));
        assert!(run.cohort.is_some());
    }

    #[test]
    fn test_add_records_skips_default_name_collision() {
        let mut named = FixationRecord::new("Screen", 0.0, 1.0);
        named.participant = Some(DEFAULT_PARTICIPANT.to_string());
        let unnamed = FixationRecord::new("Knob", 1.0, 1.5);

        let mut processor = MetricsProcessor::new();
        processor.add_records(&[named, unnamed], DEFAULT_PARTICIPANT);

        assert_eq!(processor.participant_count(), 0);
        assert_eq!(processor.skipped()[0].participant, DEFAULT_PARTICIPANT);
        assert!(processor.skipped()[0].reason.contains("merge"));
    }

    #[test]
    fn test_task_events_become_task_times() {
        let mut config = ReportConfig::default();
        config.time_on_task.task_names = vec!["Set alarm".to_string()];

        let mut processor = MetricsProcessor::from_config(&config);
        processor.add_log(&log_of("Participant 1", &["A", "B"]));
        processor.add_task_events(&[
            TaskEvent::new("Participant 1", "Task1", 4.0),
            TaskEvent::new("Participant 1", "Task1", 10.0),
        ]);

        let run = processor.finish().unwrap();
        let times = run.task_times.unwrap();
        assert_eq!(times.tasks, vec!["Set alarm"]);
        assert_eq!(times.rows[0].times, vec![Some(6.0)]);
    }

    #[test]
    fn test_no_task_events_no_task_times() {
        let mut processor = MetricsProcessor::new();
        processor.add_log(&log_of("Participant 1", &["A", "B"]));
        assert!(processor.finish().unwrap().task_times.is_none());
    }

    #[test]
    fn test_fixations_to_report() {
        let json = r#"[
            {"participant": "P1", "aoi": "Screen", "start_time": 0.0, "end_time": 0.5},
            {"participant": "P1", "aoi": "Knob", "start_time": 0.5, "end_time": 0.8},
            {"participant": "P1", "aoi": "Screen", "start_time": 0.8, "end_time": 1.0},
            {"participant": "P2", "aoi": "Knob", "start_time": 0.0, "end_time": 0.4},
            {"participant": "P2", "aoi": "Screen", "start_time": 0.4, "end_time": 0.9}
        ]"#;

        let report = fixations_to_report(json, &ReportConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();

        assert_eq!(value["participants"].as_array().unwrap().len(), 2);
        assert_eq!(value["cohort"]["aois"][0], "Screen");
        assert_eq!(value["chapters"].as_array().unwrap().len(), 3);
    }
}
