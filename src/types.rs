//! Core data types for the eye-tracking metrics engine
//!
//! This module defines the fixation event model and the per-participant and
//! cohort-level metric structures that flow through the pipeline.

use crate::error::MetricsError;
use serde::{Deserialize, Serialize};

/// One gaze fixation on an area of interest.
///
/// `fixation_duration` is kept independently of `end_time - start_time`;
/// exports may supply a duration that differs from the timestamp span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    /// Area-of-interest label
    pub aoi: String,
    /// Fixation start in seconds
    pub start_time: f64,
    /// Fixation end in seconds
    pub end_time: f64,
    /// Fixation duration in seconds
    pub fixation_duration: f64,
}

impl Fixation {
    /// Create a fixation whose duration is derived from its timestamps
    pub fn new(aoi: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            aoi: aoi.into(),
            start_time,
            end_time,
            fixation_duration: end_time - start_time,
        }
    }

    /// Create a fixation with an explicitly supplied duration
    pub fn with_duration(
        aoi: impl Into<String>,
        start_time: f64,
        end_time: f64,
        fixation_duration: f64,
    ) -> Self {
        Self {
            aoi: aoi.into(),
            start_time,
            end_time,
            fixation_duration,
        }
    }
}

/// Time-ordered fixation sequence for one participant.
///
/// Log order is the temporal order. Nothing in the engine re-sorts a log by
/// timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    participant: String,
    fixations: Vec<Fixation>,
}

impl EventLog {
    pub fn new(participant: impl Into<String>, fixations: Vec<Fixation>) -> Self {
        Self {
            participant: participant.into(),
            fixations,
        }
    }

    /// Participant identifier used in diagnostics and table row labels
    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn fixations(&self) -> &[Fixation] {
        &self.fixations
    }

    pub fn len(&self) -> usize {
        self.fixations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fixation> {
        self.fixations.iter()
    }

    /// AOI labels in log order, duplicates included
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fixations.iter().map(|f| f.aoi.as_str())
    }

    /// Fail with `InvalidInput` when the log has no rows
    pub fn require_non_empty(&self, stage: &str) -> Result<(), MetricsError> {
        if self.fixations.is_empty() {
            return Err(MetricsError::InvalidInput(format!(
                "{}: event log for {} is empty",
                stage, self.participant
            )));
        }
        Ok(())
    }
}

/// How dwell durations are derived from a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellStrategy {
    /// Merge consecutive same-AOI fixations into dwell episodes
    #[default]
    EpisodeBased,
    /// Each fixation row counts on its own with its `fixation_duration`
    FlatSum,
}

/// Which dwell statistic to read or pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellStatistic {
    Sum,
    Mean,
    Max,
    Min,
}

impl DwellStatistic {
    pub const ALL: [DwellStatistic; 4] = [
        DwellStatistic::Sum,
        DwellStatistic::Mean,
        DwellStatistic::Max,
        DwellStatistic::Min,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DwellStatistic::Sum => "Sum",
            DwellStatistic::Mean => "Mean",
            DwellStatistic::Max => "Max",
            DwellStatistic::Min => "Min",
        }
    }
}

/// Aggregate statistics over the dwell durations of one AOI.
///
/// With zero durations every statistic is NaN, meaning "no data".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DwellStats {
    /// Number of durations the statistics were computed from
    pub episodes: usize,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

impl DwellStats {
    /// Statistics with no contributing durations
    pub fn empty() -> Self {
        Self {
            episodes: 0,
            sum: f64::NAN,
            mean: f64::NAN,
            max: f64::NAN,
            min: f64::NAN,
        }
    }

    /// Compute sum/mean/max/min over a set of durations
    pub fn from_durations(durations: &[f64]) -> Self {
        if durations.is_empty() {
            return Self::empty();
        }

        let sum: f64 = durations.iter().sum();
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);

        Self {
            episodes: durations.len(),
            sum,
            mean: sum / durations.len() as f64,
            max,
            min,
        }
    }

    pub fn has_data(&self) -> bool {
        self.episodes > 0
    }

    pub fn get(&self, statistic: DwellStatistic) -> f64 {
        match statistic {
            DwellStatistic::Sum => self.sum,
            DwellStatistic::Mean => self.mean,
            DwellStatistic::Max => self.max,
            DwellStatistic::Min => self.min,
        }
    }
}

/// Dwell statistics of one AOI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AoiDwell {
    pub aoi: String,
    pub stats: DwellStats,
}

/// Per-AOI dwell statistics in AOI order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellTable {
    pub strategy: DwellStrategy,
    pub entries: Vec<AoiDwell>,
}

impl DwellTable {
    pub fn aois(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.aoi.as_str())
    }

    /// Look up the statistics of an AOI; unknown labels are `InvalidInput`
    pub fn get(&self, aoi: &str) -> Result<&DwellStats, MetricsError> {
        self.entries
            .iter()
            .find(|e| e.aoi == aoi)
            .map(|e| &e.stats)
            .ok_or_else(|| MetricsError::InvalidInput(format!("AOI '{}' not in dwell table", aoi)))
    }
}

/// Revisit count of one AOI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AoiRevisits {
    pub aoi: String,
    /// Raw fixation rows with this label, minus one
    pub revisits: u32,
}

/// Per-AOI revisit counts in AOI order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevisitCounts {
    pub entries: Vec<AoiRevisits>,
}

impl RevisitCounts {
    pub fn get(&self, aoi: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.aoi == aoi)
            .map(|e| e.revisits)
    }
}

/// Square AOI x AOI count matrix; row = source, column = destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    pub aois: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl TransitionMatrix {
    /// All-zero matrix over the given AOI labels
    pub fn zeros(aois: Vec<String>) -> Self {
        let n = aois.len();
        Self {
            aois,
            counts: vec![vec![0; n]; n],
        }
    }

    pub fn index_of(&self, aoi: &str) -> Option<usize> {
        self.aois.iter().position(|a| a == aoi)
    }

    /// Count of transitions from `from` to `to`, if both labels exist
    pub fn get(&self, from: &str, to: &str) -> Option<u64> {
        let i = self.index_of(from)?;
        let j = self.index_of(to)?;
        Some(self.counts[i][j])
    }

    /// Grand total of all cells
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.aois.is_empty()
    }
}

/// Transition matrix divided by its grand total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionMatrix {
    pub aois: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Raw fixation durations of one AOI, in log order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiSamples {
    pub aoi: String,
    pub durations: Vec<f64>,
}

/// Per-AOI fixation duration samples in AOI order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FixationSamples {
    pub entries: Vec<AoiSamples>,
}

impl FixationSamples {
    pub fn get(&self, aoi: &str) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|e| e.aoi == aoi)
            .map(|e| e.durations.as_slice())
    }

    /// Total number of samples across all AOIs
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.durations.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All metrics derived from one participant's event log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantMetrics {
    pub participant: String,
    /// Number of fixation rows in the source log
    pub fixation_count: usize,
    /// AOIs in first-seen order
    pub aois: Vec<String>,
    pub dwell: DwellTable,
    pub revisits: RevisitCounts,
    pub transitions: TransitionMatrix,
    pub fixations: FixationSamples,
}

/// Cohort dwell statistics of one AOI: the mean of each participant statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortDwell {
    pub aoi: String,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    /// Participants that had dwell data for this AOI
    pub contributors: usize,
}

impl CohortDwell {
    pub fn get(&self, statistic: DwellStatistic) -> f64 {
        match statistic {
            DwellStatistic::Sum => self.sum,
            DwellStatistic::Mean => self.mean,
            DwellStatistic::Max => self.max,
            DwellStatistic::Min => self.min,
        }
    }
}

/// Cohort revisit mean of one AOI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRevisits {
    pub aoi: String,
    pub mean: f64,
    pub contributors: usize,
}

/// Cohort view folded from all participant results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMetrics {
    /// Participants that contributed, in input order
    pub participants: Vec<String>,
    /// Union of participant AOIs in first-appearance order
    pub aois: Vec<String>,
    pub dwell: Vec<CohortDwell>,
    pub revisits: Vec<CohortRevisits>,
    /// Element-wise sum of participant matrices over the union AOIs
    pub transitions: TransitionMatrix,
    /// Pooled fixation duration samples over the union AOIs
    pub fixations: FixationSamples,
}
