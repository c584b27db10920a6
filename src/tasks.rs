//! Time on task
//!
//! A task's completion time is the timestamp of its second `Task{n}` event
//! minus that of its first, per participant. Tasks with fewer than two events
//! have no time. Participants and tasks left without any time are dropped
//! from the table.

use crate::schema::TaskEvent;
use crate::tables::{DataTable, TableRow};
use serde::Serialize;

/// Column name of a task without a configured name
pub const GENERIC_TASK_NAME: &str = "Critical task";

/// Completion times of one participant, in task column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTimeRow {
    pub participant: String,
    /// 1-based position among the participants of the event export
    pub position: usize,
    pub times: Vec<Option<f64>>,
}

/// Participants by tasks table of completion times in seconds
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TaskTimes {
    pub tasks: Vec<String>,
    pub rows: Vec<TaskTimeRow>,
}

impl TaskTimes {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, participant: &str) -> Option<&TaskTimeRow> {
        self.rows.iter().find(|r| r.participant == participant)
    }

    /// All participants as rows, tasks as columns
    pub fn to_table(&self, title: &str) -> DataTable {
        let mut table = DataTable::new(title, "Participant", self.tasks.clone());
        table.rows = self
            .rows
            .iter()
            .map(|row| TableRow {
                label: row.participant.clone(),
                values: row.times.clone(),
            })
            .collect();
        table
    }

    /// One participant's times as a single-row table
    pub fn participant_table(&self, row: &TaskTimeRow, title: &str) -> DataTable {
        let mut table = DataTable::new(title, "Participant", self.tasks.clone());
        table.rows.push(TableRow {
            label: row.participant.clone(),
            values: row.times.clone(),
        });
        table
    }
}

/// Task completion time computation over an event export
pub struct TaskTimer;

impl TaskTimer {
    /// Compute completion times.
    ///
    /// The task count is the larger of the highest task number in the events
    /// and the number of configured names. Tasks beyond the configured names
    /// are called `Critical task {n}`. Malformed events are logged and ignored.
    pub fn compute(events: &[TaskEvent], task_names: &[String]) -> TaskTimes {
        // Stage 1: Participants in first-seen order, valid events only
        let mut participants: Vec<&str> = Vec::new();
        let mut valid: Vec<(&TaskEvent, usize)> = Vec::with_capacity(events.len());
        for (idx, event) in events.iter().enumerate() {
            if let Err(e) = event.validate() {
                log::warn!("Ignoring task event {}: {}", idx + 1, e);
                continue;
            }
            let Some(number) = event.task_number() else {
                continue;
            };
            if !participants.contains(&event.participant.as_str()) {
                participants.push(&event.participant);
            }
            valid.push((event, number));
        }

        let task_count = valid
            .iter()
            .map(|(_, number)| *number)
            .max()
            .unwrap_or(0)
            .max(task_names.len());

        // Stage 2: First two events of every participant and task
        let mut rows: Vec<TaskTimeRow> = participants
            .iter()
            .enumerate()
            .map(|(i, participant)| {
                let times = (1..=task_count)
                    .map(|task| {
                        let mut seconds = valid
                            .iter()
                            .filter(|(e, number)| *number == task && e.participant == *participant)
                            .map(|(e, _)| e.seconds);
                        let start = seconds.next()?;
                        let end = seconds.next()?;
                        Some(end - start)
                    })
                    .collect();
                TaskTimeRow {
                    participant: participant.to_string(),
                    position: i + 1,
                    times,
                }
            })
            .collect();

        // Stage 3: Drop participants, then tasks, without any time
        rows.retain(|row| row.times.iter().any(Option::is_some));
        let kept: Vec<usize> = (0..task_count)
            .filter(|&task| rows.iter().any(|row| row.times[task].is_some()))
            .collect();

        let tasks = kept
            .iter()
            .map(|&task| {
                task_names
                    .get(task)
                    .cloned()
                    .unwrap_or_else(|| format!("{} {}", GENERIC_TASK_NAME, task + 1))
            })
            .collect();
        for row in &mut rows {
            row.times = kept.iter().map(|&task| row.times[task]).collect();
        }

        log::debug!(
            "Time on task: {} participants over {} tasks",
            rows.len(),
            kept.len()
        );

        TaskTimes { tasks, rows }
    }
}
