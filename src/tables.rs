//! Labeled data tables
//!
//! `DataTable` is the AOI-indexed numeric table handed to the charting
//! collaborator. `TextTable` is its string form for the table-rendering
//! collaborator: a bold, shaded header row and cells rounded to a fixed
//! number of decimals.

use crate::error::MetricsError;
use crate::fixations::SampleSummary;
use crate::types::{CohortMetrics, FixationSamples, ParticipantMetrics, ProportionMatrix, TransitionMatrix};
use serde::Serialize;

/// Header shading of text tables (light grey)
pub const HEADER_SHADING: &str = "D0CECE";

/// Header row of the dwell times and revisits table
pub const DWELL_TABLE_HEADER: [&str; 6] = [
    "AOI",
    "Dwell times [s]",
    "Average [s]",
    "Max [s]",
    "Min [s]",
    "Revisits",
];

/// Row label of the cohort mean in per-participant tables
pub const MEAN_ROW: &str = "Mean";

/// One labeled row; `None` cells carry no data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Row-labeled numeric table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    pub title: String,
    /// Header of the row-label column
    pub index_label: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl DataTable {
    pub fn new(
        title: impl Into<String>,
        index_label: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            index_label: index_label.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the columns
    pub fn push_row(
        &mut self,
        label: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), MetricsError> {
        let label = label.into();
        if values.len() != self.columns.len() {
            return Err(MetricsError::InvalidInput(format!(
                "row '{}' of table '{}' has {} values for {} columns",
                label,
                self.title,
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(TableRow { label, values });
        Ok(())
    }

    /// Whether the table has no numeric cell at all
    pub fn is_empty(&self) -> bool {
        self.rows
            .iter()
            .all(|row| row.values.iter().all(Option::is_none))
    }

    /// `NoData` when the table has nothing to plot
    pub fn require_data(&self) -> Result<(), MetricsError> {
        if self.is_empty() {
            return Err(MetricsError::NoData(format!("table '{}' is empty", self.title)));
        }
        Ok(())
    }

    pub fn row(&self, label: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r.values[index]).collect())
    }

    /// Render every cell as text with the given rounding
    pub fn to_text(&self, decimals: u32) -> TextTable {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(self.index_label.clone());
        header.extend(self.columns.iter().cloned());

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.values.len() + 1);
                cells.push(row.label.clone());
                cells.extend(row.values.iter().map(|v| format_optional(*v, decimals)));
                cells
            })
            .collect();

        TextTable {
            title: self.title.clone(),
            header,
            rows,
            header_bold: true,
            header_shading: HEADER_SHADING.to_string(),
        }
    }
}

/// Table of strings ready for a document table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTable {
    pub title: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub header_bold: bool,
    /// Hex fill of the header cells
    pub header_shading: String,
}

impl TextTable {
    /// Column-aligned plain text, for terminals and logs
    pub fn to_plain_string(&self) -> String {
        let columns = self.header.len();
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let render = |cells: &[String]| -> String {
            cells
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![self.title.clone(), render(&self.header)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        lines.extend(self.rows.iter().map(|row| render(row)));
        lines.join("\n") + "\n"
    }
}

/// Round to `decimals` places and print the way report cells expect:
/// integral values keep a trailing `.0`, missing values print `nan`.
///
/// Rounding works on the exact binary value, so `3.53265` prints as `3.5326` because the stored double is just below
/// the half.
pub fn format_cell(value: f64, decimals: u32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let fixed = format!("{:.*}", decimals as usize, value);
    let text = match fixed.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", fixed),
    };

    // Tiny negatives rounded to zero print as "0.0"
    if text == "-0.0" {
        "0.0".to_string()
    } else {
        text
    }
}

fn format_optional(value: Option<f64>, decimals: u32) -> String {
    format_cell(value.unwrap_or(f64::NAN), decimals)
}

fn some_if_number(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Cohort dwell statistics with the mean revisits, one row per AOI
pub fn dwell_revisit_table(cohort: &CohortMetrics) -> DataTable {
    let columns = DWELL_TABLE_HEADER[1..].iter().map(|c| c.to_string()).collect();
    let mut table = DataTable::new("Dwell times and revisits", DWELL_TABLE_HEADER[0], columns);

    for (dwell, revisits) in cohort.dwell.iter().zip(&cohort.revisits) {
        table.rows.push(TableRow {
            label: dwell.aoi.clone(),
            values: vec![
                some_if_number(dwell.sum),
                some_if_number(dwell.mean),
                some_if_number(dwell.max),
                some_if_number(dwell.min),
                some_if_number(revisits.mean),
            ],
        });
    }

    table
}

/// Revisits of every participant over the cohort AOIs, with a trailing mean row
pub fn revisits_by_participant(
    participants: &[ParticipantMetrics],
    cohort: &CohortMetrics,
) -> DataTable {
    let mut table = DataTable::new("Revisits", "Participant", cohort.aois.clone());

    for participant in participants {
        table.rows.push(TableRow {
            label: participant.participant.clone(),
            values: cohort
                .aois
                .iter()
                .map(|aoi| participant.revisits.get(aoi).map(f64::from))
                .collect(),
        });
    }

    table.rows.push(TableRow {
        label: MEAN_ROW.to_string(),
        values: cohort
            .revisits
            .iter()
            .map(|r| some_if_number(r.mean))
            .collect(),
    });

    table
}

/// Transition counts, rows = source AOI, columns = destination AOI
pub fn transition_count_table(title: &str, matrix: &TransitionMatrix) -> DataTable {
    let mut table = DataTable::new(title, "AOI source (from)", matrix.aois.clone());
    for (aoi, row) in matrix.aois.iter().zip(&matrix.counts) {
        table.rows.push(TableRow {
            label: aoi.clone(),
            values: row.iter().map(|&c| Some(c as f64)).collect(),
        });
    }
    table
}

/// Transition shares, rows = source AOI, columns = destination AOI
pub fn transition_share_table(title: &str, matrix: &ProportionMatrix) -> DataTable {
    let mut table = DataTable::new(title, "AOI source (from)", matrix.aois.clone());
    for (aoi, row) in matrix.aois.iter().zip(&matrix.values) {
        table.rows.push(TableRow {
            label: aoi.clone(),
            values: row.iter().map(|&v| Some(v)).collect(),
        });
    }
    table
}

/// Wide sample table: one column per AOI, shorter columns padded with no-data
pub fn fixation_sample_table(title: &str, samples: &FixationSamples) -> DataTable {
    let columns = samples.entries.iter().map(|e| e.aoi.clone()).collect();
    let mut table = DataTable::new(title, "Fixation", columns);

    let depth = samples
        .entries
        .iter()
        .map(|e| e.durations.len())
        .max()
        .unwrap_or(0);
    for i in 0..depth {
        table.rows.push(TableRow {
            label: (i + 1).to_string(),
            values: samples
                .entries
                .iter()
                .map(|e| e.durations.get(i).copied())
                .collect(),
        });
    }

    table
}

/// Descriptive statistics of fixation durations, one row per AOI
pub fn fixation_summary_table(title: &str, samples: &FixationSamples) -> DataTable {
    let columns = [
        "Count", "Mean [s]", "CI95 [s]", "Min [s]", "Q1 [s]", "Median [s]", "Q3 [s]", "Max [s]",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    let mut table = DataTable::new(title, "AOI", columns);

    for entry in &samples.entries {
        let values = match SampleSummary::from_samples(&entry.durations) {
            Some(s) => vec![
                Some(s.count as f64),
                Some(s.mean),
                Some(s.ci95),
                Some(s.min),
                Some(s.q1),
                Some(s.median),
                Some(s.q3),
                Some(s.max),
            ],
            None => vec![Some(0.0), None, None, None, None, None, None, None],
        };
        table.rows.push(TableRow {
            label: entry.aoi.clone(),
            values,
        });
    }

    table
}
