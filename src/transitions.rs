//! Transition-frequency matrices
//!
//! Every consecutive pair of fixation rows adds one count to
//! `matrix[source][destination]`. Pairs on the same AOI are counted too and
//! land on the diagonal; dwell segmentation treats those repeats as "no
//! transition", so heatmaps show them separately from real AOI changes.

use crate::error::MetricsError;
use crate::types::{EventLog, ProportionMatrix, TransitionMatrix};

/// Builder for AOI x AOI transition count matrices
pub struct TransitionMatrixBuilder;

impl TransitionMatrixBuilder {
    /// Count transitions between consecutive fixations.
    ///
    /// Logs with fewer than two rows give an all-zero matrix. A label that is
    /// not part of `aois` is `InvalidInput`.
    pub fn build(aois: &[String], log: &EventLog) -> Result<TransitionMatrix, MetricsError> {
        let mut matrix = TransitionMatrix::zeros(aois.to_vec());

        let fixations = log.fixations();
        for pair in fixations.windows(2) {
            let from = index_in(&matrix, &pair[0].aoi, log)?;
            let to = index_in(&matrix, &pair[1].aoi, log)?;
            matrix.counts[from][to] += 1;
        }

        Ok(matrix)
    }
}

fn index_in(matrix: &TransitionMatrix, aoi: &str, log: &EventLog) -> Result<usize, MetricsError> {
    matrix.index_of(aoi).ok_or_else(|| {
        MetricsError::InvalidInput(format!(
            "AOI '{}' in the event log of {} is missing from the transition axes",
            aoi,
            log.participant()
        ))
    })
}

impl TransitionMatrix {
    /// Divide every cell by the grand total.
    ///
    /// A matrix without any transitions has nothing to normalize and is `NoData`.
    pub fn normalized(&self) -> Result<ProportionMatrix, MetricsError> {
        let total = self.total();
        if total == 0 {
            return Err(MetricsError::NoData(
                "transition matrix has no transitions to normalize".to_string(),
            ));
        }

        let total = total as f64;
        Ok(ProportionMatrix {
            aois: self.aois.clone(),
            values: self
                .counts
                .iter()
                .map(|row| row.iter().map(|&c| c as f64 / total).collect())
                .collect(),
        })
    }

    /// Re-index onto a superset of AOIs; labels absent here become zero rows and columns
    pub fn reindexed(&self, aois: &[String]) -> TransitionMatrix {
        let mut target = TransitionMatrix::zeros(aois.to_vec());
        let mapping: Vec<Option<usize>> = self.aois.iter().map(|a| target.index_of(a)).collect();

        for (i, row) in self.counts.iter().enumerate() {
            let Some(ti) = mapping[i] else { continue };
            for (j, &count) in row.iter().enumerate() {
                if let Some(tj) = mapping[j] {
                    target.counts[ti][tj] += count;
                }
            }
        }

        target
    }

    /// Add another matrix over the same axes cell by cell
    pub fn accumulate(&mut self, other: &TransitionMatrix) -> Result<(), MetricsError> {
        if self.aois != other.aois {
            return Err(MetricsError::InvalidInput(
                "transition matrices must share AOI axes to be summed".to_string(),
            ));
        }
        for (row, other_row) in self.counts.iter_mut().zip(&other.counts) {
            for (cell, &count) in row.iter_mut().zip(other_row) {
                *cell += count;
            }
        }
        Ok(())
    }
}
