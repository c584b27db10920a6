//! Revisit counting
//!
//! A revisit count is the number of fixation rows on an AOI minus one. Rows
//! are counted individually, so consecutive fixations on the same AOI each
//! add a revisit even without an intervening AOI.

use crate::error::MetricsError;
use crate::types::{AoiRevisits, EventLog, RevisitCounts};

/// Revisit counter over raw fixation rows
pub struct RevisitCounter;

impl RevisitCounter {
    /// Count revisits for each AOI in the given order.
    ///
    /// An AOI that never occurs in the log is `InvalidInput`.
    pub fn count(aois: &[String], log: &EventLog) -> Result<RevisitCounts, MetricsError> {
        let entries = aois
            .iter()
            .map(|aoi| {
                let rows = log.labels().filter(|label| *label == aoi.as_str()).count();
                if rows == 0 {
                    return Err(MetricsError::InvalidInput(format!(
                        "AOI '{}' does not occur in the event log of {}",
                        aoi,
                        log.participant()
                    )));
                }
                Ok(AoiRevisits {
                    aoi: aoi.clone(),
                    revisits: revisits_from_rows(aoi, rows)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RevisitCounts { entries })
    }
}

fn revisits_from_rows(aoi: &str, rows: usize) -> Result<u32, MetricsError> {
    u32::try_from(rows.saturating_sub(1)).map_err(|_| {
        MetricsError::InvalidInput(format!(
            "AOI '{}' has {} fixation rows, too many to count revisits",
            aoi, rows
        ))
    })
}
