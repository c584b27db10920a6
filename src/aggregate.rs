//! Cohort aggregation
//!
//! Folds a finished list of per-participant results into one cohort view.
//! Every pooled statistic is a mean over the participants that actually have
//! a value for the AOI; absent AOIs and NaN statistics are left out of the
//! mean rather than counted as zero.

use crate::aoi::union_of;
use crate::error::MetricsError;
use crate::fixations::pool_samples;
use crate::types::{
    CohortDwell, CohortMetrics, CohortRevisits, DwellStatistic, DwellStats, ParticipantMetrics,
    TransitionMatrix,
};

/// Aggregator from participant metrics to cohort metrics
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Fold participant results into cohort metrics.
    ///
    /// An empty participant list is `NoData`.
    pub fn fold(participants: &[ParticipantMetrics]) -> Result<CohortMetrics, MetricsError> {
        if participants.is_empty() {
            return Err(MetricsError::NoData(
                "no participant results to aggregate".to_string(),
            ));
        }

        let aois = union_of(participants.iter().map(|p| p.aois.as_slice()));

        let dwell = aois
            .iter()
            .map(|aoi| {
                let (sum, contributors) =
                    Self::pooled_mean(participants, |p| dwell_value(p, aoi, DwellStatistic::Sum));
                let (mean, _) =
                    Self::pooled_mean(participants, |p| dwell_value(p, aoi, DwellStatistic::Mean));
                let (max, _) =
                    Self::pooled_mean(participants, |p| dwell_value(p, aoi, DwellStatistic::Max));
                let (min, _) =
                    Self::pooled_mean(participants, |p| dwell_value(p, aoi, DwellStatistic::Min));
                CohortDwell {
                    aoi: aoi.clone(),
                    sum,
                    mean,
                    max,
                    min,
                    contributors,
                }
            })
            .collect();

        let revisits = aois
            .iter()
            .map(|aoi| {
                let (mean, contributors) = Self::pooled_mean(participants, |p| {
                    p.revisits.get(aoi).map(|r| r as f64)
                });
                CohortRevisits {
                    aoi: aoi.clone(),
                    mean,
                    contributors,
                }
            })
            .collect();

        let mut transitions = TransitionMatrix::zeros(aois.clone());
        for participant in participants {
            transitions.accumulate(&participant.transitions.reindexed(&aois))?;
        }

        let fixations = pool_samples(&aois, participants.iter().map(|p| &p.fixations));

        log::info!(
            "Aggregated {} participants over {} AOIs ({} transitions)",
            participants.len(),
            aois.len(),
            transitions.total()
        );

        Ok(CohortMetrics {
            participants: participants.iter().map(|p| p.participant.clone()).collect(),
            aois,
            dwell,
            revisits,
            transitions,
            fixations,
        })
    }

    /// Mean of a per-participant value, skipping participants without one.
    ///
    /// Returns the mean (NaN when nobody contributes) and the contributor count.
    pub fn pooled_mean<F>(participants: &[ParticipantMetrics], value: F) -> (f64, usize)
    where
        F: Fn(&ParticipantMetrics) -> Option<f64>,
    {
        let values: Vec<f64> = participants
            .iter()
            .filter_map(value)
            .filter(|v| !v.is_nan())
            .collect();

        if values.is_empty() {
            return (f64::NAN, 0);
        }
        (values.iter().sum::<f64>() / values.len() as f64, values.len())
    }
}

/// Dwell statistics of a participant for an AOI from the cohort union
pub fn participant_dwell<'a>(
    participant: &'a ParticipantMetrics,
    aoi: &str,
) -> Result<&'a DwellStats, MetricsError> {
    if !participant.aois.iter().any(|a| a == aoi) {
        return Err(MetricsError::MissingAoi {
            aoi: aoi.to_string(),
            participant: participant.participant.clone(),
        });
    }
    participant.dwell.get(aoi)
}

fn dwell_value(participant: &ParticipantMetrics, aoi: &str, statistic: DwellStatistic) -> Option<f64> {
    match participant_dwell(participant, aoi) {
        Ok(stats) if stats.has_data() => Some(stats.get(statistic)),
        Ok(_) => None,
        Err(e) => {
            log::trace!("Excluded from cohort mean: {}", e);
            None
        }
    }
}
