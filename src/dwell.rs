//! Dwell-time segmentation
//!
//! A dwell episode is a maximal run of consecutive fixations on the same AOI.
//! Its duration runs from the start of the first fixation to the end of the
//! last one in the run.
//!
//! The episode scan closes an episode only when the AOI changes. The episode
//! still open when the log ends is never closed, so the last dwell of a log
//! does not contribute to the statistics. Reports produced so far depend on
//! this, so it is kept as-is.

use crate::aoi::areas_of_interest;
use crate::error::MetricsError;
use crate::types::{AoiDwell, DwellStats, DwellStrategy, DwellTable, EventLog};
use serde::Serialize;

/// A closed dwell episode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellEpisode {
    pub aoi: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl DwellEpisode {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Dwell segmenter for event logs
pub struct DwellSegmenter;

impl DwellSegmenter {
    /// Per-AOI dwell statistics for the AOIs of the log, in first-seen order
    pub fn segment(log: &EventLog, strategy: DwellStrategy) -> Result<DwellTable, MetricsError> {
        let aois = areas_of_interest(log);
        Self::segment_for(&aois, log, strategy)
    }

    /// Per-AOI dwell statistics for an explicit AOI list.
    ///
    /// AOIs without any closed episode get NaN statistics.
    pub fn segment_for(
        aois: &[String],
        log: &EventLog,
        strategy: DwellStrategy,
    ) -> Result<DwellTable, MetricsError> {
        log.require_non_empty("dwell segmentation")?;

        let entries = match strategy {
            DwellStrategy::EpisodeBased => {
                let episodes = dwell_episodes(log)?;
                aois.iter()
                    .map(|aoi| {
                        let durations: Vec<f64> = episodes
                            .iter()
                            .filter(|e| &e.aoi == aoi)
                            .map(DwellEpisode::duration)
                            .collect();
                        AoiDwell {
                            aoi: aoi.clone(),
                            stats: DwellStats::from_durations(&durations),
                        }
                    })
                    .collect()
            }
            DwellStrategy::FlatSum => aois
                .iter()
                .map(|aoi| {
                    let durations: Vec<f64> = log
                        .iter()
                        .filter(|f| &f.aoi == aoi)
                        .map(|f| f.fixation_duration)
                        .collect();
                    AoiDwell {
                        aoi: aoi.clone(),
                        stats: DwellStats::from_durations(&durations),
                    }
                })
                .collect(),
        };

        log::debug!(
            "{}: dwell statistics for {} AOIs ({:?})",
            log.participant(),
            aois.len(),
            strategy
        );

        Ok(DwellTable { strategy, entries })
    }
}

/// Closed dwell episodes of a log in log order.
///
/// The trailing open episode is not included.
pub fn dwell_episodes(log: &EventLog) -> Result<Vec<DwellEpisode>, MetricsError> {
    log.require_non_empty("dwell segmentation")?;

    let fixations = log.fixations();
    let first = &fixations[0];
    let mut current = DwellEpisode {
        aoi: first.aoi.clone(),
        start_time: first.start_time,
        end_time: first.end_time,
    };
    let mut closed = Vec::new();

    for fixation in &fixations[1..] {
        if fixation.aoi == current.aoi {
            current.end_time = fixation.end_time;
        } else {
            let next = DwellEpisode {
                aoi: fixation.aoi.clone(),
                start_time: fixation.start_time,
                end_time: fixation.end_time,
            };
            closed.push(std::mem::replace(&mut current, next));
        }
    }

    Ok(closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Fixation;

    fn sample_log() -> EventLog {
        EventLog::new(
            "Participant 1",
            vec![
                Fixation::new("Screen", 0.0, 0.4),
                Fixation::new("Screen", 0.5, 1.0),
                Fixation::new("Knob", 1.1, 1.3),
                Fixation::new("Screen", 1.4, 2.0),
                Fixation::new("Knob", 2.1, 2.6),
                Fixation::new("Knob", 2.7, 3.0),
                Fixation::new("Alarm", 3.1, 3.5),
            ],
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_episodes_merge_consecutive_labels() {
        let episodes = dwell_episodes(&sample_log()).unwrap();
        let labels: Vec<&str> = episodes.iter().map(|e| e.aoi.as_str()).collect();
        assert_eq!(labels, vec!["Screen", "Knob", "Screen", "Knob"]);
        assert!(approx(episodes[0].duration(), 1.0));
        assert!(approx(episodes[1].duration(), 0.2));
        assert!(approx(episodes[2].duration(), 0.6));
        assert!(approx(episodes[3].duration(), 0.9));
    }

    #[test]
    fn test_trailing_episode_is_not_flushed() {
        let table = DwellSegmenter::segment(&sample_log(), DwellStrategy::EpisodeBased).unwrap();
        let alarm = table.get("Alarm").unwrap();
        assert!(!alarm.has_data());
        assert!(alarm.sum.is_nan());
    }

    #[test]
    fn test_episode_statistics() {
        let table = DwellSegmenter::segment(&sample_log(), DwellStrategy::EpisodeBased).unwrap();
        assert_eq!(table.aois().collect::<Vec<_>>(), vec!["Screen", "Knob", "Alarm"]);

        let screen = table.get("Screen").unwrap();
        assert_eq!(screen.episodes, 2);
        assert!(approx(screen.sum, 1.6));
        assert!(approx(screen.mean, 0.8));
        assert!(approx(screen.max, 1.0));
        assert!(approx(screen.min, 0.6));

        let knob = table.get("Knob").unwrap();
        assert!(approx(knob.sum, 1.1));
        assert!(approx(knob.max, 0.9));
        assert!(approx(knob.min, 0.2));
    }

    #[test]
    fn test_single_label_log_yields_no_closed_episode() {
        let log = EventLog::new(
            "Participant 1",
            vec![
                Fixation::new("Screen", 0.0, 0.3),
                Fixation::new("Screen", 0.4, 0.9),
                Fixation::new("Screen", 1.0, 1.8),
            ],
        );
        assert!(dwell_episodes(&log).unwrap().is_empty());

        // Once the label changes, the single run closes with the full span.
        let mut fixations = log.fixations().to_vec();
        fixations.push(Fixation::new("Knob", 2.0, 2.1));
        let closed = dwell_episodes(&EventLog::new("Participant 1", fixations)).unwrap();
        assert_eq!(closed.len(), 1);
        assert!(approx(closed[0].duration(), 1.8));
    }

    #[test]
    fn test_empty_log_is_invalid_input() {
        let log = EventLog::new("Participant 4", vec![]);
        let err = DwellSegmenter::segment(&log, DwellStrategy::EpisodeBased).unwrap_err();
        assert!(matches!(err, MetricsError::InvalidInput(_)));
        assert!(dwell_episodes(&log).is_err());
    }

    #[test]
    fn test_flat_sum_uses_fixation_durations() {
        let log = EventLog::new(
            "Participant 1",
            vec![
                Fixation::with_duration("Screen", 0.0, 0.5, 0.4),
                Fixation::with_duration("Screen", 0.5, 1.0, 0.3),
                Fixation::with_duration("Knob", 1.0, 2.0, 0.9),
            ],
        );
        let table = DwellSegmenter::segment(&log, DwellStrategy::FlatSum).unwrap();
        assert_eq!(table.strategy, DwellStrategy::FlatSum);

        let screen = table.get("Screen").unwrap();
        assert_eq!(screen.episodes, 2);
        assert!(approx(screen.sum, 0.7));

        // No truncation in flat mode: the last row counts.
        let knob = table.get("Knob").unwrap();
        assert!(approx(knob.sum, 0.9));
    }

    #[test]
    fn test_explicit_aoi_list_reports_unseen_as_no_data() {
        let aois = vec!["Display".to_string(), "Screen".to_string()];
        let table =
            DwellSegmenter::segment_for(&aois, &sample_log(), DwellStrategy::EpisodeBased).unwrap();
        assert!(!table.get("Display").unwrap().has_data());
        assert!(table.get("Screen").unwrap().has_data());
        assert!(matches!(table.get("Knob"), Err(MetricsError::InvalidInput(_))));
    }
}
