//! Fixation duration samples
//!
//! Groups raw fixation durations by AOI and summarises them for the average
//! fixation chapter (bar plot with a 95% interval, box plot with quartiles).

use crate::types::{AoiSamples, EventLog, FixationSamples};
use serde::Serialize;

/// z-score of the two-sided 95% normal interval
const Z_95: f64 = 1.96;

/// Raw fixation durations per AOI, in the given AOI order
pub fn fixation_durations(aois: &[String], log: &EventLog) -> FixationSamples {
    let entries = aois
        .iter()
        .map(|aoi| AoiSamples {
            aoi: aoi.clone(),
            durations: log
                .iter()
                .filter(|f| &f.aoi == aoi)
                .map(|f| f.fixation_duration)
                .collect(),
        })
        .collect();

    FixationSamples { entries }
}

/// Concatenate sample sets over a union of AOIs, keeping input order within each AOI
pub fn pool_samples<'a, I>(aois: &[String], sets: I) -> FixationSamples
where
    I: IntoIterator<Item = &'a FixationSamples>,
{
    let mut entries: Vec<AoiSamples> = aois
        .iter()
        .map(|aoi| AoiSamples {
            aoi: aoi.clone(),
            durations: Vec::new(),
        })
        .collect();

    for set in sets {
        for source in &set.entries {
            if let Some(target) = entries.iter_mut().find(|e| e.aoi == source.aoi) {
                target.durations.extend_from_slice(&source.durations);
            }
        }
    }

    FixationSamples { entries }
}

/// Descriptive statistics of one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); zero for a single value
    pub std_dev: f64,
    /// Half-width of the normal 95% confidence interval of the mean
    pub ci95: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl SampleSummary {
    /// Summarise a sample; `None` when it is empty
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let std_dev = if samples.len() > 1 {
            let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
            variance.sqrt()
        } else {
            0.0
        };

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Some(Self {
            count: samples.len(),
            mean,
            std_dev,
            ci95: Z_95 * std_dev / n.sqrt(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Linear-interpolated quantile of a sorted, non-empty slice
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
