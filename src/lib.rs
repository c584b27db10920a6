//! Gaze Flux - Eye-tracking metrics engine for usability reports
//!
//! Gaze Flux turns per-participant fixation logs into area-of-interest metrics
//! through a deterministic pipeline: AOI extraction → dwell segmentation →
//! revisit counting → transition counting → cohort aggregation → report chapters.
//!
//! ## Modules
//!
//! - **Metrics**: per-participant AOIs, dwell times, revisits and transitions
//! - **Aggregation**: cohort means, summed transition matrices, pooled fixation samples
//! - **Time on task**: task completion times from task event exports
//! - **Report**: text tables, chart requests and chapter blocks

pub mod aggregate;
pub mod aoi;
pub mod chapters;
pub mod config;
pub mod dwell;
pub mod encoder;
pub mod error;
pub mod fixations;
pub mod pipeline;
pub mod render;
pub mod revisits;
pub mod schema;
pub mod tables;
pub mod tasks;
pub mod transitions;
pub mod types;

pub use aggregate::MetricsAggregator;
pub use aoi::areas_of_interest;
pub use config::ReportConfig;
pub use dwell::DwellSegmenter;
pub use error::MetricsError;
pub use pipeline::{compute_participant, fixations_to_report, CohortRun, MetricsProcessor};
pub use revisits::RevisitCounter;
pub use tasks::TaskTimer;
pub use transitions::TransitionMatrixBuilder;

// Schema exports
pub use schema::{FixationAdapter, FixationRecord, TaskEvent, TaskEventAdapter, SCHEMA_VERSION};

/// Gaze Flux version embedded in all report payloads
pub const GAZE_FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "gaze-flux";
