//! Chart rendering sink
//!
//! Plotting happens outside the engine. A chart is requested by handing a
//! labeled table and a destination path to a `RenderSink`.

use crate::error::MetricsError;
use crate::tables::DataTable;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Kind of chart to draw from a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Column means with 95% confidence interval caps
    Bar,
    /// Quartiles and spread per column
    Box,
    /// Cell-annotated matrix, values formatted as percentages
    Heatmap,
    /// Shares of a single row, legend entries labeled with their percentage
    Pie,
}

/// One chart to be drawn and saved at `destination`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub table: DataTable,
    pub destination: PathBuf,
}

impl ChartRequest {
    pub fn new(
        kind: ChartKind,
        title: impl Into<String>,
        table: DataTable,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            x_label: None,
            y_label: None,
            table,
            destination: destination.into(),
        }
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = Some(x_label.into());
        self.y_label = Some(y_label.into());
        self
    }
}

/// Destination for chart requests
pub trait RenderSink {
    /// Draw the chart and save it at the request's destination
    fn render(&mut self, request: &ChartRequest) -> Result<(), MetricsError>;
}

/// Submit a chart unless its table is empty.
///
/// Returns whether the chart was submitted. An empty table is logged and
/// skipped, matching the "omit the figure when there is no data" behavior.
pub fn render_if_data(
    sink: &mut dyn RenderSink,
    request: ChartRequest,
) -> Result<bool, MetricsError> {
    match request.table.require_data() {
        Ok(()) => {
            sink.render(&request)?;
            Ok(true)
        }
        Err(e) if e.is_recoverable() => {
            log::warn!(
                "Skipping chart '{}' ({}): {}",
                request.title,
                request.destination.display(),
                e
            );
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Sink that keeps requests in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub requests: Vec<ChartRequest>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destinations(&self) -> Vec<&Path> {
        self.requests.iter().map(|r| r.destination.as_path()).collect()
    }
}

impl RenderSink for CollectingSink {
    fn render(&mut self, request: &ChartRequest) -> Result<(), MetricsError> {
        self.requests.push(request.clone());
        Ok(())
    }
}

/// Sink that writes each request as a JSON chart spec next to its destination.
///
/// `Outputs/Transitions_heat_map.png` produces `Outputs/Transitions_heat_map.json`
/// for an external plotting step to pick up.
#[derive(Debug, Default)]
pub struct JsonSpecSink {
    written: Vec<PathBuf>,
}

impl JsonSpecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec files written so far
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn spec_path(destination: &Path) -> PathBuf {
        destination.with_extension("json")
    }
}

impl RenderSink for JsonSpecSink {
    fn render(&mut self, request: &ChartRequest) -> Result<(), MetricsError> {
        let path = Self::spec_path(&request.destination);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(request)?;
        std::fs::write(&path, json).map_err(|e| {
            MetricsError::RenderError(format!("cannot write {}: {}", path.display(), e))
        })?;

        log::debug!("Wrote chart spec {}", path.display());
        self.written.push(path);
        Ok(())
    }
}
