//! Report configuration
//!
//! The decisions a report author makes on the input form (which chapters to
//! include, which plot style to use) plus the engine settings, loaded from TOML.

use crate::error::MetricsError;
use crate::types::DwellStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory for rendered figures
pub const DEFAULT_OUTPUT_DIR: &str = "Outputs";

/// Decimal places of numbers written into text table cells
pub const DEFAULT_DECIMALS: u32 = 4;

/// Largest accepted `decimals`; an f64 carries no more significant digits
pub const MAX_DECIMALS: u32 = 17;

/// Plot style of the pooled chart embedded in a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotType {
    #[default]
    Bar,
    Box,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AverageFixationConfig {
    pub enabled: bool,
    pub plot_type: PlotType,
}

impl Default for AverageFixationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            plot_type: PlotType::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DwellTimesConfig {
    pub enabled: bool,
}

impl Default for DwellTimesConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitionsConfig {
    pub enabled: bool,
    /// Render heatmaps as shares of the grand total instead of raw counts
    pub normalize: bool,
}

impl Default for TransitionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeOnTaskConfig {
    pub enabled: bool,
    pub plot_type: PlotType,
    /// Column names of tasks 1, 2, ...; unnamed tasks are `Critical task {n}`
    pub task_names: Vec<String>,
}

impl Default for TimeOnTaskConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            plot_type: PlotType::Bar,
            task_names: Vec::new(),
        }
    }
}

/// Settings for one report run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Directory that figure destinations are placed in
    pub output_dir: PathBuf,
    pub dwell_strategy: DwellStrategy,
    /// Decimal places for text table cells
    pub decimals: u32,
    pub time_on_task: TimeOnTaskConfig,
    pub average_fixation: AverageFixationConfig,
    pub dwell_times: DwellTimesConfig,
    pub transitions: TransitionsConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dwell_strategy: DwellStrategy::EpisodeBased,
            decimals: DEFAULT_DECIMALS,
            time_on_task: TimeOnTaskConfig::default(),
            average_fixation: AverageFixationConfig::default(),
            dwell_times: DwellTimesConfig::default(),
            transitions: TransitionsConfig::default(),
        }
    }
}

impl ReportConfig {
    /// Parse a configuration from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, MetricsError> {
        let config: Self =
            toml::from_str(content).map_err(|e| MetricsError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the TOML types cannot express
    pub fn validate(&self) -> Result<(), MetricsError> {
        if self.decimals > MAX_DECIMALS {
            return Err(MetricsError::ConfigError(format!(
                "decimals must be at most {}, got {}",
                MAX_DECIMALS, self.decimals
            )));
        }
        Ok(())
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, MetricsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MetricsError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml_string(&self) -> Result<String, MetricsError> {
        toml::to_string_pretty(self).map_err(|e| MetricsError::ConfigError(e.to_string()))
    }

    /// Destination of a figure file inside the output directory
    pub fn figure_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
