//! Configuration for an analysis run.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::interpolate::{InterpolationMethod, Interpolator, DEFAULT_GRID_SIZE};
use crate::analysis::resample::DEFAULT_STRIDE;
use crate::color::ColorScaleKind;
use crate::data::loader::MissingValuePolicy;

/// Environment variable naming an optional JSON config file for the viewer.
pub const CONFIG_ENV_VAR: &str = "EMISSION_SURFACE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one analysis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Keep every `stride`-th sample (10 Hz → 1 Hz at 10).
    pub stride: usize,

    /// Grid cells per axis.
    pub grid_size: usize,

    pub method: InterpolationMethod,

    /// Cap on scatter points fed to interpolation; `None` disables the cap.
    pub max_cloud_points: Option<usize>,

    /// Seed for scatter subsampling.
    pub sample_seed: u64,

    /// Clamp cubic output back into `[0, 100]`.
    pub clamp_cubic: bool,

    pub missing_values: MissingValuePolicy,

    pub color_scale: ColorScaleKind,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stride: DEFAULT_STRIDE,
            grid_size: DEFAULT_GRID_SIZE,
            method: InterpolationMethod::NearestIdw,
            max_cloud_points: Some(1000),
            sample_seed: 42,
            clamp_cubic: true,
            missing_values: MissingValuePolicy::Zero,
            color_scale: ColorScaleKind::Viridis,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Interpolator matching these settings.
    pub fn interpolator(&self) -> Interpolator {
        Interpolator::new(self.grid_size, self.method).with_clamp_cubic(self.clamp_cubic)
    }
}
