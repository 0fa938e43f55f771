use intensity_quant::{QuantParams, ThresholdMethod};
use serde::{Deserialize, Deserializer};
use std::path::Path;

use super::Wavelength;
use crate::error::ConfigError;

/// Commented default configuration written by `fluorquant init`.
pub const DEFAULT_CONFIG_YAML: &str = r#"# fluorquant analysis configuration

# First file of each image sequence to load (1-based)
start_slice: 1

# Maximum number of files loaded per stack
max_slices: 150

# Threshold method used to segment the masks: MaxEntropy, Default, Huang, RenyiEntropy
threshold_method: MaxEntropy

# Wavelength channel directory to analyze: WL0 - WL5
wavelength: WL1

# Foreground coverage (percent of frame) at which the background estimate freezes
area_threshold_percent: 50

# true: analyze every position of a project directory
# false: analyze the single stack directory given on the command line
batch: true

# Write the background region of every slice as PNG under intermediates/
save_intermediates: false

# Rolling-ball radius used upstream (echoed into the results)
rolling_ball_radius: 50

# Where measurements come from: auto, images, table
source: auto

results_file: intensity_results.tsv
"#;

/// Where slice measurements are taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSource {
    /// Table if `measurements.tsv` exists, images otherwise
    #[default]
    Auto,
    /// Intensity PNGs plus precomputed masks
    Images,
    /// Precomputed `measurements.tsv`
    Table,
}

/// Analysis configuration loaded from YAML
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// First file of each image sequence to load (1-based)
    #[serde(default = "default_start_slice")]
    pub start_slice: u32,

    /// Maximum number of files loaded per stack
    #[serde(default = "default_max_slices")]
    pub max_slices: u32,

    #[serde(default, deserialize_with = "deserialize_threshold_method")]
    pub threshold_method: ThresholdMethod,

    #[serde(default = "default_wavelength")]
    pub wavelength: Wavelength,

    #[serde(default = "default_area_threshold")]
    pub area_threshold_percent: f64,

    /// Analyze a whole project (true) or one stack directory (false)
    #[serde(default = "default_batch")]
    pub batch: bool,

    #[serde(default)]
    pub save_intermediates: bool,

    #[serde(default = "default_rolling_ball_radius")]
    pub rolling_ball_radius: f64,

    #[serde(default)]
    pub source: MeasurementSource,

    #[serde(default = "default_results_file")]
    pub results_file: String,

    /// Stacks analyzed concurrently (defaults to available parallelism)
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_start_slice() -> u32 {
    1
}

fn default_max_slices() -> u32 {
    150
}

fn default_wavelength() -> Wavelength {
    Wavelength::WL1
}

fn default_area_threshold() -> f64 {
    50.0
}

fn default_batch() -> bool {
    true
}

fn default_rolling_ball_radius() -> f64 {
    50.0
}

fn default_results_file() -> String {
    "intensity_results.tsv".to_string()
}

fn deserialize_threshold_method<'de, D>(deserializer: D) -> Result<ThresholdMethod, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub start_slice: Option<u32>,
    pub max_slices: Option<u32>,
    pub threshold_method: Option<ThresholdMethod>,
    pub wavelength: Option<Wavelength>,
    pub area_threshold_percent: Option<f64>,
    pub batch: Option<bool>,
    pub save_intermediates: Option<bool>,
    pub jobs: Option<usize>,
}

impl AnalysisConfig {
    /// Load configuration from a YAML file, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            threshold_method = %config.threshold_method,
            wavelength = %config.wavelength,
            area_threshold = config.area_threshold_percent,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map of defaults.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check numeric ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_slice < 1 {
            return Err(ConfigError::Invalid(
                "start_slice must be at least 1".to_string(),
            ));
        }
        if self.max_slices < 1 {
            return Err(ConfigError::Invalid(
                "max_slices must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.area_threshold_percent) {
            return Err(ConfigError::Invalid(format!(
                "area_threshold_percent must be within 0-100 (got {})",
                self.area_threshold_percent
            )));
        }
        if !self.rolling_ball_radius.is_finite() || self.rolling_ball_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "rolling_ball_radius must be positive (got {})",
                self.rolling_ball_radius
            )));
        }
        if self.results_file.trim().is_empty() || self.results_file.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "results_file must be a plain file name (got '{}')",
                self.results_file
            )));
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Apply command-line overrides and re-validate
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(v) = overrides.start_slice {
            self.start_slice = v;
        }
        if let Some(v) = overrides.max_slices {
            self.max_slices = v;
        }
        if let Some(v) = overrides.threshold_method {
            self.threshold_method = v;
        }
        if let Some(v) = overrides.wavelength {
            self.wavelength = v;
        }
        if let Some(v) = overrides.area_threshold_percent {
            self.area_threshold_percent = v;
        }
        if let Some(v) = overrides.batch {
            self.batch = v;
        }
        if let Some(v) = overrides.save_intermediates {
            self.save_intermediates = v;
        }
        if let Some(v) = overrides.jobs {
            self.jobs = Some(v);
        }
        self.validate()?;
        Ok(self)
    }

    /// Parameters handed to the quantifier for every stack
    pub fn quant_params(&self) -> QuantParams {
        QuantParams::new(
            self.area_threshold_percent,
            self.rolling_ball_radius,
            self.threshold_method,
        )
    }

    /// Number of stacks analyzed concurrently
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            start_slice: default_start_slice(),
            max_slices: default_max_slices(),
            threshold_method: ThresholdMethod::MaxEntropy,
            wavelength: default_wavelength(),
            area_threshold_percent: default_area_threshold(),
            batch: default_batch(),
            save_intermediates: false,
            rolling_ball_radius: default_rolling_ball_radius(),
            source: MeasurementSource::Auto,
            results_file: default_results_file(),
            jobs: None,
        }
    }
}
