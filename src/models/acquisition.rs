use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::error::CollaboratorError;

/// Per-stack acquisition metadata, read from `acquisition.yaml`.
///
/// ```yaml
/// timepoints:
///   - file: img_0000_B02a_WL1.png
///     exposure_seconds: 0.5
///     acquired_at: 2013-04-02T10:00:00Z
/// ```
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AcquisitionLog {
    #[serde(default)]
    pub timepoints: Vec<Timepoint>,
}

/// One acquired frame
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Timepoint {
    /// Image file name within the stack directory
    pub file: String,

    pub exposure_seconds: f64,

    #[serde(default)]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl AcquisitionLog {
    pub const FILE_NAME: &'static str = "acquisition.yaml";

    /// Load `acquisition.yaml` from a stack directory.
    ///
    /// A missing file yields an empty log; lookups against it then fail per
    /// slice with [`CollaboratorError::MissingExposure`].
    pub fn load(stack_dir: &Path) -> Result<Self, CollaboratorError> {
        let path = stack_dir.join(Self::FILE_NAME);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No acquisition metadata");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| CollaboratorError::io(&path, e))?;
        let log: Self = serde_yaml::from_str(&content).map_err(|e| CollaboratorError::Metadata {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            path = %path.display(),
            timepoints = log.timepoints.len(),
            "Loaded acquisition metadata"
        );
        Ok(log)
    }

    pub fn timepoint(&self, file: &str) -> Option<&Timepoint> {
        self.timepoints.iter().find(|tp| tp.file == file)
    }

    /// Exposure time recorded for an image file
    pub fn exposure_seconds(&self, file: &str) -> Result<f64, CollaboratorError> {
        self.timepoint(file)
            .map(|tp| tp.exposure_seconds)
            .ok_or_else(|| CollaboratorError::MissingExposure(file.to_string()))
    }

    /// Time of the earliest timestamped frame in the stack
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.timepoints.iter().filter_map(|tp| tp.acquired_at).min()
    }

    /// Minutes between the stack start and the acquisition of `file`.
    ///
    /// `None` when either timestamp is unknown.
    pub fn elapsed_minutes(&self, file: &str) -> Option<f64> {
        let start = self.start_time()?;
        let at = self.timepoint(file)?.acquired_at?;
        let elapsed = at.signed_duration_since(start);
        Some(elapsed.num_milliseconds() as f64 / 60_000.0)
    }
}
