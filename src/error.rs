use intensity_quant::QuantError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the image-measurement collaborator: anything that goes wrong
/// while locating, reading or measuring a stack before the quantifier sees it.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Stack directory not found: {0}")]
    MissingStack(PathBuf),

    #[error("No images found in {0}")]
    EmptyStack(PathBuf),

    #[error("Invalid experiment layout: {0}")]
    Layout(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image decode error in {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Image encode error in {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("Unsupported image format in {path}: {detail}")]
    UnsupportedFormat { path: PathBuf, detail: String },

    #[error("Mask not found for {0}")]
    MissingMask(PathBuf),

    #[error("Mask is {mask_width}x{mask_height} but image is {width}x{height}: {path}")]
    DimensionMismatch {
        path: PathBuf,
        width: u32,
        height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("No exposure time recorded for {0}")]
    MissingExposure(String),

    #[error("Invalid acquisition metadata in {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    #[error("Malformed measurement table {path} (line {line}): {message}")]
    Table {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Slice {index} is outside the stack ({len} slices)")]
    SliceOutOfRange { index: u32, len: u32 },
}

impl CollaboratorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollaboratorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single stack was aborted.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Quantification failed: {0}")]
    Quant(#[from] QuantError),

    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failure of a whole analysis run (as opposed to a single stack).
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Experiment error: {0}")]
    Experiment(#[from] CollaboratorError),

    #[error("Failed to write results to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
