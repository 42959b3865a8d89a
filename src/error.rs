//! Error types for the churn pipeline.
//!
//! Every stage either fully succeeds or fails with one of these variants;
//! there are no retries. Missing-input variants name the step that produces
//! the artifact so the operator knows what to run first.

use std::fmt;
use std::path::PathBuf;

/// Error type shared by every pipeline stage.
#[derive(Debug)]
pub enum PipelineError {
    /// A required input file or artifact does not exist.
    MissingInput {
        path: PathBuf,
        /// What the operator should do about it, e.g. the step to run first.
        hint: &'static str,
    },
    /// The input table does not match the expected schema.
    MalformedInput(String),
    /// A categorical value was never seen during fitting.
    UnknownCategory { column: String, value: String },
    /// The data does not support the requested computation
    /// (too few distinct regions, all-zero correlations, minority class
    /// too small to oversample).
    DegenerateData(String),
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// Row width differs from the number of features seen during fit.
    FeatureMismatch { expected: usize, got: usize },
    /// Invalid configuration or hyperparameter value.
    InvalidParameter(String),
    /// Serialization or deserialization error.
    Serialization(String),
    /// I/O error during file operations.
    Io(String),
    /// The serving boundary could not load a usable model.
    ModelUnavailable(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingInput { path, hint } => {
                write!(f, "missing input {}: {}", path.display(), hint)
            }
            PipelineError::MalformedInput(msg) => {
                write!(f, "malformed input: {}", msg)
            }
            PipelineError::UnknownCategory { column, value } => {
                write!(f, "unknown category {:?} in column {:?}", value, column)
            }
            PipelineError::DegenerateData(msg) => {
                write!(f, "degenerate data: {}", msg)
            }
            PipelineError::EmptyData(msg) => {
                write!(f, "empty data: {}", msg)
            }
            PipelineError::FeatureMismatch { expected, got } => {
                write!(
                    f,
                    "feature mismatch: expected {} features, got {}",
                    expected, got
                )
            }
            PipelineError::InvalidParameter(msg) => {
                write!(f, "invalid parameter: {}", msg)
            }
            PipelineError::Serialization(msg) => {
                write!(f, "serialization error: {}", msg)
            }
            PipelineError::Io(msg) => {
                write!(f, "I/O error: {}", msg)
            }
            PipelineError::ModelUnavailable(msg) => {
                write!(f, "model unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::MalformedInput(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
