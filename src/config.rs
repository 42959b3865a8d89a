//! Pipeline configuration.
//!
//! Paths and run parameters with sensible defaults, optionally overridden by
//! a TOML file. Artifact directories are created eagerly so a run never
//! fails halfway through because a target directory is missing.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::PipelineError;

fn default_dataset_path() -> PathBuf {
    PathBuf::from("data/data_churn.csv")
}

fn default_processed_data_dir() -> PathBuf {
    PathBuf::from("processed_data")
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

/// Run parameters for the whole pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Input CSV table.
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    /// Directory for the prepared-data bundle and fitted preprocessor.
    #[serde(default = "default_processed_data_dir")]
    pub processed_data_dir: PathBuf,
    /// Directory for the trained model and evaluation report.
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,
    /// Held-out fraction for the train/test split.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    /// Seed for every stochastic step (split, clustering, oversampling).
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            processed_data_dir: default_processed_data_dir(),
            model_dir: default_model_dir(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration, layering an optional TOML file over the defaults.
    pub fn load(config_file: Option<&Path>) -> Result<Self, PipelineError> {
        let loaded = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(PipelineError::MissingInput {
                        path: path.to_path_buf(),
                        hint: "supply an existing --config file",
                    });
                }
                config::Config::builder()
                    .add_source(config::File::from(path))
                    .build()
                    .and_then(|c| c.try_deserialize::<Self>())
                    .map_err(|e| {
                        PipelineError::InvalidParameter(format!("config file: {}", e))
                    })?
            }
            None => Self::default(),
        };
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }

    /// Create the artifact directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.processed_data_dir)?;
        std::fs::create_dir_all(&self.model_dir)?;
        Ok(())
    }
}
