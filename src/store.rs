//! The artifact store.
//!
//! Every artifact of a pipeline run lives under a configured base directory
//! with a stable key: the four bundle arrays and the fitted preprocessor
//! under the processed-data directory, the trained model and the evaluation
//! report under the model directory. One producer writes each artifact per
//! run; consumers load them strictly afterwards. The bundle and the
//! preprocessor are produced together and must be consumed together;
//! mixing artifacts from different runs silently corrupts predictions.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::metrics::Evaluation;
use crate::model::FittedGbm;
use crate::preprocessing::{FittedPreprocessor, PreparedData};

pub const X_TRAIN_KEY: &str = "x_train.bin";
pub const X_TEST_KEY: &str = "x_test.bin";
pub const Y_TRAIN_KEY: &str = "y_train.bin";
pub const Y_TEST_KEY: &str = "y_test.bin";
pub const PREPROCESSOR_KEY: &str = "preprocessor.bin";
pub const MODEL_KEY: &str = "model.bin";
pub const EVALUATION_KEY: &str = "evaluation.json";

/// Filesystem-backed store for pipeline artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
    model_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(data_dir: P, model_dir: Q) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_dir: model_dir.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.processed_data_dir, &config.model_dir)
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(value)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn read<T: DeserializeOwned>(
        &self,
        path: &Path,
        hint: &'static str,
    ) -> Result<T, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
                hint,
            });
        }
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    }

    /// Persist the prepared bundle and its fitted preprocessor together.
    pub fn save_prepared(
        &self,
        data: &PreparedData,
        preprocessor: &FittedPreprocessor,
    ) -> Result<(), PipelineError> {
        self.write(&self.data_dir.join(X_TRAIN_KEY), &data.x_train)?;
        self.write(&self.data_dir.join(X_TEST_KEY), &data.x_test)?;
        self.write(&self.data_dir.join(Y_TRAIN_KEY), &data.y_train)?;
        self.write(&self.data_dir.join(Y_TEST_KEY), &data.y_test)?;
        self.write(&self.data_dir.join(PREPROCESSOR_KEY), preprocessor)?;
        info!(dir = %self.data_dir.display(), "saved prepared-data bundle");
        Ok(())
    }

    /// Load the rebalanced training matrix and labels.
    pub fn load_training_set(&self) -> Result<(Array2<f64>, Vec<f64>), PipelineError> {
        let x = self.read(&self.data_dir.join(X_TRAIN_KEY), "run `prepare` first")?;
        let y = self.read(&self.data_dir.join(Y_TRAIN_KEY), "run `prepare` first")?;
        Ok((x, y))
    }

    /// Load the held-out test matrix and labels.
    pub fn load_test_set(&self) -> Result<(Array2<f64>, Vec<f64>), PipelineError> {
        let x = self.read(&self.data_dir.join(X_TEST_KEY), "run `prepare` first")?;
        let y = self.read(&self.data_dir.join(Y_TEST_KEY), "run `prepare` first")?;
        Ok((x, y))
    }

    pub fn load_preprocessor(&self) -> Result<FittedPreprocessor, PipelineError> {
        self.read(&self.data_dir.join(PREPROCESSOR_KEY), "run `prepare` first")
    }

    pub fn save_model(&self, model: &FittedGbm) -> Result<(), PipelineError> {
        let path = self.model_dir.join(MODEL_KEY);
        self.write(&path, model)?;
        info!(path = %path.display(), trees = model.n_trees(), "saved model");
        Ok(())
    }

    pub fn load_model(&self) -> Result<FittedGbm, PipelineError> {
        self.read(&self.model_dir.join(MODEL_KEY), "run `train` first")
    }

    /// Write the evaluation report as human-readable JSON.
    pub fn save_evaluation(&self, evaluation: &Evaluation) -> Result<(), PipelineError> {
        std::fs::create_dir_all(&self.model_dir)?;
        let path = self.model_dir.join(EVALUATION_KEY);
        let json = serde_json::to_string_pretty(evaluation)
            .map_err(|e| PipelineError::Serialization(e.to_string()))?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "saved evaluation report");
        Ok(())
    }
}
