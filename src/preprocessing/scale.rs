//! Standard scaling (z-score normalization).
//!
//! Transforms features by removing the per-column mean and scaling to unit
//! variance: `z = (x - u) / s` with `u`, `s` learned from the training
//! matrix only. The same fitted scaler must transform training data, test
//! data and serving requests; it is part of the persisted preprocessor.
//!
//! Every feature column is scaled, including the integer-encoded
//! categoricals; serving reproduces exactly this.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// StandardScaler (unfitted).
#[derive(Debug, Clone, Default)]
pub struct StandardScaler;

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }

    /// Learn per-column mean and scale from the training matrix.
    ///
    /// Uses the population standard deviation (ddof = 0). A zero-variance
    /// column gets scale 1 so constant features pass through centered.
    pub fn fit(&self, data: &Array2<f64>) -> Result<FittedStandardScaler, PipelineError> {
        let (rows, cols) = data.dim();
        if rows == 0 {
            return Err(PipelineError::EmptyData(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mut mean = vec![0.0f64; cols];
        let mut scale = vec![1.0f64; cols];
        for (col, column) in data.axis_iter(Axis(1)).enumerate() {
            let m = column.sum() / rows as f64;
            let var = column.iter().map(|&v| (v - m) * (v - m)).sum::<f64>() / rows as f64;
            mean[col] = m;
            let std = var.sqrt();
            scale[col] = if std == 0.0 { 1.0 } else { std };
        }

        Ok(FittedStandardScaler {
            mean,
            scale,
            n_features: cols,
        })
    }

    /// Fit and transform in one step.
    pub fn fit_transform(
        &self,
        data: &Array2<f64>,
    ) -> Result<(FittedStandardScaler, Array2<f64>), PipelineError> {
        let fitted = self.fit(data)?;
        let transformed = fitted.transform(data)?;
        Ok((fitted, transformed))
    }
}

/// Fitted scaler: per-column (mean, scale) pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedStandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    n_features: usize,
}

impl FittedStandardScaler {
    /// Per-column means learned at fit time.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-column scales learned at fit time.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Number of features seen during fit.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Standardize a matrix with the learned parameters.
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        let (_, cols) = data.dim();
        if cols != self.n_features {
            return Err(PipelineError::FeatureMismatch {
                expected: self.n_features,
                got: cols,
            });
        }

        let mut result = data.clone();
        for (col, mut column) in result.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| (v - self.mean[col]) / self.scale[col]);
        }
        Ok(result)
    }

    /// Map standardized values back to the original space.
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        let (_, cols) = data.dim();
        if cols != self.n_features {
            return Err(PipelineError::FeatureMismatch {
                expected: self.n_features,
                got: cols,
            });
        }

        let mut result = data.clone();
        for (col, mut column) in result.axis_iter_mut(Axis(1)).enumerate() {
            column.mapv_inplace(|v| v * self.scale[col] + self.mean[col]);
        }
        Ok(result)
    }
}
