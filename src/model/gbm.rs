//! Gradient-boosted classifier with binomial-deviance loss.
//!
//! The training configuration lives on [`GradientBoostedClassifier`]; a
//! call to [`fit`](GradientBoostedClassifier::fit) produces a
//! [`FittedGbm`] that carries only what prediction needs: the initial
//! log-odds, the shrinkage factor and the tree ensemble. The fitted model
//! is immutable and fully serializable.
//!
//! Boosting is the standard deviance recipe: start from the log-odds of
//! the base rate, then per round fit a regression tree to the residuals
//! `y - sigmoid(score)` with hessians `p * (1 - p)` and add the shrunken
//! tree to the score. Fitting is deterministic: no subsampling, no random
//! feature selection.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineError;
use crate::model::tree::{RegressionTree, TreeParams};

/// Training hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub max_leaf_nodes: usize,
    pub min_samples_leaf: usize,
}

impl Default for GbmConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 10,
            max_leaf_nodes: 7,
            min_samples_leaf: 5,
        }
    }
}

/// Gradient-boosted classifier (unfitted).
#[derive(Debug, Clone, Default)]
pub struct GradientBoostedClassifier {
    config: GbmConfig,
}

impl GradientBoostedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GbmConfig) -> Self {
        Self { config }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.config.n_estimators = n_estimators;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.config.learning_rate = learning_rate;
        self
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.config.n_estimators == 0 {
            return Err(PipelineError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.config.learning_rate > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.config.learning_rate
            )));
        }
        if self.config.max_leaf_nodes < 2 {
            return Err(PipelineError::InvalidParameter(
                "max_leaf_nodes must be at least 2".to_string(),
            ));
        }
        if self.config.min_samples_leaf == 0 {
            return Err(PipelineError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Train on a feature matrix and binary (0/1) labels.
    ///
    /// # Errors
    /// - [`PipelineError::InvalidParameter`] for a bad configuration or
    ///   non-binary labels.
    /// - [`PipelineError::DegenerateData`] when only one class is present.
    pub fn fit(&self, x: &Array2<f64>, y: &[f64]) -> Result<FittedGbm, PipelineError> {
        self.validate()?;

        let rows = x.nrows();
        if rows == 0 {
            return Err(PipelineError::EmptyData(
                "cannot train on an empty matrix".to_string(),
            ));
        }
        if rows != y.len() {
            return Err(PipelineError::FeatureMismatch {
                expected: rows,
                got: y.len(),
            });
        }
        for &label in y {
            if label != 0.0 && label != 1.0 {
                return Err(PipelineError::InvalidParameter(format!(
                    "labels must be 0 or 1, got {}",
                    label
                )));
            }
        }

        let positives = y.iter().filter(|&&v| v == 1.0).count();
        if positives == 0 || positives == rows {
            return Err(PipelineError::DegenerateData(
                "training labels hold a single class; log-odds are undefined".to_string(),
            ));
        }

        let p0 = positives as f64 / rows as f64;
        let init_score = (p0 / (1.0 - p0)).ln();

        let tree_params = TreeParams {
            max_depth: self.config.max_depth,
            max_leaf_nodes: self.config.max_leaf_nodes,
            min_samples_leaf: self.config.min_samples_leaf,
        };

        let mut score = vec![init_score; rows];
        let mut trees = Vec::with_capacity(self.config.n_estimators);
        let mut grad = vec![0.0; rows];
        let mut hess = vec![0.0; rows];

        for round in 0..self.config.n_estimators {
            for i in 0..rows {
                let p = sigmoid(score[i]);
                grad[i] = y[i] - p;
                hess[i] = p * (1.0 - p);
            }

            let tree = RegressionTree::fit(x, &grad, &hess, &tree_params);
            for i in 0..rows {
                score[i] += self.config.learning_rate * tree.predict_row(x.row(i));
            }
            trees.push(tree);

            if round % 25 == 0 {
                let loss = deviance(&score, y);
                debug!(round, loss, "boosting round");
            }
        }

        Ok(FittedGbm {
            init_score,
            learning_rate: self.config.learning_rate,
            trees,
            n_features: x.ncols(),
        })
    }
}

/// Trained classifier: immutable, serializable, prediction-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedGbm {
    init_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl FittedGbm {
    /// Number of features the model was trained on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of boosting rounds.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Raw additive score of one row.
    fn decision_function(&self, row: ArrayView1<f64>) -> f64 {
        self.init_score
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|t| t.predict_row(row))
                    .sum::<f64>()
    }

    /// Churn probability for one feature row.
    pub fn predict_proba_one(&self, features: &[f64]) -> Result<f64, PipelineError> {
        if features.len() != self.n_features {
            return Err(PipelineError::FeatureMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        Ok(sigmoid(self.decision_function(ArrayView1::from(features))))
    }

    /// Churn probabilities for a feature matrix.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>, PipelineError> {
        if x.ncols() != self.n_features {
            return Err(PipelineError::FeatureMismatch {
                expected: self.n_features,
                got: x.ncols(),
            });
        }
        Ok((0..x.nrows())
            .map(|i| sigmoid(self.decision_function(x.row(i))))
            .collect())
    }

    /// Binary predictions at the 0.5 threshold.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<f64>, PipelineError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| if p >= 0.5 { 1.0 } else { 0.0 })
            .collect())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Mean binomial deviance, for training diagnostics.
fn deviance(score: &[f64], y: &[f64]) -> f64 {
    let n = y.len() as f64;
    score
        .iter()
        .zip(y.iter())
        .map(|(&s, &yi)| {
            let p = sigmoid(s).clamp(1e-15, 1.0 - 1e-15);
            -(yi * p.ln() + (1.0 - yi) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / n
}
