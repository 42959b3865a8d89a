//! The churn classifier.
//!
//! A gradient-boosted tree ensemble with the training/inference separation
//! used across this crate: [`GradientBoostedClassifier`] carries the
//! hyperparameters and the training logic, [`FittedGbm`] carries only what
//! prediction needs and is the artifact that gets persisted.

pub mod gbm;
pub mod tree;

pub use gbm::{FittedGbm, GbmConfig, GradientBoostedClassifier};
pub use tree::RegressionTree;
