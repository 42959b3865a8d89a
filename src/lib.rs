//! # churn-pipeline
//!
//! An end-to-end customer churn prediction pipeline: ingest a tabular
//! customer dataset, engineer features, train a gradient-boosted
//! classifier, evaluate it, persist every artifact, and serve predictions
//! for single customer profiles.
//!
//! ## Core Design Principles
//!
//! - **Fit/transform separation**: everything learned from data (encoders,
//!   risk tiers, usage weights, scaler) is an explicit fitted value object,
//!   produced once by the preparation stage and passed to every downstream
//!   consumer, never recomputed ad hoc.
//! - **Training/serving consistency**: the feature matrix layout and every
//!   fitted transform are identical at training and serving time; the
//!   persisted preprocessor is the single source of truth.
//! - **No silent degradation**: unseen categories, too few regions for
//!   clustering, all-zero correlation weights and missing artifacts are
//!   loud, typed errors.
//! - **Reproducibility**: every stochastic step (split shuffle, k-means
//!   initialization, oversampling) runs off one configured seed.
//!
//! ## Quick Start
//!
//! ```ignore
//! use churn_pipeline::config::PipelineConfig;
//! use churn_pipeline::data::load_records;
//! use churn_pipeline::model::GradientBoostedClassifier;
//! use churn_pipeline::preprocessing::DataPreparer;
//!
//! let config = PipelineConfig::default();
//! let records = load_records(&config.dataset_path)?;
//!
//! let preparer = DataPreparer::from_config(&config);
//! let (data, preprocessor) = preparer.prepare(&records)?;
//!
//! let model = GradientBoostedClassifier::new().fit(&data.x_train, &data.y_train)?;
//! let probabilities = model.predict_proba(&data.x_test)?;
//! ```
//!
//! ## Module Structure
//!
//! - `config` — run parameters and artifact directories
//! - `data` — raw-table schema and CSV ingestion
//! - `preprocessing` — the feature-engineering pipeline and its transformers
//! - `model` — gradient-boosted trees (training and inference)
//! - `metrics` — evaluation on the held-out test set
//! - `store` — artifact persistence under stable keys
//! - `serve` — the prediction boundary for single customer profiles

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod preprocessing;
pub mod serve;
pub mod store;

pub use config::PipelineConfig;
pub use data::{load_records, CustomerProfile, RawRecord};
pub use error::PipelineError;
pub use model::{FittedGbm, GbmConfig, GradientBoostedClassifier};
pub use preprocessing::{DataPreparer, FittedPreprocessor, PreparedData};
pub use serve::{Prediction, PredictionService};
pub use store::ArtifactStore;
