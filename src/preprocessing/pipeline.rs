//! The data-preparation pipeline.
//!
//! A strict linear pipeline: outlier clipping, categorical encoding,
//! stratified splitting, risk-tier and usage-weight fitting (training split
//! only), feature assembly, scaling (fit on training only) and minority
//! oversampling (training only). Each stage consumes the exact output of the
//! previous one; there is no branching, retry or partial resume. A failed
//! run leaves no bundle and is rerun from the start.
//!
//! Everything learned from data is returned as one [`FittedPreprocessor`]
//! value object and passed explicitly to training, evaluation and serving;
//! nothing is recomputed ad hoc. Mismatched transformer and model versions
//! silently corrupt predictions, so the preprocessor is persisted alongside
//! the data bundle it produced.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::data::{CustomerProfile, RawRecord};
use crate::error::PipelineError;
use crate::preprocessing::encode::{CategoryEncoder, FittedCategoryEncoder};
use crate::preprocessing::outliers::clip_outliers;
use crate::preprocessing::risk::{FittedRegionTiers, RegionRiskBucketer};
use crate::preprocessing::scale::{FittedStandardScaler, StandardScaler};
use crate::preprocessing::smote::Smote;
use crate::preprocessing::split::stratified_split;
use crate::preprocessing::usage::UsageWeights;

/// Feature-matrix columns, in order. Identical at training and serving
/// time; the model is only valid against matrices with exactly this layout.
pub const FEATURE_NAMES: [&str; 14] = [
    "Account length",
    "International plan",
    "Number vmail messages",
    "Total day calls",
    "Total day charge",
    "Total eve calls",
    "Total eve charge",
    "Total night calls",
    "Total night charge",
    "Total intl calls",
    "Total intl charge",
    "Customer service calls",
    "State risk tier",
    "Usage score",
];

/// Prepared train/test matrices and labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Everything the preparation stage learned from data, as one value object.
///
/// Required at serving time to reproduce the exact training-time transform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    plan_encoder: FittedCategoryEncoder,
    target_encoder: FittedCategoryEncoder,
    tiers: FittedRegionTiers,
    usage: UsageWeights,
    scaler: FittedStandardScaler,
}

impl FittedPreprocessor {
    pub fn plan_encoder(&self) -> &FittedCategoryEncoder {
        &self.plan_encoder
    }

    pub fn target_encoder(&self) -> &FittedCategoryEncoder {
        &self.target_encoder
    }

    pub fn tiers(&self) -> &FittedRegionTiers {
        &self.tiers
    }

    pub fn usage(&self) -> &UsageWeights {
        &self.usage
    }

    pub fn scaler(&self) -> &FittedStandardScaler {
        &self.scaler
    }

    /// Transform one serving request into a scaled feature row.
    ///
    /// Applies the same encoding, tier lookup, usage score and scaling as
    /// the preparation pipeline. Outlier clipping is training-table cleanup
    /// and is not part of the serving transform.
    ///
    /// # Errors
    /// [`PipelineError::UnknownCategory`] for a plan flag never seen at fit
    /// time. An unseen state falls back to the Medium tier (see
    /// [`FittedRegionTiers::tier`]).
    pub fn transform_profile(
        &self,
        profile: &CustomerProfile,
    ) -> Result<Vec<f64>, PipelineError> {
        let plan_code = self.plan_encoder.encode(&profile.international_plan)?;
        let charges = profile.charges();

        let raw = vec![
            profile.account_length,
            plan_code,
            profile.number_vmail_messages,
            profile.total_day_calls,
            profile.total_day_charge,
            profile.total_eve_calls,
            profile.total_eve_charge,
            profile.total_night_calls,
            profile.total_night_charge,
            profile.total_intl_calls,
            profile.total_intl_charge,
            profile.customer_service_calls,
            self.tiers.tier(&profile.state),
            self.usage.score(&charges),
        ];

        let matrix = Array2::from_shape_vec((1, FEATURE_NAMES.len()), raw)
            .map_err(|e| PipelineError::InvalidParameter(e.to_string()))?;
        let scaled = self.scaler.transform(&matrix)?;
        Ok(scaled.row(0).to_vec())
    }
}

/// The preparation stage (unfitted).
#[derive(Debug, Clone)]
pub struct DataPreparer {
    test_fraction: f64,
    seed: u64,
}

impl DataPreparer {
    pub fn new(test_fraction: f64, seed: u64) -> Self {
        Self {
            test_fraction,
            seed,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.test_fraction, config.seed)
    }

    /// Run the full preparation pipeline over the raw table.
    pub fn prepare(
        &self,
        records: &[RawRecord],
    ) -> Result<(PreparedData, FittedPreprocessor), PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot prepare an empty table".to_string(),
            ));
        }
        let n = records.len();

        // Outlier clipping on the designated count columns. Bounds come
        // from the original values of each column.
        let mut eve_calls: Vec<f64> = records.iter().map(|r| r.total_eve_calls).collect();
        let mut day_calls: Vec<f64> = records.iter().map(|r| r.total_day_calls).collect();
        let mut intl_calls: Vec<f64> = records.iter().map(|r| r.total_intl_calls).collect();
        for column in [&mut eve_calls, &mut day_calls, &mut intl_calls] {
            clip_outliers(column)?;
        }

        // Encode the target and the plan flag.
        let churn_values: Vec<&str> = records.iter().map(|r| r.churn.as_str()).collect();
        let (target_encoder, y) = CategoryEncoder::new("Churn").fit_transform(&churn_values)?;
        if target_encoder.classes().len() != 2 {
            return Err(PipelineError::DegenerateData(format!(
                "binary target expected, got {} distinct labels: {:?}",
                target_encoder.classes().len(),
                target_encoder.classes()
            )));
        }

        let plan_values: Vec<&str> = records
            .iter()
            .map(|r| r.international_plan.as_str())
            .collect();
        let (plan_encoder, plan_codes) =
            CategoryEncoder::new("International plan").fit_transform(&plan_values)?;

        // Split before fitting anything that looks at the target, so no
        // test-set statistics leak into training-time features.
        let split = stratified_split(&y, self.test_fraction, self.seed)?;
        let train_y: Vec<f64> = split.train.iter().map(|&i| y[i]).collect();

        let train_states: Vec<&str> = split
            .train
            .iter()
            .map(|&i| records[i].state.as_str())
            .collect();
        let tiers = RegionRiskBucketer::new(self.seed).fit(&train_states, &train_y)?;
        info!(states = tiers.n_states(), "fitted state risk tiers");

        let train_charges: Vec<[f64; 4]> = split
            .train
            .iter()
            .map(|&i| records[i].charges())
            .collect();
        let usage = UsageWeights::fit(&train_charges, &train_y)?;
        info!(weights = ?usage.weights(), "fitted usage-score weights");

        // Assemble the full feature matrix in FEATURE_NAMES order.
        let mut features = Array2::<f64>::zeros((n, FEATURE_NAMES.len()));
        for (i, r) in records.iter().enumerate() {
            let charges = r.charges();
            let row = [
                r.account_length,
                plan_codes[i],
                r.number_vmail_messages,
                day_calls[i],
                r.total_day_charge,
                eve_calls[i],
                r.total_eve_charge,
                r.total_night_calls,
                r.total_night_charge,
                intl_calls[i],
                r.total_intl_charge,
                r.customer_service_calls,
                tiers.tier(&r.state),
                usage.score(&charges),
            ];
            for (j, &v) in row.iter().enumerate() {
                features[[i, j]] = v;
            }
        }

        let x_train_raw = select_rows(&features, &split.train);
        let x_test_raw = select_rows(&features, &split.test);
        let y_test: Vec<f64> = split.test.iter().map(|&i| y[i]).collect();

        // Scaler fit on training rows only; the same fitted scaler
        // transforms the test rows.
        let (scaler, x_train_scaled) = StandardScaler::new().fit_transform(&x_train_raw)?;
        let x_test = scaler.transform(&x_test_raw)?;

        // Rebalance the training set only.
        let (x_train, y_train) = Smote::new(self.seed).oversample(&x_train_scaled, &train_y)?;
        info!(
            train_rows = x_train.nrows(),
            test_rows = x_test.nrows(),
            "prepared data"
        );

        Ok((
            PreparedData {
                x_train,
                x_test,
                y_train,
                y_test,
            },
            FittedPreprocessor {
                plan_encoder,
                target_encoder,
                tiers,
                usage,
                scaler,
            },
        ))
    }
}

fn select_rows(matrix: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((indices.len(), matrix.ncols()));
    for (row, &idx) in indices.iter().enumerate() {
        out.row_mut(row).assign(&matrix.row(idx));
    }
    out
}
