//! Correlation-weighted usage score.
//!
//! One synthesized feature per row: the weighted sum of the four per-band
//! charge columns, where each weight is the absolute Pearson correlation of
//! that column with the churn target, normalized so the weights sum to 1.
//! Weights are fit once on the training split and reused unchanged for every
//! row, including at serving time.
//!
//! A constant charge column has an undefined correlation and contributes
//! weight 0; if every correlation is zero the normalization is undefined and
//! fitting fails instead of silently dividing by zero.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Number of charge columns feeding the score.
pub const CHARGE_BANDS: usize = 4;

/// Display names of the charge columns, in score order.
pub const CHARGE_COLUMNS: [&str; CHARGE_BANDS] = [
    "Total day charge",
    "Total eve charge",
    "Total night charge",
    "Total intl charge",
];

/// Fitted usage-score weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageWeights {
    weights: [f64; CHARGE_BANDS],
}

impl UsageWeights {
    /// Fit weights from per-row charges and binary churn labels.
    ///
    /// # Errors
    /// - [`PipelineError::EmptyData`] on an empty training set.
    /// - [`PipelineError::DegenerateData`] when every correlation is zero.
    pub fn fit(charges: &[[f64; CHARGE_BANDS]], churn: &[f64]) -> Result<Self, PipelineError> {
        if charges.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot fit usage weights on empty data".to_string(),
            ));
        }
        if charges.len() != churn.len() {
            return Err(PipelineError::FeatureMismatch {
                expected: charges.len(),
                got: churn.len(),
            });
        }

        let mut weights = [0.0f64; CHARGE_BANDS];
        for band in 0..CHARGE_BANDS {
            let column: Vec<f64> = charges.iter().map(|row| row[band]).collect();
            weights[band] = pearson(&column, churn).abs();
        }

        let total: f64 = weights.iter().sum();
        if total == 0.0 {
            return Err(PipelineError::DegenerateData(format!(
                "all correlations between {:?} and the target are zero; \
                 usage-score weights are undefined",
                CHARGE_COLUMNS
            )));
        }

        for w in weights.iter_mut() {
            *w /= total;
        }

        Ok(Self { weights })
    }

    /// The normalized weights, in [`CHARGE_COLUMNS`] order.
    pub fn weights(&self) -> &[f64; CHARGE_BANDS] {
        &self.weights
    }

    /// Usage score of one row of charges.
    pub fn score(&self, charges: &[f64; CHARGE_BANDS]) -> f64 {
        self.weights
            .iter()
            .zip(charges.iter())
            .map(|(w, c)| w * c)
            .sum()
    }
}

/// Pearson correlation; 0.0 when either side has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}
