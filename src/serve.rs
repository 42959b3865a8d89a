//! The serving boundary.
//!
//! Consumes the fitted preprocessor and the trained model read-only and
//! turns one raw customer profile into a binary churn prediction with a
//! probability in [0, 1]. The transform is exactly the training-time one
//! (plan-flag encoding, risk-tier lookup, usage score, scaling), reproduced
//! from the persisted artifacts, never re-derived.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::CustomerProfile;
use crate::error::PipelineError;
use crate::model::FittedGbm;
use crate::preprocessing::FittedPreprocessor;
use crate::store::ArtifactStore;

/// One serving response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Binary churn decision at the 0.5 threshold.
    pub churn: bool,
    /// Churn probability in [0, 1].
    pub probability: f64,
    /// The target label the decision decodes to (e.g. `"True"`).
    pub label: String,
}

/// Loaded model plus preprocessor, ready to answer requests.
#[derive(Debug, Clone)]
pub struct PredictionService {
    preprocessor: FittedPreprocessor,
    model: FittedGbm,
}

impl PredictionService {
    pub fn new(preprocessor: FittedPreprocessor, model: FittedGbm) -> Self {
        Self {
            preprocessor,
            model,
        }
    }

    /// Load the artifacts of the latest run from the store.
    ///
    /// # Errors
    /// [`PipelineError::ModelUnavailable`] when either artifact is missing
    /// or unreadable, so the serving boundary fails clearly instead of
    /// crashing on a request.
    pub fn load(store: &ArtifactStore) -> Result<Self, PipelineError> {
        let preprocessor = store
            .load_preprocessor()
            .map_err(|e| PipelineError::ModelUnavailable(e.to_string()))?;
        let model = store
            .load_model()
            .map_err(|e| PipelineError::ModelUnavailable(e.to_string()))?;
        info!(trees = model.n_trees(), "prediction service loaded");
        Ok(Self::new(preprocessor, model))
    }

    /// Predict churn for one customer profile.
    pub fn predict(&self, profile: &CustomerProfile) -> Result<Prediction, PipelineError> {
        let features = self.preprocessor.transform_profile(profile)?;
        let probability = self.model.predict_proba_one(&features)?;
        let churn = probability >= 0.5;
        let label = self
            .preprocessor
            .target_encoder()
            .decode(if churn { 1.0 } else { 0.0 })?
            .to_string();

        info!(
            state = %profile.state,
            churn,
            probability,
            "prediction served"
        );
        Ok(Prediction {
            churn,
            probability,
            label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawRecord;
    use crate::model::GradientBoostedClassifier;
    use crate::preprocessing::DataPreparer;

    fn record(state: &str, churn: &str, day_charge: f64) -> RawRecord {
        let plan = if churn == "True" { "Yes" } else { "No" };
        RawRecord {
            state: state.to_string(),
            account_length: 100.0,
            area_code: 415.0,
            international_plan: plan.to_string(),
            voice_mail_plan: "No".to_string(),
            number_vmail_messages: 0.0,
            total_day_minutes: day_charge * 5.88,
            total_day_calls: 100.0,
            total_day_charge: day_charge,
            total_eve_minutes: 200.0,
            total_eve_calls: 100.0,
            total_eve_charge: 17.0 + day_charge / 20.0,
            total_night_minutes: 200.0,
            total_night_calls: 100.0,
            total_night_charge: 9.0 + day_charge / 30.0,
            total_intl_minutes: 10.0,
            total_intl_calls: 4.0,
            total_intl_charge: 2.7 + day_charge / 40.0,
            customer_service_calls: 1.0,
            churn: churn.to_string(),
        }
    }

    fn toy_records() -> Vec<RawRecord> {
        let mut records = Vec::new();
        for i in 0..3 {
            records.push(record("AA", "False", 20.0 + i as f64));
        }
        for i in 0..7 {
            records.push(record("BB", "False", 22.0 + i as f64));
        }
        records.push(record("BB", "True", 52.0));
        records.push(record("BB", "True", 55.0));
        for i in 0..2 {
            records.push(record("CC", "False", 24.0 + i as f64));
        }
        records.push(record("CC", "True", 58.0));
        records.push(record("CC", "True", 60.0));
        records.push(record("CC", "True", 62.0));
        for i in 0..3 {
            records.push(record("DD", "False", 21.0 + i as f64));
        }
        records
    }

    fn toy_service() -> PredictionService {
        let records = toy_records();
        let (data, prep) = DataPreparer::new(0.2, 42).prepare(&records).unwrap();
        let model = GradientBoostedClassifier::new()
            .with_n_estimators(15)
            .fit(&data.x_train, &data.y_train)
            .unwrap();
        PredictionService::new(prep, model)
    }

    #[test]
    fn test_predict_returns_probability_in_unit_interval() {
        let service = toy_service();
        let profile = CustomerProfile::from(&toy_records()[0]);

        let prediction = service.predict(&profile).unwrap();
        assert!((0.0..=1.0).contains(&prediction.probability));
        assert_eq!(prediction.churn, prediction.probability >= 0.5);
    }

    #[test]
    fn test_label_decodes_decision() {
        let service = toy_service();
        let churner = CustomerProfile::from(&toy_records()[15]); // a CC churner
        let keeper = CustomerProfile::from(&toy_records()[0]);

        let hot = service.predict(&churner).unwrap();
        let cold = service.predict(&keeper).unwrap();

        assert_eq!(hot.label, if hot.churn { "True" } else { "False" });
        assert_eq!(cold.label, if cold.churn { "True" } else { "False" });
        // The obvious churner scores strictly higher than the keeper.
        assert!(hot.probability > cold.probability);
    }

    #[test]
    fn test_unknown_plan_flag_fails_the_request() {
        let service = toy_service();
        let mut profile = CustomerProfile::from(&toy_records()[0]);
        profile.international_plan = "Sometimes".to_string();

        assert!(matches!(
            service.predict(&profile),
            Err(PipelineError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_missing_artifacts_surface_as_model_unavailable() {
        let base = std::env::temp_dir().join("churn_serve_missing");
        let store = ArtifactStore::new(base.join("processed_data"), base.join("models"));

        let result = PredictionService::load(&store);
        assert!(matches!(
            result,
            Err(PipelineError::ModelUnavailable(_))
        ));
        std::fs::remove_dir_all(base).ok();
    }
}
