//! Feature engineering and data preparation.
//!
//! This module is the algorithmic core of the pipeline. Each transformer
//! follows the same pattern: an unfitted value with configuration, a `fit`
//! step that learns parameters from data, and a fitted value object that
//! applies the learned transform and serializes losslessly.
//!
//! # Pipeline order
//!
//! [`DataPreparer::prepare`] runs the stages in a fixed order; violating it
//! would leak test-set statistics into training-time features:
//!
//! 1. Outlier clipping of the designated count columns ([`outliers`])
//! 2. Categorical encoding of plan flag and target ([`encode`])
//! 3. Stratified, seeded train/test split ([`split`])
//! 4. State risk tiers, fit on the training split only ([`risk`])
//! 5. Usage-score weights, fit on the training split only ([`usage`])
//! 6. Feature assembly in the fixed [`FEATURE_NAMES`] layout
//! 7. Standard scaling, fit on training features only ([`scale`])
//! 8. Minority oversampling of the training set only ([`smote`])
//!
//! The learned state of steps 2, 4, 5 and 7 is returned as one
//! [`FittedPreprocessor`] and reused verbatim at serving time.

pub mod encode;
pub mod outliers;
pub mod pipeline;
pub mod risk;
pub mod scale;
pub mod smote;
pub mod split;
pub mod usage;

pub use encode::{CategoryEncoder, FittedCategoryEncoder};
pub use outliers::{clip_outliers, ClipBounds};
pub use pipeline::{DataPreparer, FittedPreprocessor, PreparedData, FEATURE_NAMES};
pub use risk::{FittedRegionTiers, RegionRiskBucketer};
pub use scale::{FittedStandardScaler, StandardScaler};
pub use smote::Smote;
pub use split::{stratified_split, SplitIndices};
pub use usage::{UsageWeights, CHARGE_COLUMNS};
