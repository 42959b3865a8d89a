//! Categorical encoding for string columns.
//!
//! Maps each distinct value of a column to a small non-negative code in
//! **sorted (alphabetical) order** of the values seen at fit time, so
//! `"False" < "True"` and `"No" < "Yes"` encode to 0 and 1. Sorted order,
//! not order of encounter, is the documented contract: the same mapping must
//! be reproducible at serving time from the persisted classes alone.
//!
//! A value never seen during fitting is an error, never a default code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::PipelineError;

/// Encoder for one categorical column (unfitted).
#[derive(Debug, Clone)]
pub struct CategoryEncoder {
    column: String,
}

impl CategoryEncoder {
    /// Create an encoder for the named column. The name only feeds error
    /// messages and artifacts; values are supplied explicitly.
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
        }
    }

    /// Learn the distinct values of the column.
    pub fn fit<S: AsRef<str>>(
        &self,
        values: &[S],
    ) -> Result<FittedCategoryEncoder, PipelineError> {
        if values.is_empty() {
            return Err(PipelineError::EmptyData(format!(
                "cannot fit encoder for column {:?} on empty data",
                self.column
            )));
        }

        let classes: BTreeSet<String> = values
            .iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        Ok(FittedCategoryEncoder {
            column: self.column.clone(),
            classes: classes.into_iter().collect(),
        })
    }

    /// Fit and encode in one step.
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        values: &[S],
    ) -> Result<(FittedCategoryEncoder, Vec<f64>), PipelineError> {
        let fitted = self.fit(values)?;
        let encoded = fitted.encode_all(values)?;
        Ok((fitted, encoded))
    }
}

/// Fitted encoder holding the sorted class list.
///
/// The sorted `Vec` is the entire learned state; codes are recovered by
/// binary search, so serializing the classes round-trips the encoder
/// exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedCategoryEncoder {
    column: String,
    classes: Vec<String>,
}

impl FittedCategoryEncoder {
    /// The column this encoder was fit for.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Distinct values seen at fit time, sorted.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Encode one value.
    ///
    /// # Errors
    /// [`PipelineError::UnknownCategory`] for a value not seen at fit time.
    pub fn encode(&self, value: &str) -> Result<f64, PipelineError> {
        match self.classes.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => Ok(idx as f64),
            Err(_) => Err(PipelineError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            }),
        }
    }

    /// Encode a full column.
    pub fn encode_all<S: AsRef<str>>(&self, values: &[S]) -> Result<Vec<f64>, PipelineError> {
        values.iter().map(|v| self.encode(v.as_ref())).collect()
    }

    /// Decode a code back to its string value.
    pub fn decode(&self, code: f64) -> Result<&str, PipelineError> {
        let idx = code.round() as usize;
        self.classes
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::InvalidParameter(format!(
                "code {} out of range for column {:?} ({} classes)",
                code,
                self.column,
                self.classes.len()
            )))
    }
}
