//! Loading and schema of the raw customer table.
//!
//! The input is a single delimited file with one row per customer. Column
//! names follow the telecom churn dataset; deserialization is strict, so a
//! missing or mistyped column aborts the run instead of being coerced.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;

/// One raw customer row as it appears in the input table.
///
/// Plan flags and the target are kept as strings here; encoding to integer
/// codes is a fitted step of the preparation pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Account length")]
    pub account_length: f64,
    #[serde(rename = "Area code")]
    pub area_code: f64,
    #[serde(rename = "International plan")]
    pub international_plan: String,
    #[serde(rename = "Voice mail plan")]
    pub voice_mail_plan: String,
    #[serde(rename = "Number vmail messages")]
    pub number_vmail_messages: f64,
    #[serde(rename = "Total day minutes")]
    pub total_day_minutes: f64,
    #[serde(rename = "Total day calls")]
    pub total_day_calls: f64,
    #[serde(rename = "Total day charge")]
    pub total_day_charge: f64,
    #[serde(rename = "Total eve minutes")]
    pub total_eve_minutes: f64,
    #[serde(rename = "Total eve calls")]
    pub total_eve_calls: f64,
    #[serde(rename = "Total eve charge")]
    pub total_eve_charge: f64,
    #[serde(rename = "Total night minutes")]
    pub total_night_minutes: f64,
    #[serde(rename = "Total night calls")]
    pub total_night_calls: f64,
    #[serde(rename = "Total night charge")]
    pub total_night_charge: f64,
    #[serde(rename = "Total intl minutes")]
    pub total_intl_minutes: f64,
    #[serde(rename = "Total intl calls")]
    pub total_intl_calls: f64,
    #[serde(rename = "Total intl charge")]
    pub total_intl_charge: f64,
    #[serde(rename = "Customer service calls")]
    pub customer_service_calls: f64,
    #[serde(rename = "Churn")]
    pub churn: String,
}

impl RawRecord {
    /// The four per-band charge columns, in feature-matrix order.
    pub fn charges(&self) -> [f64; 4] {
        [
            self.total_day_charge,
            self.total_eve_charge,
            self.total_night_charge,
            self.total_intl_charge,
        ]
    }
}

/// The raw per-customer fields a serving request carries.
///
/// Same shape as [`RawRecord`] minus the target and the columns the
/// preparation pipeline drops (area code, voicemail plan, minutes).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomerProfile {
    pub state: String,
    pub account_length: f64,
    pub international_plan: String,
    pub number_vmail_messages: f64,
    pub total_day_calls: f64,
    pub total_day_charge: f64,
    pub total_eve_calls: f64,
    pub total_eve_charge: f64,
    pub total_night_calls: f64,
    pub total_night_charge: f64,
    pub total_intl_calls: f64,
    pub total_intl_charge: f64,
    pub customer_service_calls: f64,
}

impl CustomerProfile {
    /// The four per-band charge columns, in feature-matrix order.
    pub fn charges(&self) -> [f64; 4] {
        [
            self.total_day_charge,
            self.total_eve_charge,
            self.total_night_charge,
            self.total_intl_charge,
        ]
    }
}

impl From<&RawRecord> for CustomerProfile {
    fn from(record: &RawRecord) -> Self {
        CustomerProfile {
            state: record.state.clone(),
            account_length: record.account_length,
            international_plan: record.international_plan.clone(),
            number_vmail_messages: record.number_vmail_messages,
            total_day_calls: record.total_day_calls,
            total_day_charge: record.total_day_charge,
            total_eve_calls: record.total_eve_calls,
            total_eve_charge: record.total_eve_charge,
            total_night_calls: record.total_night_calls,
            total_night_charge: record.total_night_charge,
            total_intl_calls: record.total_intl_calls,
            total_intl_charge: record.total_intl_charge,
            customer_service_calls: record.customer_service_calls,
        }
    }
}

/// Load the raw customer table from a CSV file.
///
/// # Errors
/// - [`PipelineError::MissingInput`] if the file does not exist.
/// - [`PipelineError::MalformedInput`] if a row does not match the schema.
/// - [`PipelineError::EmptyData`] if the table has no rows.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>, PipelineError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
            hint: "supply an existing dataset file",
        });
    }

    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut records = Vec::new();
    for row in reader.deserialize::<RawRecord>() {
        records.push(row?);
    }

    if records.is_empty() {
        return Err(PipelineError::EmptyData(format!(
            "no rows in {}",
            path.display()
        )));
    }

    info!(rows = records.len(), path = %path.display(), "loaded raw table");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "State,Account length,Area code,International plan,Voice mail plan,Number vmail messages,Total day minutes,Total day calls,Total day charge,Total eve minutes,Total eve calls,Total eve charge,Total night minutes,Total night calls,Total night charge,Total intl minutes,Total intl calls,Total intl charge,Customer service calls,Churn";

    fn write_temp_csv(name: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        path
    }

    #[test]
    fn test_load_records_parses_columns() {
        let path = write_temp_csv(
            "churn_data_basic.csv",
            &["KS,128,415,No,Yes,25,265.1,110,45.07,197.4,99,16.78,244.7,91,11.01,10.0,3,2.7,1,False"],
        );

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);

        let r = &records[0];
        assert_eq!(r.state, "KS");
        assert_eq!(r.international_plan, "No");
        assert_eq!(r.voice_mail_plan, "Yes");
        assert!((r.total_day_charge - 45.07).abs() < 1e-12);
        assert!((r.customer_service_calls - 1.0).abs() < 1e-12);
        assert_eq!(r.churn, "False");

        let charges = r.charges();
        assert!((charges[0] - 45.07).abs() < 1e-12);
        assert!((charges[3] - 2.7).abs() < 1e-12);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_records_missing_file() {
        let result = load_records("/definitely/not/here.csv");
        assert!(matches!(
            result,
            Err(PipelineError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_load_records_empty_table() {
        let path = write_temp_csv("churn_data_empty.csv", &[]);
        let result = load_records(&path);
        assert!(matches!(result, Err(PipelineError::EmptyData(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_records_malformed_row() {
        let path = write_temp_csv(
            "churn_data_malformed.csv",
            &["KS,not-a-number,415,No,Yes,25,265.1,110,45.07,197.4,99,16.78,244.7,91,11.01,10.0,3,2.7,1,False"],
        );
        let result = load_records(&path);
        assert!(matches!(result, Err(PipelineError::MalformedInput(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_profile_from_record_keeps_serving_fields() {
        let path = write_temp_csv(
            "churn_data_profile.csv",
            &["OH,107,415,Yes,No,0,161.6,123,27.47,195.5,103,16.62,254.4,103,11.45,13.7,3,3.7,1,True"],
        );
        let records = load_records(&path).unwrap();
        let profile = CustomerProfile::from(&records[0]);

        assert_eq!(profile.state, "OH");
        assert_eq!(profile.international_plan, "Yes");
        assert!((profile.total_night_charge - 11.45).abs() < 1e-12);

        std::fs::remove_file(path).ok();
    }
}
