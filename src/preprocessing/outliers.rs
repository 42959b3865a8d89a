//! IQR-based outlier clipping.
//!
//! Bounds a numeric column to `[Q1 - 3*IQR, Q3 + 3*IQR]` where the quartiles
//! come from linear-interpolation quantiles of the original values. A
//! constant column yields IQR = 0 and a single-point range, which is valid:
//! every value passes through unchanged.

use crate::error::PipelineError;

/// Clip range derived from a column's quartiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Linear interpolation at a fractional index into sorted data.
fn interpolate(sorted: &[f64], idx: f64) -> f64 {
    let lower = idx.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let frac = idx - lower as f64;

    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

/// Compute the `q`-th quantile (0..=1) with linear interpolation.
pub fn quantile(values: &[f64], q: f64) -> Result<f64, PipelineError> {
    if values.is_empty() {
        return Err(PipelineError::EmptyData(
            "cannot take a quantile of an empty column".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(PipelineError::InvalidParameter(format!(
            "quantile must be in [0, 1], got {}",
            q
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let idx = q * (sorted.len() - 1) as f64;
    Ok(interpolate(&sorted, idx))
}

/// Derive the `3*IQR` clip range of a column.
pub fn iqr_bounds(values: &[f64]) -> Result<ClipBounds, PipelineError> {
    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let iqr = q3 - q1;

    Ok(ClipBounds {
        lower: q1 - 3.0 * iqr,
        upper: q3 + 3.0 * iqr,
    })
}

/// Clip every value into the given range, in place.
pub fn clip_in_place(values: &mut [f64], bounds: &ClipBounds) {
    for v in values.iter_mut() {
        *v = v.clamp(bounds.lower, bounds.upper);
    }
}

/// Clip a column to its own IQR-derived range.
///
/// The bounds are computed from the original values before any clipping is
/// applied.
pub fn clip_outliers(values: &mut [f64]) -> Result<ClipBounds, PipelineError> {
    let bounds = iqr_bounds(values)?;
    clip_in_place(values, &bounds);
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        // idx = 0.25 * 3 = 0.75 -> 1.75
        assert!((quantile(&values, 0.25).unwrap() - 1.75).abs() < 1e-12);
        // idx = 0.75 * 3 = 2.25 -> 3.25
        assert!((quantile(&values, 0.75).unwrap() - 3.25).abs() < 1e-12);
        assert!((quantile(&values, 0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((quantile(&values, 1.0).unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_unsorted_input() {
        let values = vec![4.0, 1.0, 3.0, 2.0];
        assert!((quantile(&values, 0.5).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_empty_column() {
        assert!(matches!(
            quantile(&[], 0.5),
            Err(PipelineError::EmptyData(_))
        ));
    }

    #[test]
    fn test_quantile_out_of_range() {
        assert!(matches!(
            quantile(&[1.0], 1.5),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_clip_bounds_property() {
        // One far outlier on each side.
        let mut values = vec![100.0, 101.0, 99.0, 102.0, 98.0, 100.0, 500.0, -300.0];
        let bounds = iqr_bounds(&values).unwrap();

        clip_in_place(&mut values, &bounds);
        for v in &values {
            assert!(*v >= bounds.lower && *v <= bounds.upper);
        }
        // Inliers survive untouched.
        assert!((values[0] - 100.0).abs() < 1e-12);
        // Outliers land exactly on the bounds.
        assert!((values[6] - bounds.upper).abs() < 1e-12);
        assert!((values[7] - bounds.lower).abs() < 1e-12);
    }

    #[test]
    fn test_clip_bounds_from_original_values() {
        // clip_outliers must derive bounds before mutating.
        let original = vec![0.0, 10.0, 10.0, 10.0, 10.0, 1000.0];
        let mut clipped = original.clone();
        let bounds = clip_outliers(&mut clipped).unwrap();

        let expected = iqr_bounds(&original).unwrap();
        assert!((bounds.lower - expected.lower).abs() < 1e-12);
        assert!((bounds.upper - expected.upper).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_passes_through() {
        let mut values = vec![7.0; 12];
        let bounds = clip_outliers(&mut values).unwrap();

        // IQR = 0 collapses the range to a single point.
        assert!((bounds.lower - 7.0).abs() < 1e-12);
        assert!((bounds.upper - 7.0).abs() < 1e-12);
        assert!(values.iter().all(|&v| (v - 7.0).abs() < 1e-12));
    }
}
