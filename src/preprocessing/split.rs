//! Seeded, stratified train/test splitting.
//!
//! The split is stratified on the binary target: each class is shuffled and
//! divided separately, so the held-out set keeps the natural class balance
//! even when churn is rare. The shuffle is driven by a fixed seed, making
//! every run reproducible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

use crate::error::PipelineError;

/// Row indices of one train/test split.
#[derive(Debug, Clone)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices stratified by label.
///
/// # Errors
/// - [`PipelineError::InvalidParameter`] unless `0 < test_fraction < 1`.
/// - [`PipelineError::EmptyData`] on an empty label vector.
/// - [`PipelineError::DegenerateData`] when a class would lose every row
///   to the test set.
pub fn stratified_split(
    labels: &[f64],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, PipelineError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if labels.is_empty() {
        return Err(PipelineError::EmptyData(
            "cannot split an empty label vector".to_string(),
        ));
    }

    // Group row indices per class, in deterministic class order.
    let mut by_class: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_class.entry(label.round() as i64).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (class, mut indices) in by_class {
        indices.shuffle(&mut rng);

        let n_test = ((indices.len() as f64) * test_fraction).round() as usize;
        if n_test >= indices.len() {
            return Err(PipelineError::DegenerateData(format!(
                "class {} has {} rows; test_fraction {} would leave no training rows",
                class,
                indices.len(),
                test_fraction
            )));
        }

        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    // Stable row order downstream; the shuffle only decides membership.
    train.sort_unstable();
    test.sort_unstable();

    Ok(SplitIndices { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 15 negatives then 5 positives.
    fn imbalanced_labels() -> Vec<f64> {
        let mut labels = vec![0.0; 15];
        labels.extend(vec![1.0; 5]);
        labels
    }

    #[test]
    fn test_split_sizes_are_stratified() {
        let labels = imbalanced_labels();
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        assert_eq!(split.test.len(), 4); // 3 negatives + 1 positive
        assert_eq!(split.train.len(), 16);

        let test_pos = split.test.iter().filter(|&&i| labels[i] == 1.0).count();
        let test_neg = split.test.len() - test_pos;
        assert_eq!(test_pos, 1);
        assert_eq!(test_neg, 3);
    }

    #[test]
    fn test_every_index_appears_exactly_once() {
        let labels = imbalanced_labels();
        let split = stratified_split(&labels, 0.2, 42).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        let expected: Vec<usize> = (0..labels.len()).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels = imbalanced_labels();
        let a = stratified_split(&labels, 0.2, 42).unwrap();
        let b = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn test_different_seed_different_membership() {
        let labels = imbalanced_labels();
        let reference = stratified_split(&labels, 0.2, 42).unwrap();
        let any_differs = (43..49)
            .map(|seed| stratified_split(&labels, 0.2, seed).unwrap())
            .any(|split| split.test != reference.test);
        assert!(any_differs, "every seed produced the same membership");
    }

    #[test]
    fn test_invalid_fraction() {
        let labels = imbalanced_labels();
        for bad in [0.0, 1.0, -0.5, 2.0] {
            assert!(matches!(
                stratified_split(&labels, bad, 42),
                Err(PipelineError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_empty_labels() {
        assert!(matches!(
            stratified_split(&[], 0.2, 42),
            Err(PipelineError::EmptyData(_))
        ));
    }

    #[test]
    fn test_class_losing_all_training_rows() {
        // One positive row with a huge test fraction: rounding would send
        // the whole class to the test set.
        let labels = vec![0.0, 0.0, 0.0, 1.0];
        let result = stratified_split(&labels, 0.6, 42);
        assert!(matches!(result, Err(PipelineError::DegenerateData(_))));
    }
}
