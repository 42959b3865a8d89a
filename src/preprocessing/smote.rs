//! Synthetic minority oversampling (SMOTE).
//!
//! Brings the minority class of the *training* set up to the majority count
//! by interpolating between a randomly chosen minority row and one of its
//! k nearest minority neighbours: `x_new = x + gap * (x_nn - x)` with
//! `gap ~ U(0, 1)`. Runs after scaling, on training data only; the test set
//! keeps its natural class distribution so metrics reflect reality.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PipelineError;

const DEFAULT_K_NEIGHBORS: usize = 5;

/// SMOTE oversampler.
#[derive(Debug, Clone)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    pub fn new(seed: u64) -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            seed,
        }
    }

    /// Override the neighbour count (defaults to 5). The effective k is
    /// capped at `n_minority - 1`.
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors;
        self
    }

    /// Oversample the minority class to exact balance.
    ///
    /// Original rows keep their order; synthetic rows are appended with the
    /// minority label.
    ///
    /// # Errors
    /// - [`PipelineError::DegenerateData`] when labels hold a single class
    ///   or the minority class has fewer than 2 rows.
    pub fn oversample(
        &self,
        x: &Array2<f64>,
        y: &[f64],
    ) -> Result<(Array2<f64>, Vec<f64>), PipelineError> {
        let rows = x.nrows();
        if rows == 0 {
            return Err(PipelineError::EmptyData(
                "cannot oversample an empty training set".to_string(),
            ));
        }
        if rows != y.len() {
            return Err(PipelineError::FeatureMismatch {
                expected: rows,
                got: y.len(),
            });
        }

        let mut class_a = Vec::new();
        let mut class_b = Vec::new();
        let first = y[0].round() as i64;
        for (idx, &label) in y.iter().enumerate() {
            if label.round() as i64 == first {
                class_a.push(idx);
            } else {
                class_b.push(idx);
            }
        }

        if class_b.is_empty() {
            return Err(PipelineError::DegenerateData(
                "training labels hold a single class; nothing to rebalance against".to_string(),
            ));
        }

        if class_a.len() == class_b.len() {
            return Ok((x.clone(), y.to_vec()));
        }

        let (minority, n_needed) = if class_a.len() < class_b.len() {
            (class_a.clone(), class_b.len() - class_a.len())
        } else {
            (class_b.clone(), class_a.len() - class_b.len())
        };
        let minority_label = y[minority[0]];

        if minority.len() < 2 {
            return Err(PipelineError::DegenerateData(format!(
                "minority class has {} row(s); SMOTE needs at least 2",
                minority.len()
            )));
        }

        let k = self.k_neighbors.min(minority.len() - 1);

        // k nearest minority neighbours per minority row, deterministic
        // tie-break by row index.
        let neighbors: Vec<Vec<usize>> = minority
            .iter()
            .map(|&i| {
                let mut dists: Vec<(f64, usize)> = minority
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| (squared_distance(x, i, j), j))
                    .collect();
                dists.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.1.cmp(&b.1))
                });
                dists.into_iter().take(k).map(|(_, j)| j).collect()
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let cols = x.ncols();
        let mut out = Array2::<f64>::zeros((rows + n_needed, cols));
        out.slice_mut(ndarray::s![..rows, ..]).assign(x);
        let mut labels = y.to_vec();

        for synth in 0..n_needed {
            let pick = rng.gen_range(0..minority.len());
            let base = minority[pick];
            let nn = neighbors[pick][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();

            for col in 0..cols {
                let b = x[[base, col]];
                let n = x[[nn, col]];
                out[[rows + synth, col]] = b + gap * (n - b);
            }
            labels.push(minority_label);
        }

        Ok((out, labels))
    }
}

fn squared_distance(x: &Array2<f64>, i: usize, j: usize) -> f64 {
    x.index_axis(Axis(0), i)
        .iter()
        .zip(x.index_axis(Axis(0), j).iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// 6 majority rows around the origin, 2 minority rows far away.
    fn imbalanced_data() -> (Array2<f64>, Vec<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [0.2, 0.1],
            [0.1, 0.2],
            [0.2, 0.2],
            [10.0, 10.0],
            [11.0, 11.0],
        ];
        let y = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        (x, y)
    }

    fn class_counts(y: &[f64]) -> (usize, usize) {
        let pos = y.iter().filter(|&&v| v == 1.0).count();
        (y.len() - pos, pos)
    }

    #[test]
    fn test_classes_balanced_exactly() {
        let (x, y) = imbalanced_data();
        let (out_x, out_y) = Smote::new(42).oversample(&x, &y).unwrap();

        let (neg, pos) = class_counts(&out_y);
        assert_eq!(neg, 6);
        assert_eq!(pos, 6);
        assert_eq!(out_x.nrows(), 12);
        assert_eq!(out_x.ncols(), 2);
    }

    #[test]
    fn test_original_rows_preserved() {
        let (x, y) = imbalanced_data();
        let (out_x, out_y) = Smote::new(42).oversample(&x, &y).unwrap();

        for row in 0..x.nrows() {
            for col in 0..x.ncols() {
                assert_eq!(out_x[[row, col]], x[[row, col]]);
            }
            assert_eq!(out_y[row], y[row]);
        }
    }

    #[test]
    fn test_synthetic_rows_interpolate_minority() {
        let (x, y) = imbalanced_data();
        let (out_x, out_y) = Smote::new(42).oversample(&x, &y).unwrap();

        // Minority rows span [10, 11] per coordinate; every synthetic row
        // is a convex combination of two of them.
        for row in x.nrows()..out_x.nrows() {
            assert_eq!(out_y[row], 1.0);
            for col in 0..out_x.ncols() {
                let v = out_x[[row, col]];
                assert!((10.0..=11.0).contains(&v), "synthetic value {}", v);
            }
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let (x, y) = imbalanced_data();
        let (a_x, a_y) = Smote::new(42).oversample(&x, &y).unwrap();
        let (b_x, b_y) = Smote::new(42).oversample(&x, &y).unwrap();

        assert_eq!(a_y, b_y);
        for (a, b) in a_x.iter().zip(b_x.iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_balanced_input_unchanged() {
        let x = array![[0.0, 0.0], [1.0, 1.0], [10.0, 10.0], [11.0, 11.0]];
        let y = vec![0.0, 0.0, 1.0, 1.0];
        let (out_x, out_y) = Smote::new(42).oversample(&x, &y).unwrap();

        assert_eq!(out_x.nrows(), 4);
        assert_eq!(out_y, y);
    }

    #[test]
    fn test_single_class_is_an_error() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = vec![1.0, 1.0, 1.0];
        assert!(matches!(
            Smote::new(42).oversample(&x, &y),
            Err(PipelineError::DegenerateData(_))
        ));
    }

    #[test]
    fn test_tiny_minority_is_an_error() {
        let x = array![[0.0], [1.0], [2.0], [10.0]];
        let y = vec![0.0, 0.0, 0.0, 1.0];
        assert!(matches!(
            Smote::new(42).oversample(&x, &y),
            Err(PipelineError::DegenerateData(_))
        ));
    }

    #[test]
    fn test_k_capped_by_minority_size() {
        // 2 minority rows force k = 1 regardless of the configured 5.
        let (x, y) = imbalanced_data();
        let (out_x, _) = Smote::new(42).with_k_neighbors(50).oversample(&x, &y).unwrap();
        assert_eq!(out_x.nrows(), 12);
    }

    #[test]
    fn test_length_mismatch() {
        let x = array![[0.0], [1.0]];
        let y = vec![0.0];
        assert!(matches!(
            Smote::new(42).oversample(&x, &y),
            Err(PipelineError::FeatureMismatch { .. })
        ));
    }
}
