//! Regression trees for gradient boosting.
//!
//! Trees are stored as a flat node arena. Growth is best-first: the leaf
//! with the largest impurity improvement splits next, until `max_leaf_nodes`
//! is reached, no legal split remains, or `max_depth` cuts a branch off.
//! Leaf values are Newton steps `sum(gradient) / sum(hessian)` over the leaf
//! samples, which is what a binomial-deviance booster needs.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// One tree node. Child fields index into the owning tree's arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Internal {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub max_leaf_nodes: usize,
    pub min_samples_leaf: usize,
}

/// A fitted regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// A split proposal for one frontier leaf.
struct SplitInfo {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// A frontier leaf that may still be split.
struct Candidate {
    slot: usize,
    depth: usize,
    split: Option<SplitInfo>,
}

impl RegressionTree {
    /// Fit a tree to per-sample gradients and hessians.
    pub fn fit(
        x: &Array2<f64>,
        grad: &[f64],
        hess: &[f64],
        params: &TreeParams,
    ) -> Self {
        let all: Vec<usize> = (0..x.nrows()).collect();

        let mut nodes = vec![Node::Leaf {
            value: newton_value(&all, grad, hess),
        }];
        let mut frontier = vec![Candidate {
            slot: 0,
            depth: 0,
            split: best_split(x, grad, &all, params),
        }];
        let mut n_leaves = 1;

        while n_leaves < params.max_leaf_nodes {
            // Best-first: split the frontier leaf with the largest gain.
            let best = frontier
                .iter()
                .enumerate()
                .filter(|(_, c)| c.split.is_some())
                .max_by(|(_, a), (_, b)| {
                    let ga = a.split.as_ref().map(|s| s.gain).unwrap_or(f64::NEG_INFINITY);
                    let gb = b.split.as_ref().map(|s| s.gain).unwrap_or(f64::NEG_INFINITY);
                    ga.partial_cmp(&gb).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i);

            let Some(pick) = best else { break };
            let candidate = frontier.swap_remove(pick);
            let split = candidate.split.expect("picked candidate has a split");

            let left_slot = nodes.len();
            let right_slot = nodes.len() + 1;
            nodes.push(Node::Leaf {
                value: newton_value(&split.left, grad, hess),
            });
            nodes.push(Node::Leaf {
                value: newton_value(&split.right, grad, hess),
            });
            nodes[candidate.slot] = Node::Internal {
                feature: split.feature,
                threshold: split.threshold,
                left: left_slot,
                right: right_slot,
            };
            n_leaves += 1;

            let child_depth = candidate.depth + 1;
            for (slot, indices) in [(left_slot, split.left), (right_slot, split.right)] {
                let split = if child_depth < params.max_depth {
                    best_split(x, grad, &indices, params)
                } else {
                    None
                };
                frontier.push(Candidate {
                    slot,
                    depth: child_depth,
                    split,
                });
            }
        }

        Self { nodes }
    }

    /// Predict the raw leaf value for one feature row.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { value } => return *value,
                Node::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of leaves in the fitted tree.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

/// Newton step over a set of samples.
fn newton_value(indices: &[usize], grad: &[f64], hess: &[f64]) -> f64 {
    let num: f64 = indices.iter().map(|&i| grad[i]).sum();
    let den: f64 = indices.iter().map(|&i| hess[i]).sum();
    if den.abs() < 1e-12 {
        0.0
    } else {
        num / den
    }
}

/// Find the best variance-reducing split of `indices`, if any.
///
/// Thresholds sit midway between consecutive distinct feature values; both
/// children must satisfy `min_samples_leaf`. Gains are compared on the
/// variance-reduction surrogate `S_l^2/n_l + S_r^2/n_r - S^2/n`, which
/// shares its argmax with squared-error impurity decrease.
fn best_split(
    x: &Array2<f64>,
    grad: &[f64],
    indices: &[usize],
    params: &TreeParams,
) -> Option<SplitInfo> {
    let n = indices.len();
    if n < 2 * params.min_samples_leaf {
        return None;
    }

    let total: f64 = indices.iter().map(|&i| grad[i]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<(f64, usize, f64)> = None; // (gain, feature, threshold)

    for feature in 0..x.ncols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]]
                .partial_cmp(&x[[b, feature]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        for (pos, &idx) in order.iter().enumerate().take(n - 1) {
            left_sum += grad[idx];
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }

            let here = x[[idx, feature]];
            let next = x[[order[pos + 1], feature]];
            if here == next {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / n_left as f64
                + right_sum * right_sum / n_right as f64
                - parent_score;

            let improves = match &best {
                Some((best_gain, _, _)) => gain > *best_gain,
                None => gain > 1e-12,
            };
            if improves {
                best = Some((gain, feature, (here + next) / 2.0));
            }
        }
    }

    best.map(|(gain, feature, threshold)| {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &idx in indices {
            if x[[idx, feature]] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }
        SplitInfo {
            feature,
            threshold,
            gain,
            left,
            right,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(max_depth: usize, max_leaf_nodes: usize, min_samples_leaf: usize) -> TreeParams {
        TreeParams {
            max_depth,
            max_leaf_nodes,
            min_samples_leaf,
        }
    }

    #[test]
    fn test_step_function_split() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let grad = vec![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let hess = vec![1.0; 6];

        let tree = RegressionTree::fit(&x, &grad, &hess, &params(3, 2, 1));

        // With unit hessians the leaves are plain means.
        assert_eq!(tree.n_leaves(), 2);
        assert!((tree.predict_row(array![1.0].view()) - 1.0).abs() < 1e-12);
        assert!((tree.predict_row(array![11.0].view()) - 5.0).abs() < 1e-12);
        // The threshold lies between the two groups.
        assert!((tree.predict_row(array![5.9].view()) - 1.0).abs() < 1e-12);
        assert!((tree.predict_row(array![6.1].view()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_gradient_stays_single_leaf() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let grad = vec![2.0; 4];
        let hess = vec![1.0; 4];

        let tree = RegressionTree::fit(&x, &grad, &hess, &params(3, 7, 1));
        assert_eq!(tree.n_leaves(), 1);
        assert!((tree.predict_row(array![1.5].view()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_leaf_nodes_bound() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        let grad = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let hess = vec![1.0; 8];

        let tree = RegressionTree::fit(&x, &grad, &hess, &params(10, 3, 1));
        assert_eq!(tree.n_leaves(), 3);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let grad = vec![0.0, 0.0, 0.0, 10.0];
        let hess = vec![1.0; 4];

        // min_samples_leaf = 2 forbids isolating the single outlier.
        let tree = RegressionTree::fit(&x, &grad, &hess, &params(10, 7, 2));
        assert_eq!(tree.n_leaves(), 2);
        // Split must be 2|2: [0,0] and [0,10].
        assert!((tree.predict_row(array![0.5].view()) - 0.0).abs() < 1e-12);
        assert!((tree.predict_row(array![3.0].view()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_depth_bound() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        let grad = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let hess = vec![1.0; 8];

        // Depth 1 allows a single split no matter how many leaves fit.
        let tree = RegressionTree::fit(&x, &grad, &hess, &params(1, 100, 1));
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_newton_value_uses_hessians() {
        let x = array![[0.0], [1.0]];
        let grad = vec![1.0, 1.0];
        let hess = vec![0.25, 0.25];

        let tree = RegressionTree::fit(&x, &grad, &hess, &params(1, 1, 1));
        // Single leaf: (1 + 1) / (0.25 + 0.25) = 4.
        assert!((tree.predict_row(array![0.5].view()) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_feature_split_picks_informative_one() {
        // Feature 0 is noise, feature 1 separates the gradients.
        let x = array![
            [5.0, 0.0],
            [3.0, 0.0],
            [4.0, 0.0],
            [5.0, 1.0],
            [3.0, 1.0],
            [4.0, 1.0]
        ];
        let grad = vec![0.0, 0.0, 0.0, 6.0, 6.0, 6.0];
        let hess = vec![1.0; 6];

        let tree = RegressionTree::fit(&x, &grad, &hess, &params(3, 2, 1));
        assert!((tree.predict_row(array![9.0, 0.0].view()) - 0.0).abs() < 1e-12);
        assert!((tree.predict_row(array![9.0, 1.0].view()) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_serialization_round_trip() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let grad = vec![1.0, 1.0, 1.0, 5.0, 5.0, 5.0];
        let hess = vec![1.0; 6];
        let tree = RegressionTree::fit(&x, &grad, &hess, &params(3, 4, 1));

        let bytes = bincode::serialize(&tree).unwrap();
        let restored: RegressionTree = bincode::deserialize(&bytes).unwrap();

        for v in [0.0, 1.5, 6.0, 11.0, 20.0] {
            let row = array![v];
            assert_eq!(
                tree.predict_row(row.view()),
                restored.predict_row(row.view())
            );
        }
    }
}
