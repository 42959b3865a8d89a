//! State risk tiers from historical churn rates.
//!
//! Fitting groups training rows by state, computes the mean churn rate per
//! state, clusters the one-dimensional rates with seeded k-means (k = 3) and
//! assigns ordinal tiers 0 (lowest risk), 1, 2 (highest risk) to the
//! clusters sorted ascending by their mean rate. Equal-mean ties break by
//! ascending cluster index, so the ordering is stable.
//!
//! The state → tier mapping is learned once and applied identically to every
//! row sharing a state; it is never recomputed per row. A state unseen at
//! fit time maps to the Medium tier with a warning.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PipelineError;

/// Number of risk tiers.
const TIERS: usize = 3;
/// Fallback tier for states unseen at fit time.
const MEDIUM_TIER: u8 = 1;

const MAX_ITER: usize = 300;
const TOL: f64 = 1e-9;

/// Bucketer for geographic regions (unfitted).
#[derive(Debug, Clone)]
pub struct RegionRiskBucketer {
    seed: u64,
}

impl RegionRiskBucketer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Fit tiers from per-row states and binary churn labels.
    ///
    /// # Errors
    /// [`PipelineError::DegenerateData`] when fewer than 3 distinct states
    /// (or fewer than 3 distinct churn rates) make k = 3 clustering
    /// ill-posed.
    pub fn fit<S: AsRef<str>>(
        &self,
        states: &[S],
        churn: &[f64],
    ) -> Result<FittedRegionTiers, PipelineError> {
        if states.is_empty() {
            return Err(PipelineError::EmptyData(
                "cannot fit risk tiers on empty data".to_string(),
            ));
        }
        if states.len() != churn.len() {
            return Err(PipelineError::FeatureMismatch {
                expected: states.len(),
                got: churn.len(),
            });
        }

        // Mean churn rate per state, in deterministic (sorted) state order.
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for (state, &label) in states.iter().zip(churn.iter()) {
            let entry = sums.entry(state.as_ref().to_string()).or_insert((0.0, 0));
            entry.0 += label;
            entry.1 += 1;
        }

        let rates: BTreeMap<String, f64> = sums
            .into_iter()
            .map(|(state, (sum, count))| (state, sum / count as f64))
            .collect();

        if rates.len() < TIERS {
            return Err(PipelineError::DegenerateData(format!(
                "risk bucketing needs at least {} distinct states, got {}",
                TIERS,
                rates.len()
            )));
        }

        let rate_values: Vec<f64> = rates.values().copied().collect();
        let mut distinct = rate_values.clone();
        distinct.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        distinct.dedup();
        if distinct.len() < TIERS {
            return Err(PipelineError::DegenerateData(format!(
                "risk bucketing needs at least {} distinct churn rates, got {}",
                TIERS,
                distinct.len()
            )));
        }

        let assignments = kmeans_1d(&rate_values, TIERS, self.seed);

        // Mean rate per cluster, then clusters sorted ascending by mean.
        // Ties break by ascending cluster index (stable sort).
        let mut cluster_means = [0.0f64; TIERS];
        let mut cluster_counts = [0usize; TIERS];
        for (&cluster, &rate) in assignments.iter().zip(rate_values.iter()) {
            cluster_means[cluster] += rate;
            cluster_counts[cluster] += 1;
        }
        for c in 0..TIERS {
            if cluster_counts[c] > 0 {
                cluster_means[c] /= cluster_counts[c] as f64;
            }
        }

        let mut order: Vec<usize> = (0..TIERS).collect();
        order.sort_by(|&a, &b| {
            cluster_means[a]
                .partial_cmp(&cluster_means[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cluster_to_tier = [0u8; TIERS];
        for (tier, &cluster) in order.iter().enumerate() {
            cluster_to_tier[cluster] = tier as u8;
        }

        let tiers: BTreeMap<String, u8> = rates
            .keys()
            .zip(assignments.iter())
            .map(|(state, &cluster)| (state.clone(), cluster_to_tier[cluster]))
            .collect();

        Ok(FittedRegionTiers { tiers, rates })
    }
}

/// Fitted state → tier mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedRegionTiers {
    tiers: BTreeMap<String, u8>,
    rates: BTreeMap<String, f64>,
}

impl FittedRegionTiers {
    /// Tier for a state as a feature value.
    ///
    /// Unseen states fall back to Medium (1) with a warning rather than
    /// aborting; rare states may legitimately be absent from the training
    /// split.
    pub fn tier(&self, state: &str) -> f64 {
        match self.tiers.get(state) {
            Some(&tier) => tier as f64,
            None => {
                warn!(state, fallback = MEDIUM_TIER, "state unseen at fit time");
                MEDIUM_TIER as f64
            }
        }
    }

    /// Tier for a state seen at fit time, if any.
    pub fn tier_of(&self, state: &str) -> Option<u8> {
        self.tiers.get(state).copied()
    }

    /// Training-time churn rate for a state seen at fit time, if any.
    pub fn rate_of(&self, state: &str) -> Option<f64> {
        self.rates.get(state).copied()
    }

    /// Number of states seen at fit time.
    pub fn n_states(&self) -> usize {
        self.tiers.len()
    }
}

/// Seeded one-dimensional k-means: k-means++ initialization, Lloyd
/// iterations to convergence. Returns the cluster index of every value.
fn kmeans_1d(values: &[f64], k: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);

    // k-means++: first center uniform, the rest weighted by squared
    // distance to the nearest chosen center. Distinct values guarantee a
    // nonzero total weight until k centers are placed.
    let mut centers = Vec::with_capacity(k);
    centers.push(values[rng.gen_range(0..values.len())]);
    while centers.len() < k {
        let weights: Vec<f64> = values
            .iter()
            .map(|&v| {
                centers
                    .iter()
                    .map(|&c| (v - c) * (v - c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        let mut target = rng.gen::<f64>() * total;
        // Fall back to the farthest point so rounding never re-picks an
        // existing center.
        let mut chosen = weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        for (i, &w) in weights.iter().enumerate() {
            if w <= 0.0 {
                continue;
            }
            target -= w;
            if target <= 0.0 {
                chosen = i;
                break;
            }
        }
        centers.push(values[chosen]);
    }

    let mut assignments = vec![0usize; values.len()];
    for _ in 0..MAX_ITER {
        // Assignment step; ties go to the lowest cluster index.
        for (i, &v) in values.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, &center) in centers.iter().enumerate() {
                let dist = (v - center) * (v - center);
                if dist < best_dist {
                    best = c;
                    best_dist = dist;
                }
            }
            assignments[i] = best;
        }

        // Update step. An emptied cluster keeps its previous center.
        let mut shift: f64 = 0.0;
        for c in 0..k {
            let members: Vec<f64> = values
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == c)
                .map(|(&v, _)| v)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mean = members.iter().sum::<f64>() / members.len() as f64;
            shift = shift.max((centers[c] - mean).abs());
            centers[c] = mean;
        }

        if shift < TOL {
            break;
        }
    }

    assignments
}
