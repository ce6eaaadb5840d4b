//! Random-forest regressor for daily demand.
//!
//! Bootstrap-aggregated CART regression trees grown with variance-reduction
//! splits. Everything is driven by one seeded [`StdRng`], so a fixed seed
//! reproduces the identical ensemble; there is no parallelism and no
//! external model dependency.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::error::ForecastError;
use crate::forecast::features::{FEATURE_COUNT, FeatureRow};

/// Splits with a sum-of-squared-error reduction below this are not worth
/// growing a branch for.
const MIN_GAIN: f64 = 1e-12;

/// Nodes with fewer samples than this become leaves.
const MIN_SAMPLES_SPLIT: usize = 2;

/// Ensemble hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Number of trees in the ensemble.
    pub trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Seed for bootstrap sampling.
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<Node>,
    root: usize,
}

impl DecisionTree {
    fn predict(&self, row: &FeatureRow) -> f64 {
        let mut at = self.root;
        loop {
            match self.nodes[at] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Grows one tree over the given bootstrap sample, accumulating per-feature
/// SSE reductions into `importance_acc`.
struct TreeBuilder<'a> {
    x: &'a [FeatureRow],
    y: &'a [f64],
    max_depth: usize,
    nodes: Vec<Node>,
    importance_acc: &'a mut [f64; FEATURE_COUNT],
}

impl TreeBuilder<'_> {
    /// Mean target and sum of squared errors around it for a sample set.
    fn mean_and_sse(&self, idx: &[usize]) -> (f64, f64) {
        let n = idx.len() as f64;
        let mean = idx.iter().map(|&i| self.y[i]).sum::<f64>() / n;
        let sse = idx
            .iter()
            .map(|&i| {
                let d = self.y[i] - mean;
                d * d
            })
            .sum::<f64>();
        (mean, sse)
    }

    /// Best `(feature, threshold, gain)` over all candidate splits, if any.
    fn best_split(&self, idx: &[usize], parent_sse: f64) -> Option<(usize, f64, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..FEATURE_COUNT {
            let mut ordered: Vec<(f64, f64)> = idx
                .iter()
                .map(|&i| (self.x[i][feature], self.y[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let total_sum: f64 = ordered.iter().map(|(_, t)| t).sum();
            let total_sq: f64 = ordered.iter().map(|(_, t)| t * t).sum();

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;
            for k in 1..ordered.len() {
                left_sum += ordered[k - 1].1;
                left_sq += ordered[k - 1].1 * ordered[k - 1].1;

                // Can only split between distinct feature values.
                if ordered[k].0 <= ordered[k - 1].0 {
                    continue;
                }

                let nl = k as f64;
                let nr = (ordered.len() - k) as f64;
                let sse_left = left_sq - left_sum * left_sum / nl;
                let right_sum = total_sum - left_sum;
                let sse_right = (total_sq - left_sq) - right_sum * right_sum / nr;
                let gain = parent_sse - (sse_left + sse_right);

                if gain > MIN_GAIN && best.is_none_or(|(_, _, g)| gain > g) {
                    let threshold = (ordered[k - 1].0 + ordered[k].0) / 2.0;
                    best = Some((feature, threshold, gain));
                }
            }
        }

        best
    }

    /// Recursively grows the subtree for `idx` and returns its node index.
    fn grow(&mut self, idx: Vec<usize>, depth: usize) -> usize {
        let (mean, sse) = self.mean_and_sse(&idx);

        let split = if depth >= self.max_depth || idx.len() < MIN_SAMPLES_SPLIT || sse <= MIN_GAIN {
            None
        } else {
            self.best_split(&idx, sse)
        };

        let Some((feature, threshold, gain)) = split else {
            self.nodes.push(Node::Leaf { value: mean });
            return self.nodes.len() - 1;
        };

        self.importance_acc[feature] += gain;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = idx
            .into_iter()
            .partition(|&i| self.x[i][feature] <= threshold);

        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes.push(Node::Split {
            feature,
            threshold,
            left,
            right,
        });
        self.nodes.len() - 1
    }
}

/// A fitted random-forest regressor.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    importances: [f64; FEATURE_COUNT],
}

impl RandomForest {
    /// Fits the ensemble on standardized feature rows and their targets.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::Training`] when the input is empty, the
    /// row/target lengths disagree, or any value is non-finite.
    pub fn fit(x: &[FeatureRow], y: &[f64], params: &ForestParams) -> Result<Self, ForecastError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ForecastError::Training(format!(
                "degenerate training set: {} rows, {} targets",
                x.len(),
                y.len()
            )));
        }
        if x.iter().flatten().any(|v| !v.is_finite()) || y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::Training(
                "non-finite value in training data".to_string(),
            ));
        }

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.trees);
        let mut importance_acc = [0.0; FEATURE_COUNT];

        for _ in 0..params.trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let mut builder = TreeBuilder {
                x,
                y,
                max_depth: params.max_depth,
                nodes: Vec::new(),
                importance_acc: &mut importance_acc,
            };
            let root = builder.grow(sample, 0);
            trees.push(DecisionTree {
                nodes: builder.nodes,
                root,
            });
        }

        let total: f64 = importance_acc.iter().sum();
        let importances = if total > 0.0 {
            let mut norm = importance_acc;
            for v in &mut norm {
                *v /= total;
            }
            norm
        } else {
            [0.0; FEATURE_COUNT]
        };

        Ok(Self { trees, importances })
    }

    /// Predicts one row as the mean of all tree predictions.
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Coefficient of determination (R²) on the given data.
    ///
    /// A constant target scores 1.0 when reproduced exactly and 0.0
    /// otherwise.
    pub fn score(&self, x: &[FeatureRow], y: &[f64]) -> f64 {
        let n = y.len() as f64;
        let mean = y.iter().sum::<f64>() / n;
        let ss_tot: f64 = y.iter().map(|t| (t - mean) * (t - mean)).sum();
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(row, t)| {
                let d = t - self.predict(row);
                d * d
            })
            .sum();

        if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res <= MIN_GAIN {
            1.0
        } else {
            0.0
        }
    }

    /// Normalized per-feature importances (SSE reduction share, sum 1.0
    /// whenever any split was made).
    pub fn feature_importances(&self) -> &[f64; FEATURE_COUNT] {
        &self.importances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[(usize, f64)]) -> FeatureRow {
        let mut r = [0.0; FEATURE_COUNT];
        for &(col, v) in values {
            r[col] = v;
        }
        r
    }

    fn small_params() -> ForestParams {
        ForestParams {
            trees: 25,
            max_depth: 6,
            seed: 42,
        }
    }

    #[test]
    fn constant_target_predicts_constant() {
        let x: Vec<FeatureRow> = (0..10).map(|i| row(&[(0, i as f64)])).collect();
        let y = vec![5.0; 10];
        let forest = RandomForest::fit(&x, &y, &small_params()).expect("fit should succeed");
        for r in &x {
            assert!((forest.predict(r) - 5.0).abs() < 1e-9);
        }
        assert!((forest.score(&x, &y) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn learns_a_step_function() {
        // y depends only on feature 3; feature 0 cycles uninformatively.
        let x: Vec<FeatureRow> = (0..40)
            .map(|i| row(&[(3, if i < 20 { 0.0 } else { 1.0 }), (0, (i % 4) as f64)]))
            .collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 10.0 } else { 50.0 }).collect();
        let forest = RandomForest::fit(&x, &y, &small_params()).expect("fit should succeed");

        let score = forest.score(&x, &y);
        assert!(score > 0.9, "R² should be high on a step target, got {score}");

        let importances = forest.feature_importances();
        let total: f64 = importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-9, "importances sum to 1, got {total}");
        assert!(
            importances[3] > 0.5,
            "splitting feature should dominate, got {importances:?}"
        );
    }

    #[test]
    fn tracks_a_linear_trend() {
        let x: Vec<FeatureRow> = (0..30).map(|i| row(&[(0, i as f64)])).collect();
        let y: Vec<f64> = (0..30).map(|i| 100.0 + 3.0 * i as f64).collect();
        let forest = RandomForest::fit(&x, &y, &small_params()).expect("fit should succeed");
        let score = forest.score(&x, &y);
        assert!(score > 0.8, "R² should beat the mean baseline, got {score}");
    }

    #[test]
    fn same_seed_reproduces_predictions() {
        let x: Vec<FeatureRow> = (0..25).map(|i| row(&[(0, (i % 7) as f64)])).collect();
        let y: Vec<f64> = (0..25).map(|i| ((i * 13) % 40) as f64).collect();
        let a = RandomForest::fit(&x, &y, &small_params()).expect("first fit");
        let b = RandomForest::fit(&x, &y, &small_params()).expect("second fit");
        for r in &x {
            assert_eq!(a.predict(r), b.predict(r));
        }
    }

    #[test]
    fn empty_training_set_is_an_error() {
        let err = RandomForest::fit(&[], &[], &small_params()).expect_err("must fail");
        assert!(matches!(err, ForecastError::Training(_)));
    }

    #[test]
    fn non_finite_feature_is_an_error() {
        let x = vec![row(&[(0, f64::NAN)]), row(&[(0, 1.0)])];
        let y = vec![1.0, 2.0];
        let err = RandomForest::fit(&x, &y, &small_params()).expect_err("must fail");
        assert!(matches!(err, ForecastError::Training(_)));
    }
}
