//! Gradient boosted regression trees on the multinomial deviance
//!
//! One regression tree per class per round fits the residual
//! `onehot(y) - p`; leaf values take a single Newton step. Binary problems
//! use the same K-class formulation.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::{check_n_features, check_training_input, softmax_rows, Classifier, ModelError, ModelResult};

/// Floor applied to class priors before taking logs
const PRIOR_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum RegressionNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<RegressionNode>,
        right: Box<RegressionNode>,
    },
}

impl RegressionNode {
    fn predict(&self, row: ArrayView1<f64>) -> f64 {
        match self {
            RegressionNode::Leaf { value } => *value,
            RegressionNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

/// Least-squares tree whose leaf values come from a caller-supplied rule
struct RegressionGrower<'a, F: Fn(&[usize]) -> f64> {
    x: &'a Array2<f64>,
    target: &'a Array1<f64>,
    max_depth: usize,
    leaf_value: F,
}

impl<F: Fn(&[usize]) -> f64> RegressionGrower<'_, F> {
    fn grow(&self, rows: Vec<usize>, depth: usize) -> RegressionNode {
        if depth >= self.max_depth || rows.len() < 2 {
            return RegressionNode::Leaf {
                value: (self.leaf_value)(&rows),
            };
        }

        match self.best_split(&rows) {
            Some((feature, threshold)) => {
                let (left, right): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&r| self.x[[r, feature]] <= threshold);
                RegressionNode::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(left, depth + 1)),
                    right: Box::new(self.grow(right, depth + 1)),
                }
            }
            None => RegressionNode::Leaf {
                value: (self.leaf_value)(&rows),
            },
        }
    }

    /// Split maximising `S_l^2 / n_l + S_r^2 / n_r`, i.e. minimising the
    /// children's squared error
    fn best_split(&self, rows: &[usize]) -> Option<(usize, f64)> {
        let total: f64 = rows.iter().map(|&r| self.target[r]).sum();
        let n = rows.len() as f64;
        let baseline = total * total / n;

        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = rows.to_vec();
        for feature in 0..self.x.ncols() {
            sorted.sort_by(|&a, &b| {
                self.x[[a, feature]]
                    .partial_cmp(&self.x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            for i in 0..sorted.len() - 1 {
                left_sum += self.target[sorted[i]];
                let here = self.x[[sorted[i], feature]];
                let next = self.x[[sorted[i + 1], feature]];
                if next <= here {
                    continue;
                }
                let n_left = (i + 1) as f64;
                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / n_left + right_sum * right_sum / (n - n_left) - baseline;
                if gain > 1e-12 && best.map_or(true, |b| gain > b.2) {
                    best = Some((feature, here + (next - here) / 2.0, gain));
                }
            }
        }
        best.map(|(feature, threshold, _)| (feature, threshold))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    name: String,
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    n_features: usize,
    init: Vec<f64>,
    /// `stages[m][k]` is the tree for class `k` at round `m`
    stages: Vec<Vec<RegressionNode>>,
}

impl GradientBoosting {
    pub fn new(name: impl Into<String>, n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            name: name.into(),
            n_estimators,
            learning_rate,
            max_depth,
            n_features: 0,
            init: Vec::new(),
            stages: Vec::new(),
        }
    }

    fn raw_scores(&self, x: &Array2<f64>) -> Array2<f64> {
        let k = self.init.len();
        let mut scores = Array2::<f64>::zeros((x.nrows(), k));
        for (i, row) in x.rows().into_iter().enumerate() {
            for c in 0..k {
                scores[[i, c]] = self.init[c];
            }
            for stage in &self.stages {
                for (c, tree) in stage.iter().enumerate() {
                    scores[[i, c]] += self.learning_rate * tree.predict(row);
                }
            }
        }
        scores
    }
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self::new("Gradient Boosting", 100, 0.1, 3)
    }
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;
        let n = y.len();
        let k = n_classes;

        let mut counts = vec![0.0; k];
        for &label in y {
            counts[label] += 1.0;
        }
        let init: Vec<f64> = counts
            .iter()
            .map(|c| (c / n as f64).max(PRIOR_FLOOR).ln())
            .collect();

        let mut scores = Array2::<f64>::zeros((n, k));
        for mut row in scores.rows_mut() {
            row.assign(&Array1::from(init.clone()));
        }

        let factor = (k as f64 - 1.0) / k as f64;
        let mut stages = Vec::with_capacity(self.n_estimators);
        for round in 0..self.n_estimators {
            let mut proba = scores.clone();
            softmax_rows(&mut proba);

            let mut stage = Vec::with_capacity(k);
            for c in 0..k {
                let residual: Array1<f64> = (0..n)
                    .map(|i| {
                        let target = if y[i] == c { 1.0 } else { 0.0 };
                        target - proba[[i, c]]
                    })
                    .collect();

                let grower = RegressionGrower {
                    x,
                    target: &residual,
                    max_depth: self.max_depth,
                    leaf_value: |rows: &[usize]| {
                        let numerator: f64 = rows.iter().map(|&r| residual[r]).sum();
                        let denominator: f64 = rows
                            .iter()
                            .map(|&r| residual[r].abs() * (1.0 - residual[r].abs()))
                            .sum();
                        if denominator.abs() < 1e-150 {
                            0.0
                        } else {
                            factor * numerator / denominator
                        }
                    },
                };
                let tree = grower.grow((0..n).collect(), 0);
                for (i, row) in x.rows().into_iter().enumerate() {
                    scores[[i, c]] += self.learning_rate * tree.predict(row);
                }
                stage.push(tree);
            }
            stages.push(stage);

            if scores.iter().any(|s| !s.is_finite()) {
                return Err(ModelError::Numerical(format!(
                    "non-finite scores after round {}",
                    round
                )));
            }
        }

        self.init = init;
        self.stages = stages;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        if self.init.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_n_features(x, self.n_features)?;
        let mut scores = self.raw_scores(x);
        softmax_rows(&mut scores);
        Ok(scores)
    }

    fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
