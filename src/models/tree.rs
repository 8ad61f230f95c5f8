//! CART classification tree (Gini impurity)
//!
//! Also the base learner of the random forest and AdaBoost, which is why
//! fitting accepts per-sample weights and an optional feature subsample.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::{check_n_features, check_training_input, Classifier, ModelError, ModelResult};

/// Number of features examined at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    All,
    /// `floor(sqrt(n_features))`, at least one
    Sqrt,
}

impl MaxFeatures {
    fn count(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => ((n_features as f64).sqrt().floor() as usize).max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn distribution(&self, row: ArrayView1<f64>) -> &[f64] {
        match self {
            Node::Leaf { distribution } => distribution,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.distribution(row)
                } else {
                    right.distribution(row)
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub params: TreeParams,
    pub seed: u64,
    n_features: usize,
    n_classes: usize,
    root: Option<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    params: TreeParams,
    rng: StdRng,
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

impl Builder<'_> {
    fn class_weights(&self, rows: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &r in rows {
            counts[self.y[r]] += self.weights[r];
        }
        counts
    }

    fn leaf(&self, counts: Vec<f64>) -> Node {
        let total: f64 = counts.iter().sum();
        let distribution = if total > 0.0 {
            counts.into_iter().map(|c| c / total).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        Node::Leaf { distribution }
    }

    fn build(&mut self, rows: Vec<usize>, depth: usize) -> Node {
        let counts = self.class_weights(&rows);
        let total: f64 = counts.iter().sum();
        let impurity = gini(&counts, total);

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        if depth_reached || rows.len() < self.params.min_samples_split || impurity <= 1e-12 {
            return self.leaf(counts);
        }

        match self.best_split(&rows) {
            Some(split) => {
                let (left, right): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&r| self.x[[r, split.feature]] <= split.threshold);
                log::trace!(
                    "split on feature {} at {:.4} (impurity {:.4})",
                    split.feature,
                    split.threshold,
                    split.impurity
                );
                Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left: Box::new(self.build(left, depth + 1)),
                    right: Box::new(self.build(right, depth + 1)),
                }
            }
            None => self.leaf(counts),
        }
    }

    /// Lowest weighted child impurity over the sampled features. Falls back
    /// to further features when the sample yields no valid split.
    fn best_split(&mut self, rows: &[usize]) -> Option<BestSplit> {
        let n_features = self.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        let wanted = self.params.max_features.count(n_features);
        if wanted < n_features {
            features.shuffle(&mut self.rng);
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= wanted && best.is_some() {
                break;
            }

            sorted.sort_by(|&a, &b| {
                self.x[[a, feature]]
                    .partial_cmp(&self.x[[b, feature]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left = vec![0.0; self.n_classes];
            let mut right = self.class_weights(&sorted);
            let mut left_total = 0.0;
            let mut right_total: f64 = right.iter().sum();

            for i in 0..sorted.len() - 1 {
                let r = sorted[i];
                let w = self.weights[r];
                left[self.y[r]] += w;
                right[self.y[r]] -= w;
                left_total += w;
                right_total -= w;

                let here = self.x[[r, feature]];
                let next = self.x[[sorted[i + 1], feature]];
                if next <= here {
                    continue;
                }
                let n_left = i + 1;
                if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                    continue;
                }

                let impurity = left_total * gini(&left, left_total) + right_total * gini(&right, right_total);
                if best.as_ref().map_or(true, |b| impurity < b.impurity - 1e-12) {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    pub fn new(params: TreeParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            n_features: 0,
            n_classes: 0,
            root: None,
        }
    }

    /// Fit with per-sample weights; rows of weight zero are ignored
    pub fn fit_weighted(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        weights: &[f64],
    ) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;
        if weights.len() != y.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} sample weights for {} rows",
                weights.len(),
                y.len()
            )));
        }
        let rows: Vec<usize> = (0..y.len()).filter(|&i| weights[i] > 0.0).collect();
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let mut builder = Builder {
            x,
            y,
            weights,
            n_classes,
            params: self.params,
            rng: StdRng::seed_from_u64(self.seed),
        };
        self.root = Some(builder.build(rows, 0));
        self.n_features = x.ncols();
        self.n_classes = n_classes;
        Ok(())
    }

    /// Depth of the fitted tree (a single leaf is depth 0)
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(Node::depth)
    }
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(TreeParams::default(), 42)
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &str {
        "Decision Tree"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        let weights = vec![1.0; y.len()];
        self.fit_weighted(x, y, n_classes, &weights)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        let root = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        check_n_features(x, self.n_features)?;

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            for (c, &p) in root.distribution(row).iter().enumerate() {
                proba[[i, c]] = p;
            }
        }
        Ok(proba)
    }

    fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
