//! Bagged ensemble of randomised trees

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, MaxFeatures, TreeParams};
use super::{check_n_features, check_training_input, Classifier, ModelError, ModelResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_trees: usize,
    pub params: TreeParams,
    pub seed: u64,
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees: n_trees.max(1),
            params: TreeParams {
                max_features: MaxFeatures::Sqrt,
                ..TreeParams::default()
            },
            seed,
            n_features: 0,
            n_classes: 0,
            trees: Vec::new(),
        }
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100, 42)
    }
}

/// Bootstrap draw expressed as per-row multiplicities
fn bootstrap_weights(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut weights = vec![0.0; n];
    for _ in 0..n {
        weights[rng.gen_range(0..n)] += 1.0;
    }
    weights
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "Random Forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;

        // Each tree owns its generator so results do not depend on thread scheduling.
        let trees = (0..self.n_trees)
            .into_par_iter()
            .map(|t| {
                let tree_seed = self.seed.wrapping_add(t as u64);
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let weights = bootstrap_weights(y.len(), &mut rng);
                let mut tree = DecisionTree::new(self.params, rng.gen());
                tree.fit_weighted(x, y, n_classes, &weights)?;
                Ok(tree)
            })
            .collect::<ModelResult<Vec<_>>>()?;

        self.trees = trees;
        self.n_features = x.ncols();
        self.n_classes = n_classes;
        Ok(())
    }

    /// Mean of the per-tree class distributions
    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_n_features(x, self.n_features)?;

        let per_tree = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut sum = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for proba in &per_tree {
            sum += proba;
        }
        Ok(sum / self.trees.len() as f64)
    }

    fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        Ok(serde_json::json!({
            "n_trees": self.n_trees,
            "params": self.params,
            "seed": self.seed,
            "trees": serde_json::to_value(&self.trees)?,
        }))
    }
}
