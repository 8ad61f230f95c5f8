//! SAMME multi-class AdaBoost over shallow CART trees

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TreeParams};
use super::{
    check_n_features, check_training_input, present_classes, softmax_rows, Classifier, ModelError,
    ModelResult,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoost {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
    n_features: usize,
    n_classes: usize,
    /// Classes seen in training; the SAMME `K`
    classes: Vec<usize>,
    estimators: Vec<DecisionTree>,
    estimator_weights: Vec<f64>,
}

impl AdaBoost {
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            seed,
            n_features: 0,
            n_classes: 0,
            classes: Vec::new(),
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
        }
    }

    /// Number of boosting rounds actually kept
    pub fn n_rounds(&self) -> usize {
        self.estimators.len()
    }
}

impl Default for AdaBoost {
    fn default() -> Self {
        Self::new(50, 1.0, 3, 42)
    }
}

impl Classifier for AdaBoost {
    fn name(&self) -> &str {
        "AdaBoost"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;
        let n = y.len();
        let classes = present_classes(y, n_classes);
        let k = classes.len() as f64;
        let params = TreeParams {
            max_depth: Some(self.max_depth),
            ..TreeParams::default()
        };

        let mut weights = vec![1.0 / n as f64; n];
        let mut estimators = Vec::new();
        let mut estimator_weights = Vec::new();

        for round in 0..self.n_estimators {
            let mut tree = DecisionTree::new(params, self.seed.wrapping_add(round as u64));
            tree.fit_weighted(x, y, n_classes, &weights)?;
            let predicted = tree.predict(x)?;

            let incorrect: Vec<bool> = predicted.iter().zip(y).map(|(p, t)| p != t).collect();
            let total: f64 = weights.iter().sum();
            let error: f64 = weights
                .iter()
                .zip(&incorrect)
                .filter(|(_, &wrong)| wrong)
                .map(|(w, _)| w)
                .sum::<f64>()
                / total;

            if error <= 0.0 {
                // A perfect learner ends boosting with unit weight.
                estimators.push(tree);
                estimator_weights.push(1.0);
                break;
            }
            if error >= 1.0 - 1.0 / k {
                log::debug!("AdaBoost stopped at round {}: error {:.4} no better than chance", round, error);
                if estimators.is_empty() {
                    return Err(ModelError::Numerical(
                        "first base learner is no better than chance".to_string(),
                    ));
                }
                break;
            }

            let alpha = self.learning_rate * (((1.0 - error) / error).ln() + (k - 1.0).ln());
            estimators.push(tree);
            estimator_weights.push(alpha);

            for (w, &wrong) in weights.iter_mut().zip(&incorrect) {
                if wrong {
                    *w *= alpha.exp();
                }
            }
            let total: f64 = weights.iter().sum();
            if !total.is_finite() || total <= 0.0 {
                return Err(ModelError::Numerical(format!(
                    "sample weights degenerated at round {}",
                    round
                )));
            }
            weights.iter_mut().for_each(|w| *w /= total);
        }

        self.estimators = estimators;
        self.estimator_weights = estimator_weights;
        self.n_features = x.ncols();
        self.n_classes = n_classes;
        self.classes = classes;
        Ok(())
    }

    /// Softmax over the training classes of the normalised weighted vote
    /// divided by `K - 1`; absent classes score 0
    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        if self.estimators.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_n_features(x, self.n_features)?;

        let mut decision = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (tree, &alpha) in self.estimators.iter().zip(&self.estimator_weights) {
            for (i, class) in tree.predict(x)?.into_iter().enumerate() {
                decision[[i, class]] += alpha;
            }
        }
        let total: f64 = self.estimator_weights.iter().sum();
        let scale = total * (self.classes.len() as f64 - 1.0).max(1.0);
        let mut local = decision.select(Axis(1), &self.classes);
        local.mapv_inplace(|d| d / scale);
        softmax_rows(&mut local);

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (j, &c) in self.classes.iter().enumerate() {
            proba.column_mut(c).assign(&local.column(j));
        }
        Ok(proba)
    }

    fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_first_learner_stops_early() {
        let x = array![[0.0], [1.0], [2.0], [8.0], [9.0], [10.0]];
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut model = AdaBoost::default();
        model.fit(&x, &y, 2).unwrap();
        assert_eq!(model.n_rounds(), 1);
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_boosts_shallow_learners() {
        // Alternating labels along one axis need more than one stump.
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        let y = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let mut model = AdaBoost::new(30, 1.0, 1, 0);
        model.fit(&x, &y, 2).unwrap();
        assert!(model.n_rounds() > 1);

        let proba = model.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uses_classes_present_in_training() {
        // Encoded for three classes, but class 2 is absent from this fold.
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0]];
        let y = vec![0, 1, 0, 1, 0, 1, 0, 1];
        let mut model = AdaBoost::new(5, 1.0, 1, 0);
        model.fit(&x, &y, 3).unwrap();

        let first = model.estimators[0].predict(&x).unwrap();
        let error = first.iter().zip(&y).filter(|(p, t)| p != t).count() as f64 / y.len() as f64;
        assert!(error > 0.0);
        // Binary SAMME: no ln(K - 1) term.
        let expected = ((1.0 - error) / error).ln();
        assert!((model.estimator_weights[0] - expected).abs() < 1e-12);

        let mut binary = AdaBoost::new(5, 1.0, 1, 0);
        binary.fit(&x, &y, 2).unwrap();
        assert_eq!(model.estimator_weights, binary.estimator_weights);

        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.ncols(), 3);
        assert!(proba.column(2).iter().all(|&p| p == 0.0));
        let two_class = binary.predict_proba(&x).unwrap();
        for (a, b) in proba.rows().into_iter().zip(two_class.rows()) {
            assert!((a[0] - b[0]).abs() < 1e-12 && (a[1] - b[1]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_three_classes() {
        let x = array![[0.0], [0.5], [5.0], [5.5], [10.0], [10.5]];
        let y = vec![0, 0, 1, 1, 2, 2];
        let mut model = AdaBoost::default();
        model.fit(&x, &y, 3).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
    }
}
