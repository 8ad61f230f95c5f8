//! k-nearest-neighbour vote

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{check_n_features, check_training_input, Classifier, ModelError, ModelResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    pub k: usize,
    n_classes: usize,
    train_x: Option<Array2<f64>>,
    train_y: Vec<usize>,
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            n_classes: 0,
            train_x: None,
            train_y: Vec::new(),
        }
    }
}

impl Default for KNearestNeighbors {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Classifier for KNearestNeighbors {
    fn name(&self) -> &str {
        "KNN"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;
        self.n_classes = n_classes;
        self.train_x = Some(x.clone());
        self.train_y = y.to_vec();
        Ok(())
    }

    /// Fraction of the k nearest training rows (Euclidean) in each class
    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        let train = self.train_x.as_ref().ok_or(ModelError::NotFitted)?;
        check_n_features(x, train.ncols())?;

        let k = self.k.min(train.nrows());
        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));

        for (i, query) in x.rows().into_iter().enumerate() {
            let mut distances: Vec<(f64, usize)> = train
                .rows()
                .into_iter()
                .enumerate()
                .map(|(j, row)| {
                    let d: f64 = row.iter().zip(query.iter()).map(|(a, b)| (a - b).powi(2)).sum();
                    (d, j)
                })
                .collect();

            // Ties on distance go to the earlier training row.
            let by_distance = |a: &(f64, usize), b: &(f64, usize)| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            };
            if k < distances.len() {
                distances.select_nth_unstable_by(k - 1, by_distance);
            }
            for &(_, j) in &distances[..k] {
                proba[[i, self.train_y[j]]] += 1.0 / k as f64;
            }
        }

        Ok(proba)
    }

    fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
