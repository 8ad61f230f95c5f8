//! Gaussian naive Bayes

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{check_n_features, check_training_input, present_classes, Classifier, ModelError, ModelResult};

/// Fraction of the largest feature variance added to every variance
const VAR_SMOOTHING: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassModel {
    class: usize,
    log_prior: f64,
    means: Array1<f64>,
    variances: Array1<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    n_features: usize,
    n_classes: usize,
    classes: Vec<ClassModel>,
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self::default()
    }

    fn joint_log_likelihood(&self, row: ndarray::ArrayView1<f64>) -> Vec<f64> {
        self.classes
            .iter()
            .map(|c| {
                let mut ll = c.log_prior;
                for ((&x, &mu), &var) in row.iter().zip(c.means.iter()).zip(c.variances.iter()) {
                    ll -= 0.5 * (2.0 * std::f64::consts::PI * var).ln();
                    ll -= 0.5 * (x - mu).powi(2) / var;
                }
                ll
            })
            .collect()
    }
}

impl Classifier for GaussianNaiveBayes {
    fn name(&self) -> &str {
        "Naive Bayes"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;
        let n = x.nrows() as f64;

        let max_var = x
            .var_axis(Axis(0), 0.0)
            .fold(0.0f64, |m, v| m.max(*v));
        let epsilon = VAR_SMOOTHING * max_var.max(f64::MIN_POSITIVE);

        let mut models = Vec::new();
        for class in present_classes(y, n_classes) {
            let rows: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
            let subset = x.select(Axis(0), &rows);
            let means = subset.mean_axis(Axis(0)).ok_or(ModelError::EmptyTrainingSet)?;
            let variances = subset.var_axis(Axis(0), 0.0).mapv(|v| v + epsilon);
            models.push(ClassModel {
                class,
                log_prior: (rows.len() as f64 / n).ln(),
                means,
                variances,
            });
        }

        self.n_features = x.ncols();
        self.n_classes = n_classes;
        self.classes = models;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_n_features(x, self.n_features)?;

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let jll = self.joint_log_likelihood(row);
            let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let total: f64 = jll.iter().map(|v| (v - max).exp()).sum();
            for (c, v) in self.classes.iter().zip(jll.iter()) {
                proba[[i, c.class]] = (v - max).exp() / total;
            }
        }
        Ok(proba)
    }

    fn parameters(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
