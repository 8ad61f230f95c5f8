//! Classification estimators
//!
//! Every estimator implements [`Classifier`]: fit on a dense matrix with
//! encoded labels `0..n_classes`, then predict classes or class
//! probabilities. Estimators are built fresh from a [`ModelKind`] for every
//! fold, so no fitted state is shared between evaluations.

mod adaboost;
mod boosting;
mod forest;
mod knn;
mod logistic;
mod naive_bayes;
mod registry;
mod tree;

use ndarray::Array2;
use thiserror::Error;

pub use adaboost::AdaBoost;
pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use knn::KNearestNeighbors;
pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;
pub use registry::{build_model, ModelKind, ModelSettings};
pub use tree::{DecisionTree, MaxFeatures, TreeParams};

/// Failures raised by an estimator
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model has not been fit")]
    NotFitted,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("training labels contain {found} class(es); at least {needed} required")]
    TooFewClasses { found: usize, needed: usize },

    #[error("label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("did not converge after {iterations} iterations (max gradient {gradient:.3e})")]
    NotConverged { iterations: usize, gradient: f64 },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("{0} does not support probability estimates")]
    ProbabilitiesUnsupported(String),

    #[error("numerical failure: {0}")]
    Numerical(String),
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Uniform estimator contract
pub trait Classifier: Send + Sync {
    /// Human readable name used in reports
    fn name(&self) -> &str;

    /// Learn from `x` (rows = samples) and labels in `0..n_classes`
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()>;

    /// Class probabilities, one column per class
    fn predict_proba(&self, _x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        Err(ModelError::ProbabilitiesUnsupported(self.name().to_string()))
    }

    /// Most probable class per row
    fn predict(&self, x: &Array2<f64>) -> ModelResult<Vec<usize>> {
        Ok(argmax_rows(&self.predict_proba(x)?))
    }

    /// Hyperparameters and fitted state, for artifact export
    fn parameters(&self) -> serde_json::Result<serde_json::Value>;
}

/// Column of the largest value in each row (first on ties)
pub fn argmax_rows(proba: &Array2<f64>) -> Vec<usize> {
    proba
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |best, (i, &p)| {
                    if p > best.1 {
                        (i, p)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect()
}

/// Validate training input shared by every estimator
pub(crate) fn check_training_input(
    x: &Array2<f64>,
    y: &[usize],
    n_classes: usize,
) -> ModelResult<()> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch(format!(
            "{} rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(&label) = y.iter().find(|&&l| l >= n_classes) {
        return Err(ModelError::LabelOutOfRange { label, n_classes });
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Numerical(
            "training matrix contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

/// Validate the feature count at prediction time
pub(crate) fn check_n_features(x: &Array2<f64>, expected: usize) -> ModelResult<()> {
    if x.ncols() != expected {
        return Err(ModelError::ShapeMismatch(format!(
            "model was fit on {} features, got {}",
            expected,
            x.ncols()
        )));
    }
    Ok(())
}

/// Sorted distinct labels present in `y`
pub(crate) fn present_classes(y: &[usize], n_classes: usize) -> Vec<usize> {
    let mut seen = vec![false; n_classes];
    for &label in y {
        seen[label] = true;
    }
    (0..n_classes).filter(|&c| seen[c]).collect()
}

/// Numerically stable in-place softmax of each row
pub(crate) fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|s| (s - max).exp());
        let total = row.sum();
        row.mapv_inplace(|e| e / total);
    }
}
