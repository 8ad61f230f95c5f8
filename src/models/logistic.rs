//! Multinomial logistic regression with L2 penalty
//!
//! Minimises `sum_i -ln p(y_i | x_i) + ||W||^2 / (2C)` with damped Newton
//! steps. Intercepts are not penalised. Only classes present in the
//! training labels get a row of weights; absent classes score probability 0.

use faer::prelude::*;
use faer::{Mat, Side};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{
    check_n_features, check_training_input, present_classes, softmax_rows, Classifier, ModelError,
    ModelResult,
};

/// Armijo constant for the backtracking line search
const ARMIJO: f64 = 1e-4;

/// Smallest step length tried before giving up
const MIN_STEP: f64 = 1e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    name: String,
    /// Inverse regularisation strength
    pub c: f64,
    pub max_iter: usize,
    /// Convergence threshold on the largest mean-gradient component
    pub tol: f64,
    n_features: usize,
    n_classes: usize,
    /// Global class index of each weight row
    classes: Vec<usize>,
    /// `(classes, features + 1)`, intercept in the last column
    weights: Option<Array2<f64>>,
    pub iterations: usize,
}

impl LogisticRegression {
    pub fn new(name: impl Into<String>, c: f64, max_iter: usize) -> Self {
        Self {
            name: name.into(),
            c,
            max_iter,
            tol: 1e-4,
            n_features: 0,
            n_classes: 0,
            classes: Vec::new(),
            weights: None,
            iterations: 0,
        }
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new("Logistic Regression", 1.0, 100)
    }
}

/// Append a column of ones for the intercept
fn with_intercept(x: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::<f64>::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(s![.., ..x.ncols()]).assign(x);
    out
}

fn probabilities(xt: &Array2<f64>, weights: &Array2<f64>) -> Array2<f64> {
    let mut scores = xt.dot(&weights.t());
    softmax_rows(&mut scores);
    scores
}

fn objective(xt: &Array2<f64>, targets: &[usize], weights: &Array2<f64>, inv_c: f64) -> f64 {
    let p = probabilities(xt, weights);
    let nll: f64 = targets
        .iter()
        .enumerate()
        .map(|(i, &k)| -(p[[i, k]].max(f64::MIN_POSITIVE)).ln())
        .sum();
    let d = weights.ncols() - 1;
    let penalty: f64 = weights.slice(s![.., ..d]).iter().map(|w| w * w).sum();
    nll + 0.5 * inv_c * penalty
}

/// Penalised Hessian of the objective, `(classes * (features + 1))` square
fn hessian(xt: &Array2<f64>, p: &Array2<f64>, d: usize, inv_c: f64) -> Mat<f64> {
    let (n, width) = xt.dim();
    let k = p.ncols();
    let dim = k * width;
    let x = Mat::<f64>::from_fn(n, width, |i, j| xt[[i, j]]);

    let mut h = Mat::<f64>::zeros(dim, dim);
    for a in 0..k {
        for b in a..k {
            let weighted = Mat::<f64>::from_fn(n, width, |i, j| {
                let coef = if a == b {
                    p[[i, a]] * (1.0 - p[[i, a]])
                } else {
                    -p[[i, a]] * p[[i, b]]
                };
                coef * x[(i, j)]
            });
            let block = x.transpose() * &weighted;
            for r in 0..width {
                for c in 0..width {
                    h[(a * width + r, b * width + c)] = block[(r, c)];
                    h[(b * width + c, a * width + r)] = block[(r, c)];
                }
            }
        }
    }

    let ridge = 1e-8 * (1.0 + (0..dim).map(|i| h[(i, i)]).fold(0.0f64, f64::max));
    for a in 0..k {
        for j in 0..width {
            let idx = a * width + j;
            h[(idx, idx)] += if j < d { inv_c } else { ridge };
        }
    }
    h
}

/// Newton direction `H^-1 g` through the Cholesky factor of `H`
fn newton_direction(hessian: &Mat<f64>, grad: &Array1<f64>) -> ModelResult<Array1<f64>> {
    let llt = hessian
        .cholesky(Side::Lower)
        .map_err(|_| ModelError::Numerical("Hessian is not positive definite".to_string()))?;
    let rhs = Mat::<f64>::from_fn(grad.len(), 1, |i, _| grad[i]);
    let solution = llt.solve(rhs.as_ref());
    let direction = Array1::from_shape_fn(grad.len(), |i| solution[(i, 0)]);
    if direction.iter().all(|v| v.is_finite()) {
        Ok(direction)
    } else {
        Err(ModelError::Numerical("Newton step is not finite".to_string()))
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> ModelResult<()> {
        check_training_input(x, y, n_classes)?;
        let classes = present_classes(y, n_classes);
        if classes.len() < 2 {
            return Err(ModelError::TooFewClasses {
                found: classes.len(),
                needed: 2,
            });
        }

        let (n, d) = x.dim();
        let k = classes.len();
        let width = d + 1;
        let inv_c = 1.0 / self.c;

        let mut local = vec![0usize; n_classes];
        for (i, &c) in classes.iter().enumerate() {
            local[c] = i;
        }
        let targets: Vec<usize> = y.iter().map(|&c| local[c]).collect();

        let xt = with_intercept(x);
        let mut weights = Array2::<f64>::zeros((k, width));
        let mut f = objective(&xt, &targets, &weights, inv_c);

        for iter in 0..self.max_iter {
            let p = probabilities(&xt, &weights);

            // Residuals p - onehot(y)
            let mut resid = p.clone();
            for (i, &t) in targets.iter().enumerate() {
                resid[[i, t]] -= 1.0;
            }

            let mut grad_mat = resid.t().dot(&xt);
            grad_mat
                .slice_mut(s![.., ..d])
                .zip_mut_with(&weights.slice(s![.., ..d]), |g, &w| *g += w * inv_c);
            let grad = Array1::from_iter(grad_mat.iter().copied());

            let max_grad = grad.iter().fold(0.0f64, |m, g| m.max(g.abs())) / n as f64;
            if max_grad < self.tol {
                self.iterations = iter;
                self.weights = Some(weights);
                self.classes = classes;
                self.n_features = d;
                self.n_classes = n_classes;
                return Ok(());
            }

            let direction = newton_direction(&hessian(&xt, &p, d, inv_c), &grad)?;
            let slope = grad.dot(&direction);
            let step_mat = Array2::from_shape_vec((k, width), direction.to_vec())
                .map_err(|e| ModelError::Numerical(e.to_string()))?;

            let mut t = 1.0;
            loop {
                let candidate = &weights - &(&step_mat * t);
                let f_new = objective(&xt, &targets, &candidate, inv_c);
                if f_new <= f - ARMIJO * t * slope {
                    weights = candidate;
                    f = f_new;
                    break;
                }
                t *= 0.5;
                if t < MIN_STEP {
                    return Err(ModelError::Numerical(format!(
                        "line search stalled at iteration {}",
                        iter
                    )));
                }
            }
            log::trace!("{}: iteration {} objective {:.6}", self.name, iter, f);
        }

        let p = probabilities(&xt, &weights);
        let mut resid = p;
        for (i, &t) in targets.iter().enumerate() {
            resid[[i, t]] -= 1.0;
        }
        let mut grad_mat = resid.t().dot(&xt);
        grad_mat
            .slice_mut(s![.., ..d])
            .zip_mut_with(&weights.slice(s![.., ..d]), |g, &w| *g += w * inv_c);
        let gradient = grad_mat.iter().fold(0.0f64, |m, g| m.max(g.abs())) / n as f64;

        Err(ModelError::NotConverged {
            iterations: self.max_iter,
            gradient,
        })
    }

    fn predict_proba(&self, x: &Array2<f64>) -> ModelResult<Array2<f64>> {
        let weights = self.weights.as_ref().ok_or(ModelError::NotFitted)?;
        check_n_features(x, self.n_features)?;

        let local = probabilities(&with_intercept(x), weights);
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
