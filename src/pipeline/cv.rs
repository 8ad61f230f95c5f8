//! Stratified k-fold cross-validation of estimators
//!
//! Folds are drawn from the training split only. With
//! [`ScalingMode::PerFold`] the preprocessor is refit on each fold's
//! training rows, so no statistic ever sees the fold being scored.

use std::time::Instant;

use clap::ValueEnum;
use indicatif::ProgressBar;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::error::PipelineResult;
use super::features::FeatureFrame;
use super::metrics::{accuracy, roc_auc_ovo};
use super::preprocess::{FittedPreprocessor, Preprocessor};
use super::scope::Train;
use super::split::{stratified_k_fold, Fold};
use crate::models::{argmax_rows, build_model, ModelKind, ModelSettings};

/// Where the CV preprocessor is fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingMode {
    /// Refit imputer and scaler on every fold's training rows
    #[default]
    #[value(name = "per-fold")]
    PerFold,
    /// Fit once on the whole training split before folding
    #[value(name = "fit-once")]
    FitOnce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scorer {
    #[value(name = "accuracy")]
    Accuracy,
    /// Macro one-vs-one ROC AUC
    #[value(name = "roc-auc-ovo")]
    RocAucOvo,
}

impl Scorer {
    pub fn display_name(self) -> &'static str {
        match self {
            Scorer::Accuracy => "Accuracy",
            Scorer::RocAucOvo => "ROC AUC (OvO)",
        }
    }

    fn score(self, y_true: &[usize], proba: &Array2<f64>) -> PipelineResult<f64> {
        match self {
            Scorer::Accuracy => accuracy(y_true, &argmax_rows(proba)),
            Scorer::RocAucOvo => roc_auc_ovo(y_true, proba),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvOptions {
    pub folds: usize,
    pub seed: u64,
    pub scaling: ScalingMode,
    pub scorers: Vec<Scorer>,
}

impl Default for CvOptions {
    fn default() -> Self {
        Self {
            folds: 10,
            seed: 42,
            scaling: ScalingMode::PerFold,
            scorers: vec![Scorer::Accuracy, Scorer::RocAucOvo],
        }
    }
}

/// Per-fold scores of one scorer with their mean and population std
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub scorer: Scorer,
    pub folds: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl ScoreSummary {
    fn new(scorer: Scorer, folds: Vec<f64>) -> Self {
        let n = folds.len().max(1) as f64;
        let mean = folds.iter().sum::<f64>() / n;
        let std = (folds.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n).sqrt();
        Self {
            scorer,
            folds,
            mean,
            std,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CvOutcome {
    Completed { scores: Vec<ScoreSummary> },
    Failed { fold: usize, reason: String },
}

/// Cross-validation result of one estimator
#[derive(Debug, Clone, Serialize)]
pub struct ModelEvaluation {
    pub kind: ModelKind,
    pub name: String,
    pub outcome: CvOutcome,
    pub elapsed_secs: f64,
}

impl ModelEvaluation {
    /// Summary for one scorer, if the run completed
    pub fn summary(&self, scorer: Scorer) -> Option<&ScoreSummary> {
        match &self.outcome {
            CvOutcome::Completed { scores } => scores.iter().find(|s| s.scorer == scorer),
            CvOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CvOutcome::Failed { .. })
    }
}

/// Preprocessor fit on the fold's training rows only
fn fit_on_fold(features: &Train<FeatureFrame>, fold: &Fold) -> PipelineResult<FittedPreprocessor> {
    Preprocessor::fit(&Train::new(features.take_rows(&fold.train)))
}

/// Model-ready training and scoring matrices of one fold. `shared` is the
/// whole training split already transformed in fit-once mode.
fn fold_matrices(
    features: &Train<FeatureFrame>,
    fold: &Fold,
    shared: Option<&FeatureFrame>,
) -> PipelineResult<(FeatureFrame, FeatureFrame)> {
    match shared {
        Some(all) => Ok((all.take_rows(&fold.train), all.take_rows(&fold.test))),
        None => {
            let fitted = fit_on_fold(features, fold)?;
            Ok((
                fitted.transform(&features.take_rows(&fold.train))?,
                fitted.transform(&features.take_rows(&fold.test))?,
            ))
        }
    }
}

/// Score every fold; the first failing fold ends the run with its reason
fn run_folds(
    kind: ModelKind,
    settings: &ModelSettings,
    features: &Train<FeatureFrame>,
    labels: &[usize],
    n_classes: usize,
    options: &CvOptions,
    progress: &ProgressBar,
) -> PipelineResult<CvOutcome> {
    let folds = stratified_k_fold(labels, options.folds, options.seed)?;

    // Fit-once transforms the whole training split up front.
    let shared = match options.scaling {
        ScalingMode::FitOnce => match Preprocessor::fit(features) {
            Ok(fitted) => Some(fitted.transform(features)?),
            Err(e) => {
                return Ok(CvOutcome::Failed {
                    fold: 0,
                    reason: e.to_string(),
                })
            }
        },
        ScalingMode::PerFold => None,
    };

    let mut per_scorer: Vec<Vec<f64>> = vec![Vec::with_capacity(folds.len()); options.scorers.len()];

    for (f, fold) in folds.iter().enumerate() {
        let (train_x, test_x) = match fold_matrices(features, fold, shared.as_ref()) {
            Ok(pair) => pair,
            Err(e) => {
                return Ok(CvOutcome::Failed {
                    fold: f,
                    reason: e.to_string(),
                })
            }
        };

        let train_y: Vec<usize> = fold.train.iter().map(|&i| labels[i]).collect();
        let test_y: Vec<usize> = fold.test.iter().map(|&i| labels[i]).collect();

        let mut model = build_model(kind, settings);
        let proba = match model
            .fit(&train_x.values, &train_y, n_classes)
            .and_then(|_| model.predict_proba(&test_x.values))
        {
            Ok(p) => p,
            Err(e) => {
                log::debug!("{} failed on fold {}: {}", kind, f, e);
                return Ok(CvOutcome::Failed {
                    fold: f,
                    reason: e.to_string(),
                });
            }
        };

        for (scores, scorer) in per_scorer.iter_mut().zip(&options.scorers) {
            match scorer.score(&test_y, &proba) {
                Ok(s) => scores.push(s),
                Err(e) => {
                    return Ok(CvOutcome::Failed {
                        fold: f,
                        reason: e.to_string(),
                    })
                }
            }
        }
        progress.inc(1);
    }

    let scores = options
        .scorers
        .iter()
        .zip(per_scorer)
        .map(|(&scorer, folds)| ScoreSummary::new(scorer, folds))
        .collect();
    Ok(CvOutcome::Completed { scores })
}

/// Cross-validate one estimator on the training split.
///
/// `labels` are encoded class indices aligned with `features`. Estimator
/// and per-fold preprocessing failures become a [`CvOutcome::Failed`];
/// invalid fold settings are returned as errors.
pub fn cross_validate(
    kind: ModelKind,
    settings: &ModelSettings,
    features: &Train<FeatureFrame>,
    labels: &[usize],
    n_classes: usize,
    options: &CvOptions,
    progress: &ProgressBar,
) -> PipelineResult<ModelEvaluation> {
    let start = Instant::now();
    let outcome = run_folds(kind, settings, features, labels, n_classes, options, progress)?;
    let elapsed_secs = start.elapsed().as_secs_f64();

    if let CvOutcome::Failed { fold, reason } = &outcome {
        log::warn!("{} failed on fold {}: {}", kind, fold, reason);
    }

    Ok(ModelEvaluation {
        kind,
        name: kind.display_name().to_string(),
        outcome,
        elapsed_secs,
    })
}

/// Cross-validate each estimator in turn
pub fn compare_models(
    kinds: &[ModelKind],
    settings: &ModelSettings,
    features: &Train<FeatureFrame>,
    labels: &[usize],
    n_classes: usize,
    options: &CvOptions,
    progress: &ProgressBar,
) -> PipelineResult<Vec<ModelEvaluation>> {
    kinds
        .iter()
        .map(|&kind| {
            progress.set_message(kind.display_name());
            let before = progress.position();
            let evaluation =
                cross_validate(kind, settings, features, labels, n_classes, options, progress)?;
            // A failed model stops early; skip its remaining folds on the bar.
            progress.set_position(before + options.folds as u64);
            Ok(evaluation)
        })
        .collect()
}
