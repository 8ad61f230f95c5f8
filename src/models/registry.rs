//! Named estimator presets

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::adaboost::AdaBoost;
use super::boosting::GradientBoosting;
use super::forest::RandomForest;
use super::knn::KNearestNeighbors;
use super::logistic::LogisticRegression;
use super::naive_bayes::GaussianNaiveBayes;
use super::tree::DecisionTree;
use super::Classifier;

/// Learning rate found by the hyperparameter search behind the main model
pub const TUNED_LEARNING_RATE: f64 = 0.240_566_204_291_892_68;

/// Rounds used by the tuned boosting preset
pub const TUNED_ROUNDS: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    #[value(name = "logistic")]
    Logistic,
    #[value(name = "regularized-logistic")]
    RegularizedLogistic,
    #[value(name = "naive-bayes")]
    NaiveBayes,
    #[value(name = "knn")]
    Knn,
    #[value(name = "decision-tree")]
    DecisionTree,
    #[value(name = "random-forest")]
    RandomForest,
    #[value(name = "gradient-boosting")]
    GradientBoosting,
    #[value(name = "tuned-boosting")]
    TunedBoosting,
    #[value(name = "adaboost")]
    AdaBoost,
}

impl ModelKind {
    pub const ALL: [ModelKind; 9] = [
        ModelKind::Logistic,
        ModelKind::RegularizedLogistic,
        ModelKind::NaiveBayes,
        ModelKind::Knn,
        ModelKind::DecisionTree,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
        ModelKind::TunedBoosting,
        ModelKind::AdaBoost,
    ];

    /// Name shown in tables and reports
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Logistic => "Logistic Regression",
            ModelKind::RegularizedLogistic => "Regularized Logistic",
            ModelKind::NaiveBayes => "Naive Bayes",
            ModelKind::Knn => "KNN",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::GradientBoosting => "Gradient Boosting",
            ModelKind::TunedBoosting => "Tuned Boosting",
            ModelKind::AdaBoost => "AdaBoost",
        }
    }

    /// Command-line spelling
    pub fn cli_name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_else(|| format!("{:?}", self))
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Settings shared by every estimator built for one run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelSettings {
    pub neighbors: usize,
    pub seed: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            neighbors: 5,
            seed: 42,
        }
    }
}

/// Build an unfitted estimator
pub fn build_model(kind: ModelKind, settings: &ModelSettings) -> Box<dyn Classifier> {
    match kind {
        ModelKind::Logistic => Box::new(LogisticRegression::new(kind.display_name(), 1.0, 100)),
        ModelKind::RegularizedLogistic => {
            Box::new(LogisticRegression::new(kind.display_name(), 0.1, 10_000))
        }
        ModelKind::NaiveBayes => Box::new(GaussianNaiveBayes::new()),
        ModelKind::Knn => Box::new(KNearestNeighbors::new(settings.neighbors)),
        ModelKind::DecisionTree => Box::new(DecisionTree::new(Default::default(), settings.seed)),
        ModelKind::RandomForest => Box::new(RandomForest::new(100, settings.seed)),
        ModelKind::GradientBoosting => {
            Box::new(GradientBoosting::new(kind.display_name(), 100, 0.1, 3))
        }
        ModelKind::TunedBoosting => Box::new(GradientBoosting::new(
            kind.display_name(),
            TUNED_ROUNDS,
            TUNED_LEARNING_RATE,
            3,
        )),
        ModelKind::AdaBoost => Box::new(AdaBoost::new(50, 1.0, 3, settings.seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_builds_with_its_display_name() {
        let settings = ModelSettings::default();
        for kind in ModelKind::ALL {
            let model = build_model(kind, &settings);
            assert_eq!(model.name(), kind.display_name());
        }
    }

    #[test]
    fn test_cli_names_parse_back() {
        for kind in ModelKind::ALL {
            let parsed = ModelKind::from_str(&kind.cli_name(), false).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_serde_uses_cli_spelling() {
        let json = serde_json::to_string(&ModelKind::TunedBoosting).unwrap();
        assert_eq!(json, "\"tuned-boosting\"");
    }
}
