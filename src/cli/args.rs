//! Command-line argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::models::{ModelKind, ModelSettings};
use crate::pipeline::{default_features, CvOptions, ScalingMode, SplitOptions, TargetKind};
use crate::report::TableFormat;

/// dxclass - Diagnostic classification experiments on the AIBL cohort
#[derive(Parser, Debug)]
#[command(name = "dxclass")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summary statistics and the AD vs non-AD statistics table
    Explore(ExploreArgs),

    /// Cross-validate a set of estimators on the training split
    Compare(CompareArgs),

    /// Cross-validate, fit and score one estimator on the holdout split
    Evaluate(EvaluateArgs),
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Serialize)]
pub struct CommonArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long, default_value = "AIBL.csv")]
    pub input: PathBuf,

    /// Directory for the derived table, statistics and reports
    #[arg(short, long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for a full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,

    /// What to predict: three-class diagnosis or AD vs non-AD
    #[arg(long, value_enum, default_value = "diagnosis")]
    pub target: TargetKind,

    /// Model features (comma-separated, in order).
    /// Defaults to the 30 biomarker, cognitive and demographic columns.
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Seed for the split, the folds and seeded estimators
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Format of the derived table written to the output directory
    #[arg(long, value_enum, default_value = "csv")]
    pub derived_format: TableFormat,
}

impl CommonArgs {
    /// Requested features, or the default list when none were given
    pub fn feature_list(&self) -> Vec<String> {
        if self.features.is_empty() {
            default_features()
        } else {
            self.features.clone()
        }
    }
}

/// Split options shared by the modelling commands
#[derive(Args, Debug, Clone, Serialize)]
pub struct SplitArgs {
    /// Fraction of rows held out for testing
    #[arg(long, value_parser = validate_fraction)]
    pub test_fraction: Option<f64>,

    /// Preserve class proportions in the train/test split
    #[arg(long, default_value = "false")]
    pub stratify: bool,
}

/// Cross-validation options shared by the modelling commands
#[derive(Args, Debug, Clone, Serialize)]
pub struct CvArgs {
    /// Number of stratified folds
    #[arg(long, default_value = "10", value_parser = validate_folds)]
    pub folds: usize,

    /// Where the CV imputer and scaler are fit
    #[arg(long, value_enum, default_value = "per-fold")]
    pub scaling: ScalingMode,

    /// Neighbours used by the KNN estimator
    #[arg(long, default_value = "5", value_parser = validate_neighbors)]
    pub neighbors: usize,
}

#[derive(Args, Debug, Clone, Serialize)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone, Serialize)]
pub struct CompareArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub split: SplitArgs,

    #[command(flatten)]
    pub cv: CvArgs,

    /// Estimators to compare (comma-separated). Defaults to all of them.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub models: Vec<ModelKind>,
}

#[derive(Args, Debug, Clone, Serialize)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub split: SplitArgs,

    #[command(flatten)]
    pub cv: CvArgs,

    /// Estimator to evaluate
    #[arg(long, value_enum, default_value = "tuned-boosting")]
    pub model: ModelKind,

    /// Directory for the fitted artifacts.
    /// Defaults to '<output-dir>/artifacts'.
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Skip writing the fitted artifacts
    #[arg(long, default_value = "false")]
    pub no_artifacts: bool,
}

pub const COMPARE_TEST_FRACTION: f64 = 0.2;
pub const EVALUATE_TEST_FRACTION: f64 = 0.4;

impl SplitArgs {
    pub fn options(&self, default_fraction: f64, seed: u64) -> SplitOptions {
        SplitOptions {
            test_fraction: self.test_fraction.unwrap_or(default_fraction),
            seed,
            stratify: self.stratify,
        }
    }
}

impl CvArgs {
    pub fn options(&self, seed: u64) -> CvOptions {
        CvOptions {
            folds: self.folds,
            seed,
            scaling: self.scaling,
            ..CvOptions::default()
        }
    }

    pub fn settings(&self, seed: u64) -> ModelSettings {
        ModelSettings {
            neighbors: self.neighbors,
            seed,
        }
    }
}

impl CompareArgs {
    pub fn split_options(&self) -> SplitOptions {
        self.split.options(COMPARE_TEST_FRACTION, self.common.seed)
    }

    /// Requested estimators, or every estimator when none were given
    pub fn model_list(&self) -> Vec<ModelKind> {
        if self.models.is_empty() {
            ModelKind::ALL.to_vec()
        } else {
            self.models.clone()
        }
    }
}

impl EvaluateArgs {
    pub fn split_options(&self) -> SplitOptions {
        self.split.options(EVALUATE_TEST_FRACTION, self.common.seed)
    }

    /// `None` when artifacts are disabled
    pub fn artifacts_path(&self) -> Option<PathBuf> {
        if self.no_artifacts {
            return None;
        }
        Some(
            self.artifacts_dir
                .clone()
                .unwrap_or_else(|| self.common.output_dir.join("artifacts")),
        )
    }
}

/// Validator for the test fraction, exclusive of both ends
fn validate_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_fraction must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}

/// Validator for the number of folds
fn validate_folds(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of folds", s))?;

    if value < 2 {
        Err(format!("folds must be at least 2, got {}", value))
    } else {
        Ok(value)
    }
}

fn validate_neighbors(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of neighbours", s))?;

    if value == 0 {
        Err("neighbors must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explore_defaults() {
        let cli = Cli::parse_from(["dxclass", "explore"]);
        let Commands::Explore(args) = cli.command else {
            panic!("expected explore");
        };
        assert_eq!(args.common.input, PathBuf::from("AIBL.csv"));
        assert_eq!(args.common.seed, 42);
        assert_eq!(args.common.target, TargetKind::Diagnosis);
        assert_eq!(args.common.feature_list().len(), 30);
    }

    #[test]
    fn test_per_command_test_fraction_defaults() {
        let cli = Cli::parse_from(["dxclass", "compare"]);
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.split_options().test_fraction, 0.2);
        assert_eq!(args.model_list().len(), ModelKind::ALL.len());

        let cli = Cli::parse_from(["dxclass", "evaluate"]);
        let Commands::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.split_options().test_fraction, 0.4);
        assert_eq!(args.model, ModelKind::TunedBoosting);
        assert_eq!(args.artifacts_path(), Some(PathBuf::from("./artifacts")));
    }

    #[test]
    fn test_model_and_feature_lists_parse() {
        let cli = Cli::parse_from([
            "dxclass",
            "compare",
            "--models",
            "knn,naive-bayes",
            "--features",
            "MMSCORE,ExamAge",
            "--folds",
            "3",
            "--scaling",
            "fit-once",
        ]);
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.model_list(), vec![ModelKind::Knn, ModelKind::NaiveBayes]);
        assert_eq!(args.common.feature_list(), vec!["MMSCORE", "ExamAge"]);
        assert_eq!(args.cv.options(1).folds, 3);
        assert_eq!(args.cv.options(1).scaling, ScalingMode::FitOnce);
    }

    #[test]
    fn test_validators_reject_bad_values() {
        assert!(Cli::try_parse_from(["dxclass", "compare", "--folds", "1"]).is_err());
        assert!(Cli::try_parse_from(["dxclass", "compare", "--test-fraction", "1.0"]).is_err());
        assert!(Cli::try_parse_from(["dxclass", "evaluate", "--neighbors", "0"]).is_err());
        assert!(Cli::try_parse_from(["dxclass", "evaluate", "--model", "svm"]).is_err());
    }

    #[test]
    fn test_no_artifacts_disables_path() {
        let cli = Cli::parse_from(["dxclass", "evaluate", "--no-artifacts"]);
        let Commands::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert!(args.artifacts_path().is_none());
    }
}
