//! `evaluate`: cross-validate one estimator, fit it on the whole training
//! split and score it on the held-out rows

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use super::args::EvaluateArgs;
use super::steps::load_and_derive;
use crate::models::build_model;
use crate::pipeline::{
    cross_validate, cv_inputs, split_model_data, ConfusionMatrix, FittedStages, LabelQuality,
    MetricSummary, ModelEvaluation, SplitSummary,
};
use crate::report::{
    display_cv_results, display_holdout, export_run_report, output_path, save_artifacts,
    HoldoutEvaluation, ReportMetadata, RunReport,
};
use crate::utils::{
    create_progress_bar, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_count, print_seed, print_step_header, print_success,
    print_warning, ConfigCard,
};

#[derive(Debug, Serialize)]
struct EvaluateResults<'a> {
    label_quality: &'a LabelQuality,
    split: &'a SplitSummary,
    cross_validation: &'a ModelEvaluation,
    holdout: &'a HoldoutEvaluation,
    artifacts: &'a [PathBuf],
}

pub fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let common = &args.common;
    let target = common.target;
    let features = common.feature_list();
    let split_options = args.split_options();
    let cv_options = args.cv.options(common.seed);
    let settings = args.cv.settings(common.seed);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        command: "evaluate",
        input: &common.input,
        target: target.description(),
        output: &common.output_dir,
        settings: vec![
            ("Estimator", args.model.display_name().to_string()),
            ("Features", features.len().to_string()),
            ("Test fraction", format!("{:.2}", split_options.test_fraction)),
            ("Stratified split", split_options.stratify.to_string()),
            ("Folds", cv_options.folds.to_string()),
            ("CV scaling", format!("{:?}", cv_options.scaling)),
        ],
    });
    print_seed(common.seed);

    let derived = load_and_derive(common)?;

    print_step_header(3, "Select Features and Split");
    let data = split_model_data(&derived.frame, target, &features, &split_options)
        .context("Failed to prepare model data")?;
    if data.summary.excluded_undiagnosed > 0 {
        print_warning(&format!(
            "Excluded {} undiagnosed row(s) from modelling",
            data.summary.excluded_undiagnosed
        ));
    }
    print_count(
        "row(s) for modelling",
        data.summary.modelled_rows,
        Some(&format!(
            "(train {}, test {})",
            data.summary.train_rows, data.summary.test_rows
        )),
    );

    print_step_header(4, "Fit Preprocessing");
    let stages = FittedStages::fit(&data.train).context("Failed to fit the preprocessor")?;
    let dropped = &stages.preprocessor.imputer.dropped;
    if !dropped.is_empty() {
        print_warning(&format!(
            "Dropped entirely missing column(s): {}",
            dropped.join(", ")
        ));
    }
    let encoded = stages.encode_train(&data.train)?;
    let (test_x, test_y) = stages
        .encode_holdout(&data.test)
        .context("Failed to transform the holdout split")?;
    print_success(&format!(
        "Imputer and scaler fit on {} training row(s), {} feature(s)",
        encoded.features.nrows(),
        encoded.features.ncols()
    ));

    print_step_header(5, "Cross-Validation");
    let (cv_features, cv_labels) = cv_inputs(&data.train, &stages.encoder)?;
    let progress = create_progress_bar(cv_options.folds as u64, args.model.display_name());
    let cv = cross_validate(
        args.model,
        &settings,
        &cv_features,
        &cv_labels,
        stages.n_classes(),
        &cv_options,
        &progress,
    )?;
    if cv.is_failed() {
        finish_with_warning(&progress, "Cross-validation failed");
    } else {
        finish_with_success(&progress, "Cross-validation complete");
    }
    display_cv_results(std::slice::from_ref(&cv), &cv_options.scorers, cv_options.folds);

    print_step_header(6, "Final Fit and Holdout Evaluation");
    let spinner = create_spinner(&format!("Fitting {}...", args.model.display_name()));
    let mut model = build_model(args.model, &settings);
    model
        .fit(&encoded.features.values, &encoded.labels, stages.n_classes())
        .with_context(|| format!("Failed to fit {}", model.name()))?;
    let proba = model
        .predict_proba(&test_x.values)
        .with_context(|| format!("{} failed to predict the holdout split", model.name()))?;
    finish_with_success(&spinner, "Model fit on the full training split");

    let predicted = crate::models::argmax_rows(&proba);
    let metrics = MetricSummary::compute(&test_y, &predicted, &proba)?;
    let confusion = ConfusionMatrix::new(&test_y, &predicted, stages.n_classes())?;
    let class_names = stages
        .encoder
        .classes
        .iter()
        .map(|&label| target.class_name(label))
        .collect();
    let holdout = HoldoutEvaluation::new(metrics, class_names, confusion);
    display_holdout(&holdout);

    print_step_header(7, "Save Results");
    let artifacts = match args.artifacts_path() {
        Some(dir) => {
            let paths = save_artifacts(&dir, &stages, target, args.model, model.as_ref())?;
            print_success(&format!("Artifacts saved to {}", dir.display()));
            paths
        }
        None => Vec::new(),
    };

    let report_path = output_path(&common.output_dir, &common.input, "evaluate_report.json");
    let report = RunReport {
        metadata: ReportMetadata::new("evaluate", &common.input),
        config: args,
        results: EvaluateResults {
            label_quality: &derived.quality,
            split: &data.summary,
            cross_validation: &cv,
            holdout: &holdout,
            artifacts: &artifacts,
        },
    };
    export_run_report(&report, &report_path)?;
    print_success(&format!("Run report saved to {}", report_path.display()));

    print_completion("evaluate");
    Ok(())
}
