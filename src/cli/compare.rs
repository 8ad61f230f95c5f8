//! `compare`: stratified k-fold cross-validation of several estimators

use anyhow::{Context, Result};
use serde::Serialize;

use super::args::CompareArgs;
use super::steps::load_and_derive;
use crate::pipeline::{
    compare_models, cv_inputs, split_model_data, LabelEncoder, LabelQuality, ModelEvaluation,
    SplitSummary,
};
use crate::report::{display_cv_results, export_run_report, output_path, ReportMetadata, RunReport};
use crate::utils::{
    create_progress_bar, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_seed, print_step_header, print_success, print_warning,
    ConfigCard,
};

#[derive(Debug, Serialize)]
struct CompareResults<'a> {
    label_quality: &'a LabelQuality,
    split: &'a SplitSummary,
    classes: &'a [i64],
    evaluations: &'a [ModelEvaluation],
}

pub fn run_compare(args: &CompareArgs) -> Result<()> {
    let common = &args.common;
    let features = common.feature_list();
    let models = args.model_list();
    let split_options = args.split_options();
    let cv_options = args.cv.options(common.seed);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        command: "compare",
        input: &common.input,
        target: common.target.description(),
        output: &common.output_dir,
        settings: vec![
            ("Features", features.len().to_string()),
            ("Estimators", models.len().to_string()),
            ("Test fraction", format!("{:.2}", split_options.test_fraction)),
            ("Stratified split", split_options.stratify.to_string()),
            ("Folds", cv_options.folds.to_string()),
            ("CV scaling", format!("{:?}", cv_options.scaling)),
        ],
    });
    print_seed(common.seed);

    let derived = load_and_derive(common)?;

    print_step_header(3, "Select Features and Split");
    let data = split_model_data(&derived.frame, common.target, &features, &split_options)
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

    let encoder = LabelEncoder::fit(&data.train.train_labels());
    let (train_features, train_labels) = cv_inputs(&data.train, &encoder)?;

    print_step_header(4, "Cross-Validation");
    let progress = create_progress_bar((models.len() * cv_options.folds) as u64, "Cross-validating");
    let evaluations = compare_models(
        &models,
        &args.cv.settings(common.seed),
        &train_features,
        &train_labels,
        encoder.n_classes(),
        &cv_options,
        &progress,
    )?;
    let failed = evaluations.iter().filter(|e| e.is_failed()).count();
    if failed == 0 {
        finish_with_success(&progress, "All estimators evaluated");
    } else {
        finish_with_warning(&progress, &format!("{} estimator(s) failed", failed));
    }
    display_cv_results(&evaluations, &cv_options.scorers, cv_options.folds);

    print_step_header(5, "Save Results");
    let report_path = output_path(&common.output_dir, &common.input, "compare_report.json");
    let report = RunReport {
        metadata: ReportMetadata::new("compare", &common.input),
        config: args,
        results: CompareResults {
            label_quality: &derived.quality,
            split: &data.summary,
            classes: &encoder.classes,
            evaluations: &evaluations,
        },
    };
    export_run_report(&report, &report_path)?;
    print_success(&format!("Run report saved to {}", report_path.display()));

    print_completion("compare");
    Ok(())
}
