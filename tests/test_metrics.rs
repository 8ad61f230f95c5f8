//! Tests for holdout metrics and the exploratory statistics

use dxclass::pipeline::*;
use ndarray::array;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_perfect_multiclass_scores() {
    let y = [0, 1, 2, 0, 1, 2];
    let proba = array![
        [0.8, 0.1, 0.1],
        [0.1, 0.8, 0.1],
        [0.1, 0.1, 0.8],
        [0.7, 0.2, 0.1],
        [0.2, 0.7, 0.1],
        [0.2, 0.1, 0.7],
    ];
    let predicted = dxclass::models::argmax_rows(&proba);
    let summary = MetricSummary::compute(&y, &predicted, &proba).unwrap();

    assert_eq!(summary.accuracy, 1.0);
    assert_eq!(summary.f1_weighted, 1.0);
    assert_eq!(summary.precision_weighted, 1.0);
    assert_eq!(summary.recall_weighted, 1.0);
    assert_eq!(summary.roc_auc_ovo, Some(1.0));
}

#[test]
fn test_weighted_report_with_errors() {
    // Class 0: 3 rows, 2 right; class 1: 1 row, predicted as 0.
    let y_true = [0, 0, 0, 1];
    let y_pred = [0, 0, 1, 0];
    let report = ClassificationReport::new(&y_true, &y_pred, 2).unwrap();

    let c0 = report.per_class[0];
    assert!((c0.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((c0.recall - 2.0 / 3.0).abs() < 1e-12);
    let c1 = report.per_class[1];
    assert_eq!(c1.precision, 0.0);
    assert_eq!(c1.recall, 0.0);
    assert_eq!(c1.f1, 0.0);

    assert_eq!(report.accuracy, 0.5);
    assert!((report.weighted_avg.f1 - 0.5).abs() < 1e-12);
    assert!((report.macro_avg.f1 - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_ovo_auc_binary_matches_rank_statistic() {
    let y = [0, 0, 1, 1];
    let proba = array![[0.9, 0.1], [0.6, 0.4], [0.65, 0.35], [0.2, 0.8]];
    // Positive scores 0.35, 0.8 against negatives 0.1, 0.4: 3 of 4 pairs ordered.
    let auc = roc_auc_ovo(&y, &proba).unwrap();
    assert!((auc - 0.75).abs() < 1e-12);
}

#[test]
fn test_auc_undefined_for_single_class_holdout() {
    let y = [1, 1];
    let proba = array![[0.3, 0.7], [0.4, 0.6]];
    assert!(matches!(roc_auc_ovo(&y, &proba), Err(PipelineError::UndefinedMetric(_))));

    let summary = MetricSummary::compute(&y, &[1, 1], &proba).unwrap();
    assert_eq!(summary.roc_auc_ovo, None);
    assert_eq!(summary.accuracy, 1.0);
}

#[test]
fn test_confusion_matrix_counts() {
    let matrix = ConfusionMatrix::new(&[0, 1, 2, 2], &[0, 2, 2, 1], 3).unwrap();
    assert_eq!(matrix.counts, vec![vec![1, 0, 0], vec![0, 0, 1], vec![0, 1, 1]]);
    assert_eq!(matrix.support(2), 2);
    assert_eq!(matrix.total(), 4);
}

#[test]
fn test_statistics_table_on_cohort() {
    let derived = derive_table(&create_aibl_dataframe_with_undiagnosed()).unwrap();
    let rows = statistics_table(&derived.frame).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].feature, "Age at Examination");
    assert_eq!(rows[1].feature, "MMSE");

    // 6 AD rows of 20 diagnosed; the undiagnosed row belongs to neither group.
    assert!((rows[0].probability_ad - 0.3).abs() < 1e-12);
    assert!((rows[0].probability_non_ad - 0.7).abs() < 1e-12);

    // MMSE separates AD (20/21) from non-AD (24..29) completely.
    let mmse = &rows[1];
    assert!(mmse.mean_ad.unwrap() < mmse.mean_non_ad.unwrap());
    assert!(mmse.t_test_p_value.unwrap() < 1e-6);
    assert_eq!(rows[0].pearson, rows[1].pearson);
}

#[test]
fn test_describe_and_missing_summary() {
    let df = with_missing(&create_aibl_dataframe(), "MMSCORE", 3);
    let derived = derive_table(&df).unwrap();

    let summaries = describe(&derived.frame).unwrap();
    let mmse = summaries.iter().find(|s| s.name == "MMSCORE").unwrap();
    assert_eq!(mmse.count, 19);

    let missing = missing_summary(&derived.frame);
    assert_eq!(missing[0].0, "MMSCORE");
    assert_eq!(missing[0].1, 1);
    assert!((missing[0].2 - 0.05).abs() < 1e-12);

    let counts = label_counts(&derived.frame).unwrap();
    assert_eq!(counts, vec![(0, 7), (1, 7), (2, 6)]);
}
