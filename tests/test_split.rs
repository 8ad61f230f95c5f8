//! Tests for train/test splitting and stratified folds

use std::collections::BTreeSet;

use dxclass::pipeline::*;

fn cohort_labels(n: usize) -> Vec<i64> {
    (0..n).map(|i| (i % 3) as i64).collect()
}

#[test]
fn test_partitions_are_disjoint_and_cover_every_row() {
    let labels = cohort_labels(47);
    for fraction in [0.1, 0.2, 0.25, 0.4, 0.5] {
        for stratify in [false, true] {
            let options = SplitOptions {
                test_fraction: fraction,
                seed: 42,
                stratify,
            };
            let split = train_test_split(&labels, &options).unwrap();
            let train: BTreeSet<usize> = split.train.iter().copied().collect();
            let test: BTreeSet<usize> = split.test.iter().copied().collect();

            assert!(train.is_disjoint(&test), "overlap at {fraction} stratify={stratify}");
            assert_eq!(train.len() + test.len(), labels.len());
            assert_eq!(
                train.union(&test).copied().collect::<Vec<_>>(),
                (0..labels.len()).collect::<Vec<_>>()
            );
        }
    }
}

#[test]
fn test_different_seeds_give_different_splits() {
    let labels = cohort_labels(60);
    let a = train_test_split(&labels, &SplitOptions { seed: 1, ..SplitOptions::default() }).unwrap();
    let b = train_test_split(&labels, &SplitOptions { seed: 2, ..SplitOptions::default() }).unwrap();
    assert_ne!(a.test, b.test);
}

#[test]
fn test_stratified_split_preserves_proportions() {
    let labels: Vec<i64> = (0..100).map(|i| if i < 80 { 0 } else { 1 }).collect();
    let options = SplitOptions {
        test_fraction: 0.2,
        seed: 42,
        stratify: true,
    };
    let split = train_test_split(&labels, &options).unwrap();
    let positives = split.test.iter().filter(|&&i| labels[i] == 1).count();
    assert_eq!(split.test.len(), 20);
    assert_eq!(positives, 4);
}

#[test]
fn test_invalid_fraction_is_rejected() {
    let labels = cohort_labels(10);
    for fraction in [0.0, 1.0, -0.2, 1.5] {
        let options = SplitOptions {
            test_fraction: fraction,
            ..SplitOptions::default()
        };
        assert!(matches!(
            train_test_split(&labels, &options),
            Err(PipelineError::InvalidFraction(_))
        ));
    }
}

#[test]
fn test_stratified_folds_cover_each_row_once() {
    let labels: Vec<usize> = (0..53).map(|i| i % 3).collect();
    let folds = stratified_k_fold(&labels, 10, 42).unwrap();
    assert_eq!(folds.len(), 10);

    let mut seen = vec![0usize; labels.len()];
    for fold in &folds {
        for &i in &fold.test {
            seen[i] += 1;
        }
        assert_eq!(fold.train.len() + fold.test.len(), labels.len());
        assert!(fold.train.iter().all(|i| !fold.test.contains(i)));
    }
    assert!(seen.iter().all(|&c| c == 1));

    let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
    let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
    assert!(max - min <= 1);
}

#[test]
fn test_fold_class_balance() {
    let labels: Vec<usize> = (0..60).map(|i| i % 3).collect();
    let folds = stratified_k_fold(&labels, 5, 7).unwrap();
    for fold in folds {
        for class in 0..3 {
            let count = fold.test.iter().filter(|&&i| labels[i] == class).count();
            assert_eq!(count, 4);
        }
    }
}

#[test]
fn test_too_many_folds_is_an_error() {
    let labels = vec![0usize, 1, 0, 1];
    assert!(matches!(
        stratified_k_fold(&labels, 5, 42),
        Err(PipelineError::InvalidFolds { folds: 5, rows: 4 })
    ));
    assert!(stratified_k_fold(&labels, 1, 42).is_err());
}
