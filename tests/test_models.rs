//! Tests for the estimator stack through the shared `Classifier` contract

use dxclass::models::*;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CENTRES: [[f64; 2]; 3] = [[0.0, 0.0], [4.0, 4.0], [8.0, 0.0]];

/// Three well separated blobs, `per_class` rows each
fn blobs(per_class: usize, seed: u64) -> (Array2<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = per_class * CENTRES.len();
    let mut x = Array2::<f64>::zeros((n, 2));
    let mut y = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % CENTRES.len();
        x[[i, 0]] = CENTRES[class][0] + rng.gen_range(-1.0..1.0);
        x[[i, 1]] = CENTRES[class][1] + rng.gen_range(-1.0..1.0);
        y.push(class);
    }
    (x, y)
}

fn accuracy(y: &[usize], predicted: &[usize]) -> f64 {
    y.iter().zip(predicted).filter(|(a, b)| a == b).count() as f64 / y.len() as f64
}

#[test]
fn test_every_estimator_learns_separated_blobs() {
    let (train_x, train_y) = blobs(30, 1);
    let (test_x, test_y) = blobs(15, 2);
    let settings = ModelSettings::default();

    for kind in ModelKind::ALL {
        let mut model = build_model(kind, &settings);
        model
            .fit(&train_x, &train_y, 3)
            .unwrap_or_else(|e| panic!("{} failed to fit: {}", kind, e));

        let proba = model.predict_proba(&test_x).unwrap();
        assert_eq!(proba.dim(), (test_x.nrows(), 3));
        for row in proba.rows() {
            let total: f64 = row.sum();
            assert!((total - 1.0).abs() < 1e-9, "{} probabilities sum to {}", kind, total);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }

        let predicted = model.predict(&test_x).unwrap();
        assert_eq!(predicted, argmax_rows(&proba));
        let acc = accuracy(&test_y, &predicted);
        assert!(acc >= 0.9, "{} holdout accuracy {}", kind, acc);
    }
}

#[test]
fn test_unfitted_estimators_refuse_to_predict() {
    let (x, _) = blobs(2, 3);
    for kind in ModelKind::ALL {
        let model = build_model(kind, &ModelSettings::default());
        assert!(
            matches!(model.predict_proba(&x), Err(ModelError::NotFitted)),
            "{} predicted without fitting",
            kind
        );
    }
}

#[test]
fn test_seeded_estimators_are_reproducible() {
    let (x, y) = blobs(20, 4);
    let settings = ModelSettings { neighbors: 5, seed: 9 };
    for kind in [ModelKind::RandomForest, ModelKind::AdaBoost, ModelKind::DecisionTree] {
        let mut a = build_model(kind, &settings);
        let mut b = build_model(kind, &settings);
        a.fit(&x, &y, 3).unwrap();
        b.fit(&x, &y, 3).unwrap();
        assert_eq!(
            a.predict_proba(&x).unwrap(),
            b.predict_proba(&x).unwrap(),
            "{} is not deterministic for a fixed seed",
            kind
        );
    }
}

#[test]
fn test_label_out_of_range_is_rejected() {
    let (x, mut y) = blobs(5, 5);
    y[0] = 3;
    for kind in ModelKind::ALL {
        let mut model = build_model(kind, &ModelSettings::default());
        assert!(model.fit(&x, &y, 3).is_err(), "{} accepted label 3", kind);
    }
}

#[test]
fn test_missing_values_are_rejected() {
    let (mut x, y) = blobs(5, 6);
    x[[2, 1]] = f64::NAN;
    let mut model = build_model(ModelKind::NaiveBayes, &ModelSettings::default());
    assert!(model.fit(&x, &y, 3).is_err());
}

#[test]
fn test_parameters_are_json_objects() {
    let (x, y) = blobs(10, 7);
    for kind in ModelKind::ALL {
        let mut model = build_model(kind, &ModelSettings::default());
        model.fit(&x, &y, 3).unwrap();
        let params = model.parameters().unwrap();
        assert!(params.is_object(), "{} parameters are not an object", kind);
    }
}

#[test]
fn test_binary_problem_with_absent_class_column() {
    // Encoded for three classes but class 2 never appears in training.
    let (x, y) = blobs(10, 8);
    let keep: Vec<usize> = (0..y.len()).filter(|&i| y[i] != 2).collect();
    let x = x.select(ndarray::Axis(0), &keep);
    let y: Vec<usize> = keep.iter().map(|&i| y[i]).collect();

    let mut model = build_model(ModelKind::DecisionTree, &ModelSettings::default());
    model.fit(&x, &y, 3).unwrap();
    let proba = model.predict_proba(&x).unwrap();
    assert_eq!(proba.ncols(), 3);
    assert!(proba.column(2).iter().all(|&p| p == 0.0));
}
