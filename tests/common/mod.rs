//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// The six measured feature columns of the synthetic cohort
pub const MEASURED_FEATURES: [&str; 6] = [
    "MMSCORE",
    "CDGLOBAL",
    "LIMMTOTAL",
    "LDELTOTAL",
    "AXT117",
    "PTGENDER",
];

/// Model input: the measured columns plus the derived age
pub fn model_features() -> Vec<String> {
    MEASURED_FEATURES
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once("ExamAge".to_string()))
        .collect()
}

/// Diagnosis of row `i` in the synthetic cohort: Normal, MCI, AD repeating
pub fn expected_class(i: usize) -> i64 {
    (i % 3) as i64
}

/// Create a synthetic 20-row AIBL-like table with no missing values
///
/// This DataFrame includes:
/// - `DXNORM`/`DXMCI`/`DXAD`: exactly one indicator set per row, cycling
///   Normal, MCI, AD (7 / 7 / 6 rows)
/// - `Examyear`/`PTDOBYear`: so that `ExamAge = 81 + (i % 5) - i`
/// - `APTyear`/`DXCURREN`: redundant columns that derivation drops
/// - six measured features that separate the classes
pub fn create_aibl_dataframe() -> DataFrame {
    create_aibl_dataframe_with_rows(20)
}

/// Same generator with an arbitrary row count
pub fn create_aibl_dataframe_with_rows(rows: usize) -> DataFrame {
    let class = |i: usize| i % 3;
    let flag = |c: usize| (0..rows).map(|i| i32::from(class(i) == c)).collect::<Vec<_>>();

    let exam_year: Vec<i64> = (0..rows).map(|i| 2006 + (i % 5) as i64).collect();
    let birth_year: Vec<i64> = (0..rows).map(|i| 1925 + i as i64).collect();
    let mmse: Vec<f64> = (0..rows)
        .map(|i| 29.0 - 4.0 * class(i) as f64 - ((i / 3) % 2) as f64)
        .collect();
    let cdr: Vec<f64> = (0..rows).map(|i| [0.0, 0.5, 1.0][class(i)]).collect();
    let immediate: Vec<f64> = (0..rows)
        .map(|i| 14.0 - 4.0 * class(i) as f64 + (i % 4) as f64)
        .collect();
    let delayed: Vec<f64> = (0..rows)
        .map(|i| 12.0 - 5.0 * class(i) as f64 + ((i / 3) % 3) as f64)
        .collect();
    let axt: Vec<f64> = (0..rows)
        .map(|i| 1.0 + 0.5 * class(i) as f64 + 0.01 * i as f64)
        .collect();
    let gender: Vec<i64> = (0..rows).map(|i| 1 + (i % 2) as i64).collect();
    let current: Vec<i64> = (0..rows).map(|i| class(i) as i64 + 1).collect();

    DataFrame::new(vec![
        Column::new("DXNORM".into(), flag(0)),
        Column::new("DXMCI".into(), flag(1)),
        Column::new("DXAD".into(), flag(2)),
        Column::new("Examyear".into(), exam_year.clone()),
        Column::new("PTDOBYear".into(), birth_year),
        Column::new("APTyear".into(), exam_year),
        Column::new("DXCURREN".into(), current),
        Column::new("MMSCORE".into(), mmse),
        Column::new("CDGLOBAL".into(), cdr),
        Column::new("LIMMTOTAL".into(), immediate),
        Column::new("LDELTOTAL".into(), delayed),
        Column::new("AXT117".into(), axt),
        Column::new("PTGENDER".into(), gender),
    ])
    .unwrap()
}

/// The synthetic cohort with one extra row that has no indicator set
pub fn create_aibl_dataframe_with_undiagnosed() -> DataFrame {
    let df = create_aibl_dataframe();
    let extra = df! {
        "DXNORM" => [0i32],
        "DXMCI" => [0i32],
        "DXAD" => [0i32],
        "Examyear" => [2008i64],
        "PTDOBYear" => [1940i64],
        "APTyear" => [2008i64],
        "DXCURREN" => [0i64],
        "MMSCORE" => [27.0f64],
        "CDGLOBAL" => [0.0f64],
        "LIMMTOTAL" => [12.0f64],
        "LDELTOTAL" => [10.0f64],
        "AXT117" => [1.2f64],
        "PTGENDER" => [1i64],
    }
    .unwrap();
    df.vstack(&extra).unwrap()
}

/// Replace one cell of a float column with null
pub fn with_missing(df: &DataFrame, column: &str, row: usize) -> DataFrame {
    let values: Vec<Option<f64>> = df
        .column(column)
        .unwrap()
        .f64()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, v)| if i == row { None } else { v })
        .collect();
    let mut out = df.clone();
    out.with_column(Column::new(column.into(), values)).unwrap();
    out
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("AIBL.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("AIBL.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}

/// Exact median of a slice without NaNs
pub fn exact_median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
