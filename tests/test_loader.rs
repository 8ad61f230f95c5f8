//! Unit tests for dataset loader

use dxclass::pipeline::{get_column_names, load_dataset_with_progress, require_columns, PipelineError};
use std::io::Write;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_load_csv_file() {
    let mut df = create_aibl_dataframe();
    let (_temp_dir, csv_path) = create_temp_csv(&mut df);

    let (loaded, rows, cols, mem_mb) = load_dataset_with_progress(&csv_path, 100).unwrap();

    assert_eq!(rows, 20, "Should have 20 data rows");
    assert_eq!(cols, 13, "Should have 13 columns");
    assert_has_columns(&loaded, &["DXNORM", "DXMCI", "DXAD", "Examyear", "PTDOBYear"]);
    assert!(mem_mb >= 0.0, "Memory estimate should be non-negative");
}

#[test]
fn test_load_parquet_file() {
    let mut df = create_aibl_dataframe();
    let (_temp_dir, parquet_path) = create_temp_parquet(&mut df);

    let (loaded, rows, cols, _mem) = load_dataset_with_progress(&parquet_path, 100).unwrap();

    assert_eq!(rows, 20);
    assert_eq!(cols, 13);
    assert!(loaded.equals(&df));
}

#[test]
fn test_csv_with_empty_cells_loads_nulls() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("AIBL.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "DXNORM,DXMCI,DXAD,MMSCORE").unwrap();
    writeln!(file, "1,0,0,29").unwrap();
    writeln!(file, "0,1,0,").unwrap();
    drop(file);

    let (df, rows, _, _) = load_dataset_with_progress(&csv_path, 100).unwrap();
    assert_eq!(rows, 2);
    assert_eq!(df.column("MMSCORE").unwrap().null_count(), 1);
}

#[test]
fn test_get_column_names_csv() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("AIBL.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "RID,DXNORM,MMSCORE").unwrap();
    writeln!(file, "1,1,29").unwrap();
    drop(file);

    let columns = get_column_names(&csv_path).unwrap();

    assert_eq!(columns, vec!["RID", "DXNORM", "MMSCORE"]);
}

#[test]
fn test_missing_file_error() {
    let result = load_dataset_with_progress(std::path::Path::new("/nonexistent/AIBL.csv"), 100);
    let err = result.err().unwrap();
    assert!(err.to_string().contains("Input file not found"));
}

#[test]
fn test_unsupported_format_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("AIBL.xlsx");
    std::fs::write(&path, "not a table").unwrap();

    let err = load_dataset_with_progress(&path, 100).err().unwrap();
    assert!(err.to_string().contains("Unsupported file format"));
}

#[test]
fn test_require_columns_names_each_missing_column() {
    let df = create_aibl_dataframe().drop("DXAD").unwrap();
    match require_columns(&df, &["DXNORM", "DXAD", "CDGLOBAL", "RCT392"]) {
        Err(PipelineError::MissingColumns { columns }) => {
            assert_eq!(columns, vec!["DXAD", "RCT392"]);
        }
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}
