//! Files written by a run: the derived table, the statistics table, the
//! JSON run report and the fitted artifacts

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use polars::prelude::*;
use serde::Serialize;

use crate::models::{Classifier, ModelKind};
use crate::pipeline::{FittedStages, StatisticsRow, TargetKind};

/// On-disk format of the derived table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    #[value(name = "csv")]
    Csv,
    #[value(name = "parquet")]
    Parquet,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Parquet => "parquet",
        }
    }
}

/// `<output_dir>/<input stem>_<suffix>`
pub fn output_path(output_dir: &Path, input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    output_dir.join(format!("{}_{}", stem, suffix))
}

/// Write a frame as CSV or Parquet, chosen by the file extension
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            CsvWriter::new(&mut file)
                .finish(df)
                .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
        }
        "parquet" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
        }
        _ => anyhow::bail!(
            "Unsupported output format: {}. Supported formats: csv, parquet",
            extension
        ),
    }

    Ok(())
}

/// The statistics rows as a frame with the published column headers
pub fn statistics_frame(rows: &[StatisticsRow]) -> Result<DataFrame> {
    let feature: Vec<&str> = rows.iter().map(|r| r.feature.as_str()).collect();
    let mean_ad: Vec<Option<f64>> = rows.iter().map(|r| r.mean_ad).collect();
    let mean_non_ad: Vec<Option<f64>> = rows.iter().map(|r| r.mean_non_ad).collect();
    let p_value: Vec<Option<f64>> = rows.iter().map(|r| r.t_test_p_value).collect();
    let pearson: Vec<Option<f64>> = rows.iter().map(|r| r.pearson).collect();
    let p_ad: Vec<f64> = rows.iter().map(|r| r.probability_ad).collect();
    let p_non_ad: Vec<f64> = rows.iter().map(|r| r.probability_non_ad).collect();

    let df = df! {
        "Feature" => feature,
        "Mean Alzheimer" => mean_ad,
        "Mean Non-Alzheimer" => mean_non_ad,
        "t-test p-value" => p_value,
        "Pearson Correlation Coefficient" => pearson,
        "Probability Alzheimer" => p_ad,
        "Probability Non-Alzheimer" => p_non_ad,
    }
    .context("Failed to build statistics table")?;
    Ok(df)
}

pub fn export_statistics_csv(rows: &[StatisticsRow], path: &Path) -> Result<()> {
    let mut df = statistics_frame(rows)?;
    save_dataset(&mut df, path)
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub timestamp: String,
    pub dxclass_version: String,
    pub input_file: String,
    pub command: String,
}

impl ReportMetadata {
    pub fn new(command: &str, input: &Path) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            dxclass_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input.display().to_string(),
            command: command.to_string(),
        }
    }
}

/// JSON run report: metadata, the effective configuration and the results
#[derive(Debug, Serialize)]
pub struct RunReport<C: Serialize, R: Serialize> {
    pub metadata: ReportMetadata,
    pub config: C,
    pub results: R,
}

pub fn export_run_report<C: Serialize, R: Serialize>(
    report: &RunReport<C, R>,
    output_path: &Path,
) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write run report to {}", output_path.display()))?;

    Ok(())
}

#[derive(Serialize)]
struct ModelArtifact<'a> {
    kind: ModelKind,
    name: &'a str,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct EncoderArtifact<'a> {
    target: TargetKind,
    classes: &'a [i64],
    class_names: Vec<String>,
}

fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Persist the fitted preprocessor, label encoder and model as JSON files.
///
/// Returns the paths written, in that order.
pub fn save_artifacts(
    dir: &Path,
    stages: &FittedStages,
    target: TargetKind,
    kind: ModelKind,
    model: &dyn Classifier,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create artifacts directory {}", dir.display()))?;

    let preprocessor_path = dir.join("preprocessor.json");
    write_json(&stages.preprocessor, &preprocessor_path)?;

    let encoder_path = dir.join("label_encoder.json");
    let classes = &stages.encoder.classes;
    write_json(
        &EncoderArtifact {
            target,
            classes,
            class_names: classes.iter().map(|&c| target.class_name(c)).collect(),
        },
        &encoder_path,
    )?;

    let model_path = dir.join("model.json");
    let parameters = model
        .parameters()
        .with_context(|| format!("Failed to export {} parameters", model.name()))?;
    write_json(
        &ModelArtifact {
            kind,
            name: model.name(),
            parameters,
        },
        &model_path,
    )?;

    Ok(vec![preprocessor_path, encoder_path, model_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(feature: &str) -> StatisticsRow {
        StatisticsRow {
            feature: feature.to_string(),
            mean_ad: Some(80.0),
            mean_non_ad: Some(72.5),
            t_test_p_value: Some(0.01),
            pearson: None,
            probability_ad: 0.25,
            probability_non_ad: 0.75,
        }
    }

    #[test]
    fn test_output_path_uses_input_stem() {
        let path = output_path(Path::new("out"), Path::new("data/AIBL.csv"), "derived.csv");
        assert_eq!(path, Path::new("out").join("AIBL_derived.csv"));
    }

    #[test]
    fn test_statistics_frame_headers() {
        let df = statistics_frame(&[row("MMSE")]).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.get_column_names()[0].as_str(), "Feature");
        assert_eq!(df.column("Pearson Correlation Coefficient").unwrap().null_count(), 1);
    }

    #[test]
    fn test_unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut df = statistics_frame(&[row("MMSE")]).unwrap();
        let result = save_dataset(&mut df, &dir.path().join("stats.xlsx"));
        assert!(result.is_err());
    }

    #[test]
    fn test_statistics_csv_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("AIBL_statistics.csv");
        export_statistics_csv(&[row("Age at Examination"), row("MMSE")], &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Feature,Mean Alzheimer"));
        assert_eq!(content.lines().count(), 3);
    }
}
