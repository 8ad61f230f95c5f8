//! Error types for the analysis pipeline.
//!
//! Schema errors (missing or non-numeric columns) are fatal and name the
//! offending columns. Data-quality anomalies are not errors; they are
//! counted and logged by the stage that finds them.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more required columns are absent from the working table.
    #[error("missing required column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// A selected feature column cannot be used as a numeric model input.
    #[error("column '{column}' has non-numeric type {dtype}")]
    NonNumericColumn { column: String, dtype: String },

    /// A label was transformed that the encoder never saw during fit.
    #[error("unseen label {label}: encoder was fit on {known:?}")]
    UnseenLabel { label: i64, known: Vec<i64> },

    /// An encoded class index has no inverse mapping.
    #[error("encoded class {index} is out of range for {n_classes} classes")]
    UnknownClassIndex { index: usize, n_classes: usize },

    /// Test fraction outside the open interval (0, 1).
    #[error("test fraction must be between 0 and 1 (exclusive), got {0}")]
    InvalidFraction(f64),

    /// A split or fold would leave a partition without rows.
    #[error("{partition} partition would be empty ({rows} rows, test fraction {fraction})")]
    EmptyPartition {
        partition: &'static str,
        rows: usize,
        fraction: f64,
    },

    /// A class has too few members to be stratified.
    #[error("cannot stratify: class {label} has only {count} member(s), need at least {needed}")]
    StratificationImpossible {
        label: i64,
        count: usize,
        needed: usize,
    },

    /// Number of folds outside the supported range.
    #[error("number of folds must be at least 2 and at most {rows}, got {folds}")]
    InvalidFolds { folds: usize, rows: usize },

    /// Row or column counts disagree between two inputs.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Every column of the input was entirely missing.
    #[error("no usable feature columns remain after imputation")]
    NoUsableFeatures,

    /// A metric cannot be computed for the given labels.
    #[error("metric undefined: {0}")]
    UndefinedMetric(String),

    /// Underlying dataframe failure.
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// Convenience alias for pipeline results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
