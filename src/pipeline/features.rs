//! Feature derivation and selection
//!
//! Derivation adds `ExamAge` (exam year minus birth year) when both source
//! columns exist and drops the columns that must not reach the model.
//! Selection projects the working table onto a fixed ordered feature list
//! and fails fast, naming every absent column, on schema drift.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::label::INDICATOR_COLUMNS;
use super::loader::{has_column, require_columns};

/// Name of the derived age column
pub const AGE_COLUMN: &str = "ExamAge";

/// Year of examination
pub const EXAM_YEAR_COLUMN: &str = "Examyear";

/// Year of birth
pub const BIRTH_YEAR_COLUMN: &str = "PTDOBYear";

/// Non-indicator columns removed after derivation (when present)
pub const REDUNDANT_COLUMNS: [&str; 4] = ["APTyear", EXAM_YEAR_COLUMN, BIRTH_YEAR_COLUMN, "DXCURREN"];

/// Default model input: biomarkers, medical history, cognitive scores, demographics
pub const DEFAULT_FEATURES: [&str; 30] = [
    "APGEN1", "APGEN2", "CDGLOBAL", "AXT117", "BAT126", "HMT3", "HMT7", "HMT13", "HMT40",
    "HMT100", "HMT102", "RCT6", "RCT11", "RCT20", "RCT392", "MHPSYCH", "MH2NEURL", "MH4CARD",
    "MH6HEPAT", "MH8MUSCL", "MH9ENDO", "MH10GAST", "MH12RENA", "MH16SMOK", "MH17MALI",
    "MMSCORE", "LIMMTOTAL", "LDELTOTAL", "PTGENDER", AGE_COLUMN,
];

/// Default feature list as owned strings
pub fn default_features() -> Vec<String> {
    DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect()
}

/// What feature derivation did to the table
#[derive(Debug, Clone, Default, Serialize)]
pub struct DerivationSummary {
    pub age_derived: bool,
    pub dropped_columns: Vec<String>,
}

/// Add `ExamAge` if possible, then drop indicator, year and redundant columns.
///
/// Missing age sources are not an error here; a feature list that needs
/// `ExamAge` will fail at selection instead.
pub fn derive_features(df: &DataFrame) -> PipelineResult<(DataFrame, DerivationSummary)> {
    let mut summary = DerivationSummary::default();

    let mut out = if has_column(df, EXAM_YEAR_COLUMN) && has_column(df, BIRTH_YEAR_COLUMN) {
        summary.age_derived = true;
        df.clone()
            .lazy()
            .with_column(
                (col(EXAM_YEAR_COLUMN).cast(DataType::Float64)
                    - col(BIRTH_YEAR_COLUMN).cast(DataType::Float64))
                .alias(AGE_COLUMN),
            )
            .collect()?
    } else {
        log::info!(
            "'{}' or '{}' absent; skipping {} derivation",
            EXAM_YEAR_COLUMN,
            BIRTH_YEAR_COLUMN,
            AGE_COLUMN
        );
        df.clone()
    };

    let to_drop: Vec<&str> = INDICATOR_COLUMNS
        .iter()
        .chain(REDUNDANT_COLUMNS.iter())
        .copied()
        .filter(|name| has_column(&out, name))
        .collect();

    if !to_drop.is_empty() {
        out = out.drop_many(to_drop.iter().copied());
        summary.dropped_columns = to_drop.iter().map(|s| s.to_string()).collect();
    }

    Ok((out, summary))
}

/// Ordered numeric feature table handed to the transformers and estimators.
///
/// Missing entries are stored as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    pub names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureFrame {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> PipelineResult<Self> {
        if names.len() != values.ncols() {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} column names for {} columns",
                names.len(),
                values.ncols()
            )));
        }
        Ok(Self { names, values })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Rows at the given indices, in that order
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.select(ndarray::Axis(0), indices),
        }
    }

    /// Number of NaN cells per column
    pub fn missing_counts(&self) -> Vec<usize> {
        self.values
            .columns()
            .into_iter()
            .map(|c| c.iter().filter(|v| v.is_nan()).count())
            .collect()
    }
}

/// Project `df` onto `features` in order, as a float matrix.
///
/// Fails with [`PipelineError::MissingColumns`] naming every absent column and
/// with [`PipelineError::NonNumericColumn`] for string or other columns.
pub fn select_features(df: &DataFrame, features: &[String]) -> PipelineResult<FeatureFrame> {
    let required: Vec<&str> = features.iter().map(|s| s.as_str()).collect();
    require_columns(df, &required)?;

    let mut values = Array2::<f64>::from_elem((df.height(), features.len()), f64::NAN);

    for (j, name) in features.iter().enumerate() {
        let column = df.column(name)?;
        if !column.dtype().is_primitive_numeric() {
            return Err(PipelineError::NonNumericColumn {
                column: name.clone(),
                dtype: column.dtype().to_string(),
            });
        }
        let float_col = column.cast(&DataType::Float64)?;
        for (i, v) in float_col.f64()?.iter().enumerate() {
            if let Some(v) = v {
                values[[i, j]] = v;
            }
        }
    }

    FeatureFrame::new(features.to_vec(), values)
}

/// Integer labels from a column (nulls are rejected as a schema problem)
pub fn extract_labels(df: &DataFrame, column: &str) -> PipelineResult<Vec<i64>> {
    require_columns(df, &[column])?;
    let cast = df.column(column)?.cast(&DataType::Int64)?;
    let labels: Option<Vec<i64>> = cast.i64()?.iter().collect();
    labels.ok_or_else(|| {
        PipelineError::ShapeMismatch(format!("label column '{}' contains nulls", column))
    })
}
