//! Diagnostic label derivation
//!
//! Collapses the three diagnosis indicator columns (`DXNORM`, `DXMCI`,
//! `DXAD`) into a single integer `DXTYPE` column. The indicators are checked
//! in a fixed priority order and the first one set to 1 decides the class;
//! rows with no indicator set get the sentinel -1.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::PipelineResult;
use super::loader::require_columns;

/// Name of the derived label column
pub const LABEL_COLUMN: &str = "DXTYPE";

/// Code stored for rows with no diagnosis indicator set
pub const UNDIAGNOSED: i32 = -1;

/// The three indicator columns, in the order they are consumed
pub const INDICATOR_COLUMNS: [&str; 3] = ["DXNORM", "DXMCI", "DXAD"];

/// Tolerance for treating a float indicator as exactly 1
const TOLERANCE: f64 = 1e-9;

/// Diagnostic category encoded by `DXTYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Diagnosis {
    Normal,
    Mci,
    Alzheimers,
}

impl Diagnosis {
    /// Integer code written to the label column
    pub fn code(self) -> i32 {
        match self {
            Diagnosis::Normal => 0,
            Diagnosis::Mci => 1,
            Diagnosis::Alzheimers => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Diagnosis::Normal),
            1 => Some(Diagnosis::Mci),
            2 => Some(Diagnosis::Alzheimers),
            _ => None,
        }
    }

    /// Short display name used in reports
    pub fn display_name(self) -> &'static str {
        match self {
            Diagnosis::Normal => "Normal",
            Diagnosis::Mci => "MCI",
            Diagnosis::Alzheimers => "AD",
        }
    }
}

/// Ordered (indicator, result) rules; first match wins, no match is undiagnosed.
///
/// Normal outranks MCI outranks AD, so a row with several flags set is
/// silently resolved towards Normal. Those rows are counted separately.
const DIAGNOSIS_RULES: [(usize, Diagnosis); 3] = [
    (0, Diagnosis::Normal),
    (1, Diagnosis::Mci),
    (2, Diagnosis::Alzheimers),
];

fn is_set(flag: Option<f64>) -> bool {
    flag.is_some_and(|v| (v - 1.0).abs() < TOLERANCE)
}

/// Apply the priority rules to one row of indicator values
pub fn classify(flags: [Option<f64>; 3]) -> Option<Diagnosis> {
    DIAGNOSIS_RULES
        .iter()
        .find(|(idx, _)| is_set(flags[*idx]))
        .map(|(_, diagnosis)| *diagnosis)
}

/// `DXTYPE` code for one row, including the sentinel
pub fn diagnosis_code(flags: [Option<f64>; 3]) -> i32 {
    classify(flags).map_or(UNDIAGNOSED, Diagnosis::code)
}

/// Data-quality counts gathered while deriving labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelQuality {
    /// Rows per derived class: Normal, MCI, AD
    pub class_counts: [usize; 3],
    /// Rows with no indicator set (label -1)
    pub undiagnosed: usize,
    /// Rows with more than one indicator set (resolved by priority)
    pub multi_flag: usize,
}

impl LabelQuality {
    pub fn total(&self) -> usize {
        self.class_counts.iter().sum::<usize>() + self.undiagnosed
    }

    /// Whether any anomaly needs surfacing
    pub fn has_anomalies(&self) -> bool {
        self.undiagnosed > 0 || self.multi_flag > 0
    }
}

/// Derive the `DXTYPE` column and drop the indicator columns.
///
/// Fails with a missing-column error if any indicator is absent.
pub fn derive_labels(df: &DataFrame) -> PipelineResult<(DataFrame, LabelQuality)> {
    require_columns(df, &INDICATOR_COLUMNS)?;

    let casts = INDICATOR_COLUMNS
        .iter()
        .map(|name| df.column(name)?.cast(&DataType::Float64))
        .collect::<PolarsResult<Vec<Column>>>()?;
    let norm = casts[0].f64()?;
    let mci = casts[1].f64()?;
    let ad = casts[2].f64()?;

    let mut quality = LabelQuality::default();
    let mut codes: Vec<i32> = Vec::with_capacity(df.height());

    for ((n, m), a) in norm.iter().zip(mci.iter()).zip(ad.iter()) {
        let flags = [n, m, a];
        if flags.iter().filter(|f| is_set(**f)).count() > 1 {
            quality.multi_flag += 1;
        }
        let code = diagnosis_code(flags);
        match Diagnosis::from_code(code as i64) {
            Some(d) => quality.class_counts[d.code() as usize] += 1,
            None => quality.undiagnosed += 1,
        }
        codes.push(code);
    }

    if quality.undiagnosed > 0 {
        log::warn!(
            "{} row(s) have no diagnosis indicator set; labelled {}",
            quality.undiagnosed,
            UNDIAGNOSED
        );
    }
    if quality.multi_flag > 0 {
        log::warn!(
            "{} row(s) have more than one diagnosis indicator set; resolved as Normal > MCI > AD",
            quality.multi_flag
        );
    }

    let mut out = df.drop_many(INDICATOR_COLUMNS);
    out.with_column(Column::new(LABEL_COLUMN.into(), codes))?;

    Ok((out, quality))
}

/// Keep only rows whose label is a real diagnosis
pub fn drop_undiagnosed(df: &DataFrame) -> PipelineResult<DataFrame> {
    let labels = df.column(LABEL_COLUMN)?.cast(&DataType::Int32)?;
    let mask = labels.i32()?.not_equal(UNDIAGNOSED);
    Ok(df.filter(&mask)?)
}
