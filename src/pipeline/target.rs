//! Target selection and mapping
//!
//! The derived `DXTYPE` codes can be modelled directly (three-class
//! diagnosis) or collapsed to AD versus everyone else.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::label::Diagnosis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Normal / MCI / AD
    #[default]
    #[value(name = "diagnosis")]
    Diagnosis,
    /// AD versus non-AD
    #[value(name = "alzheimer")]
    Alzheimer,
}

impl TargetKind {
    /// Model label for a `DXTYPE` code, `None` for the sentinel or unknown codes
    pub fn map_code(self, code: i64) -> Option<i64> {
        let diagnosis = Diagnosis::from_code(code)?;
        Some(match self {
            TargetKind::Diagnosis => i64::from(diagnosis.code()),
            TargetKind::Alzheimer => i64::from(diagnosis == Diagnosis::Alzheimers),
        })
    }

    /// All model labels this target can produce, ascending
    pub fn labels(self) -> Vec<i64> {
        match self {
            TargetKind::Diagnosis => vec![0, 1, 2],
            TargetKind::Alzheimer => vec![0, 1],
        }
    }

    /// Display name of a model label
    pub fn class_name(self, label: i64) -> String {
        match (self, label) {
            (TargetKind::Diagnosis, code) => Diagnosis::from_code(code)
                .map(|d| d.display_name().to_string())
                .unwrap_or_else(|| code.to_string()),
            (TargetKind::Alzheimer, 0) => "Non-AD".to_string(),
            (TargetKind::Alzheimer, 1) => "AD".to_string(),
            (TargetKind::Alzheimer, other) => other.to_string(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TargetKind::Diagnosis => "Normal / MCI / AD",
            TargetKind::Alzheimer => "AD vs non-AD",
        }
    }
}

/// Map every `DXTYPE` code to a model label.
///
/// Sentinel rows must be removed beforehand; any unmapped code is an error.
pub fn map_target(kind: TargetKind, codes: &[i64]) -> PipelineResult<Vec<i64>> {
    codes
        .iter()
        .map(|&code| {
            kind.map_code(code).ok_or_else(|| PipelineError::UnseenLabel {
                label: code,
                known: vec![0, 1, 2],
            })
        })
        .collect()
}
