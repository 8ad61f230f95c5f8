//! Label encoding to a dense `0..k` range

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::scope::Train;

/// Sorted-value label encoder (unfitted)
pub struct LabelEncoder;

/// Mapping learned from training labels; class `i` is `classes[i]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittedLabelEncoder {
    pub classes: Vec<i64>,
}

impl LabelEncoder {
    /// Collect the distinct training labels in ascending order
    pub fn fit(labels: &Train<Vec<i64>>) -> FittedLabelEncoder {
        let classes: BTreeSet<i64> = labels.iter().copied().collect();
        FittedLabelEncoder {
            classes: classes.into_iter().collect(),
        }
    }
}

impl FittedLabelEncoder {
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Encoded index of one label
    pub fn encode(&self, label: i64) -> PipelineResult<usize> {
        self.classes
            .binary_search(&label)
            .map_err(|_| PipelineError::UnseenLabel {
                label,
                known: self.classes.clone(),
            })
    }

    /// Encode every label, failing on the first unseen one
    pub fn transform(&self, labels: &[i64]) -> PipelineResult<Vec<usize>> {
        labels.iter().map(|&l| self.encode(l)).collect()
    }

    /// Map encoded indices back to the original labels
    pub fn inverse_transform(&self, encoded: &[usize]) -> PipelineResult<Vec<i64>> {
        encoded
            .iter()
            .map(|&i| {
                self.classes
                    .get(i)
                    .copied()
                    .ok_or(PipelineError::UnknownClassIndex {
                        index: i,
                        n_classes: self.classes.len(),
                    })
            })
            .collect()
    }
}
