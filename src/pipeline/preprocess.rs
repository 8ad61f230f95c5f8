//! Imputer and scaler composed into one fit/transform unit

use serde::{Deserialize, Serialize};

use super::error::PipelineResult;
use super::features::FeatureFrame;
use super::impute::{FittedImputer, MedianImputer};
use super::scale::{FittedScaler, StandardScaler};
use super::scope::Train;

/// Median imputation followed by standardisation (unfitted)
pub struct Preprocessor;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    pub imputer: FittedImputer,
    pub scaler: FittedScaler,
}

impl Preprocessor {
    /// Fit the imputer on `data`, then the scaler on the imputed training rows
    pub fn fit(data: &Train<FeatureFrame>) -> PipelineResult<FittedPreprocessor> {
        let imputer = MedianImputer::fit(data)?;
        let imputed = imputer.transform_train(data)?;
        let scaler = StandardScaler::fit(&imputed)?;
        Ok(FittedPreprocessor { imputer, scaler })
    }
}

impl FittedPreprocessor {
    pub fn transform(&self, frame: &FeatureFrame) -> PipelineResult<FeatureFrame> {
        self.scaler.transform(&self.imputer.transform(frame)?)
    }

    /// Columns that reach the estimator
    pub fn output_columns(&self) -> &[String] {
        &self.scaler.columns
    }
}
