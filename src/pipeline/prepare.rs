//! Stage composition from the raw table to model-ready matrices
//!
//! Each function takes the previous stage's output by reference and
//! returns new values, so every stage can be run and tested on its own.

use polars::prelude::*;
use serde::Serialize;

use super::encode::{FittedLabelEncoder, LabelEncoder};
use super::error::{PipelineError, PipelineResult};
use super::features::{derive_features, extract_labels, select_features, DerivationSummary, FeatureFrame};
use super::label::{derive_labels, drop_undiagnosed, LabelQuality, LABEL_COLUMN};
use super::preprocess::{FittedPreprocessor, Preprocessor};
use super::scope::{Holdout, Train};
use super::split::{train_test_split, LabeledFrame, SplitIndices, SplitOptions};
use super::target::{map_target, TargetKind};

/// The table after label and feature derivation, sentinel rows included
pub struct DerivedTable {
    pub frame: DataFrame,
    pub quality: LabelQuality,
    pub derivation: DerivationSummary,
}

/// Label deriver then feature deriver
pub fn derive_table(raw: &DataFrame) -> PipelineResult<DerivedTable> {
    let (labelled, quality) = derive_labels(raw)?;
    let (frame, derivation) = derive_features(&labelled)?;
    log::debug!(
        "derived table: {} rows, {} columns (age derived: {})",
        frame.height(),
        frame.width(),
        derivation.age_derived
    );
    Ok(DerivedTable {
        frame,
        quality,
        derivation,
    })
}

/// Rows removed before modelling and the split that followed
#[derive(Debug, Clone, Serialize)]
pub struct SplitSummary {
    pub excluded_undiagnosed: usize,
    pub modelled_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Selected features and mapped labels, partitioned into train and test
pub struct ModelData {
    pub indices: SplitIndices,
    pub train: Train<LabeledFrame>,
    pub test: Holdout<LabeledFrame>,
    pub summary: SplitSummary,
}

/// Sentinel filter, target mapping, feature selection and split
pub fn split_model_data(
    derived: &DataFrame,
    target: TargetKind,
    features: &[String],
    options: &SplitOptions,
) -> PipelineResult<ModelData> {
    let usable = drop_undiagnosed(derived)?;
    let excluded_undiagnosed = derived.height() - usable.height();
    if excluded_undiagnosed > 0 {
        log::warn!(
            "excluding {} undiagnosed row(s) from modelling",
            excluded_undiagnosed
        );
    }

    let codes = extract_labels(&usable, LABEL_COLUMN)?;
    let labels = map_target(target, &codes)?;
    let frame = select_features(&usable, features)?;

    let indices = train_test_split(&labels, options)?;
    let (train, test) = indices.partition(&frame, &labels);
    let summary = SplitSummary {
        excluded_undiagnosed,
        modelled_rows: labels.len(),
        train_rows: indices.train.len(),
        test_rows: indices.test.len(),
    };

    Ok(ModelData {
        indices,
        train,
        test,
        summary,
    })
}

/// Transformers fit on the training split
#[derive(Debug, Clone, Serialize)]
pub struct FittedStages {
    pub preprocessor: FittedPreprocessor,
    pub encoder: FittedLabelEncoder,
}

/// Training split after preprocessing and encoding
pub struct EncodedTrain {
    pub features: Train<FeatureFrame>,
    pub labels: Vec<usize>,
}

impl FittedStages {
    /// Fit the preprocessor on training features and the encoder on training labels
    pub fn fit(train: &Train<LabeledFrame>) -> PipelineResult<Self> {
        Ok(Self {
            preprocessor: Preprocessor::fit(&train.train_features())?,
            encoder: LabelEncoder::fit(&train.train_labels()),
        })
    }

    pub fn n_classes(&self) -> usize {
        self.encoder.n_classes()
    }

    /// Preprocess and encode the training split
    pub fn encode_train(&self, train: &Train<LabeledFrame>) -> PipelineResult<EncodedTrain> {
        let features = self.preprocessor.transform(&train.features)?;
        let labels = self.encoder.transform(&train.labels)?;
        Ok(EncodedTrain {
            features: Train::new(features),
            labels,
        })
    }

    /// Preprocess and encode held-out rows with the training parameters
    pub fn encode_holdout(&self, test: &Holdout<LabeledFrame>) -> PipelineResult<(FeatureFrame, Vec<usize>)> {
        let features = self.preprocessor.transform(&test.features)?;
        let labels = self.encoder.transform(&test.labels)?;
        Ok((features, labels))
    }
}

/// Raw training features with encoded labels, the input of cross-validation
pub fn cv_inputs(
    train: &Train<LabeledFrame>,
    encoder: &FittedLabelEncoder,
) -> PipelineResult<(Train<FeatureFrame>, Vec<usize>)> {
    let labels = encoder.transform(&train.labels)?;
    if labels.len() != train.features.nrows() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} labels for {} feature rows",
            labels.len(),
            train.features.nrows()
        )));
    }
    Ok((train.train_features(), labels))
}
