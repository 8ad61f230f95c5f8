//! Median imputation of missing feature values
//!
//! Medians are learned once from training-scope data and reapplied
//! unchanged to any later frame. A column with no observed value in the
//! fit data has no median; it is dropped from every transformed frame and
//! reported, never filled with an arbitrary constant.

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::features::FeatureFrame;
use super::scope::Train;

/// Column-wise median imputer (unfitted)
pub struct MedianImputer;

/// Medians learned from training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedImputer {
    /// Kept columns, in input order
    pub columns: Vec<String>,
    /// Median of each kept column
    pub medians: Vec<f64>,
    /// Columns that were entirely missing at fit time
    pub dropped: Vec<String>,
}

/// Median of the non-NaN values, `None` when there are none
pub fn median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut observed: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return None;
    }
    observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = observed.len() / 2;
    Some(if observed.len() % 2 == 0 {
        (observed[mid - 1] + observed[mid]) / 2.0
    } else {
        observed[mid]
    })
}

impl MedianImputer {
    /// Learn one median per column from the training frame
    pub fn fit(data: &Train<FeatureFrame>) -> PipelineResult<FittedImputer> {
        let mut columns = Vec::new();
        let mut medians = Vec::new();
        let mut dropped = Vec::new();

        for (name, column) in data.names.iter().zip(data.values.columns()) {
            match median(column.iter().copied()) {
                Some(m) => {
                    columns.push(name.clone());
                    medians.push(m);
                }
                None => dropped.push(name.clone()),
            }
        }

        if !dropped.is_empty() {
            log::warn!(
                "dropping {} entirely missing column(s): {}",
                dropped.len(),
                dropped.join(", ")
            );
        }
        if columns.is_empty() {
            return Err(PipelineError::NoUsableFeatures);
        }

        Ok(FittedImputer {
            columns,
            medians,
            dropped,
        })
    }
}

impl FittedImputer {
    /// Impute the rows the medians were learned from, keeping their scope
    pub fn transform_train(&self, data: &Train<FeatureFrame>) -> PipelineResult<Train<FeatureFrame>> {
        Ok(Train::new(self.transform(data)?))
    }

    /// Fill NaNs with the learned medians and drop unusable columns.
    ///
    /// `frame` must carry every kept column; extra columns are ignored.
    pub fn transform(&self, frame: &FeatureFrame) -> PipelineResult<FeatureFrame> {
        let positions = self
            .columns
            .iter()
            .map(|name| {
                frame
                    .names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| PipelineError::MissingColumns {
                        columns: vec![name.clone()],
                    })
            })
            .collect::<PipelineResult<Vec<usize>>>()?;

        let mut values = frame.values.select(ndarray::Axis(1), &positions);
        for (mut column, &fill) in values.columns_mut().into_iter().zip(self.medians.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }

        FeatureFrame::new(self.columns.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn train(values: ndarray::Array2<f64>, names: &[&str]) -> Train<FeatureFrame> {
        Train::new(FeatureFrame::new(names.iter().map(|s| s.to_string()).collect(), values).unwrap())
    }

    #[test]
    fn test_median_odd_even() {
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median([f64::NAN, 5.0]), Some(5.0));
        assert_eq!(median([f64::NAN]), None);
    }

    #[test]
    fn test_fill_uses_training_median_only() {
        let data = train(array![[1.0, 10.0], [f64::NAN, 20.0], [3.0, 30.0], [7.0, f64::NAN]], &["a", "b"]);
        let imputer = MedianImputer::fit(&data).unwrap();
        assert_eq!(imputer.medians, vec![3.0, 20.0]);

        let filled = imputer.transform(&data).unwrap();
        assert_eq!(filled.values, array![[1.0, 10.0], [3.0, 20.0], [3.0, 30.0], [7.0, 20.0]]);

        let unseen = FeatureFrame::new(
            vec!["a".into(), "b".into()],
            array![[f64::NAN, f64::NAN], [100.0, -1.0]],
        )
        .unwrap();
        let filled = imputer.transform(&unseen).unwrap();
        assert_eq!(filled.values, array![[3.0, 20.0], [100.0, -1.0]]);
    }

    #[test]
    fn test_all_missing_column_is_dropped() {
        let data = train(array![[1.0, f64::NAN], [2.0, f64::NAN]], &["a", "empty"]);
        let imputer = MedianImputer::fit(&data).unwrap();
        assert_eq!(imputer.dropped, vec!["empty".to_string()]);

        let out = imputer.transform(&data).unwrap();
        assert_eq!(out.names, vec!["a".to_string()]);
        assert_eq!(out.ncols(), 1);
    }

    #[test]
    fn test_nothing_usable() {
        let data = train(array![[f64::NAN], [f64::NAN]], &["x"]);
        assert!(matches!(MedianImputer::fit(&data), Err(PipelineError::NoUsableFeatures)));
    }
}
