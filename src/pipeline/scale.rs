//! Standardisation to zero mean and unit variance

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::features::FeatureFrame;
use super::scope::Train;

/// Variance below which a column counts as constant
const ZERO_VARIANCE: f64 = 1e-12;

/// Per-feature standard scaler (unfitted)
pub struct StandardScaler;

/// Means and standard deviations learned from training data.
///
/// A constant training column gets a scale of 1, so it is centred but not
/// divided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl StandardScaler {
    /// Population mean and standard deviation of each column
    pub fn fit(data: &Train<FeatureFrame>) -> PipelineResult<FittedScaler> {
        if data.nrows() == 0 {
            return Err(PipelineError::EmptyPartition {
                partition: "train",
                rows: 0,
                fraction: 0.0,
            });
        }

        let mut means = Vec::with_capacity(data.ncols());
        let mut scales = Vec::with_capacity(data.ncols());

        for (name, column) in data.names.iter().zip(data.values.axis_iter(Axis(1))) {
            let n = column.len() as f64;
            let mean = column.sum() / n;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            if var.is_nan() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "column '{}' still has missing values; impute before scaling",
                    name
                )));
            }
            if var < ZERO_VARIANCE {
                log::debug!("column '{}' has zero variance; leaving it unscaled", name);
                scales.push(1.0);
            } else {
                scales.push(var.sqrt());
            }
            means.push(mean);
        }

        Ok(FittedScaler {
            columns: data.names.clone(),
            means,
            scales,
        })
    }
}

impl FittedScaler {
    /// Apply `(x - mean) / scale` with the fit-time statistics
    pub fn transform(&self, frame: &FeatureFrame) -> PipelineResult<FeatureFrame> {
        if frame.names != self.columns {
            return Err(PipelineError::ShapeMismatch(format!(
                "scaler was fit on {:?}, got {:?}",
                self.columns, frame.names
            )));
        }

        let mut values: Array2<f64> = frame.values.clone();
        for ((mut column, &mean), &scale) in values
            .axis_iter_mut(Axis(1))
            .zip(self.means.iter())
            .zip(self.scales.iter())
        {
            column.mapv_inplace(|v| (v - mean) / scale);
        }

        FeatureFrame::new(self.columns.clone(), values)
    }

    /// Undo the scaling
    pub fn inverse_transform(&self, frame: &FeatureFrame) -> PipelineResult<FeatureFrame> {
        let mut values = frame.values.clone();
        for ((mut column, &mean), &scale) in values
            .axis_iter_mut(Axis(1))
            .zip(self.means.iter())
            .zip(self.scales.iter())
        {
            column.mapv_inplace(|v| v * scale + mean);
        }
        FeatureFrame::new(frame.names.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame(values: Array2<f64>) -> FeatureFrame {
        let names = (0..values.ncols()).map(|i| format!("f{i}")).collect();
        FeatureFrame::new(names, values).unwrap()
    }

    #[test]
    fn test_training_columns_become_standard() {
        let data = Train::new(frame(array![[1.0, 100.0], [2.0, 200.0], [3.0, 300.0], [4.0, 400.0]]));
        let scaler = StandardScaler::fit(&data).unwrap();
        let out = scaler.transform(&data).unwrap();

        for column in out.values.axis_iter(Axis(1)) {
            let mean = column.mean().unwrap();
            let std = column.std(0.0);
            assert!(mean.abs() < 1e-12);
            assert!((std - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_constant_column_is_centred_only() {
        let data = Train::new(frame(array![[5.0, 1.0], [5.0, 3.0]]));
        let scaler = StandardScaler::fit(&data).unwrap();
        assert_eq!(scaler.scales[0], 1.0);

        let out = scaler.transform(&frame(array![[7.0, 2.0]])).unwrap();
        assert_eq!(out.values[[0, 0]], 2.0);
        assert_eq!(out.values[[0, 1]], 0.0);
    }

    #[test]
    fn test_inverse_round_trip() {
        let data = Train::new(frame(array![[1.0, -2.0], [4.0, 0.5], [9.0, 3.0]]));
        let scaler = StandardScaler::fit(&data).unwrap();
        let back = scaler.inverse_transform(&scaler.transform(&data).unwrap()).unwrap();
        for (a, b) in back.values.iter().zip(data.values.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_column_mismatch() {
        let data = Train::new(frame(array![[1.0], [2.0]]));
        let scaler = StandardScaler::fit(&data).unwrap();
        let other = FeatureFrame::new(vec!["other".into()], array![[1.0]]).unwrap();
        assert!(scaler.transform(&other).is_err());
    }
}
