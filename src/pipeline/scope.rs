//! Fit-scope markers
//!
//! Transformers are fit from a [`Train`] value and applied to anything.
//! Only the splitter and the fold generator construct `Train` and
//! [`Holdout`], so holdout rows can never reach a `fit` call:
//!
//! ```compile_fail
//! use dxclass::pipeline::{train_test_split, FeatureFrame, SplitOptions, StandardScaler};
//!
//! fn leak(frame: &FeatureFrame, labels: &[i64]) {
//!     let split = train_test_split(labels, &SplitOptions::default()).unwrap();
//!     let (_train, test) = split.partition(frame, labels);
//!     // Holdout data cannot be fit on.
//!     let _ = StandardScaler::fit(&test.map(|d| d.features));
//! }
//! ```
//!
//! Nor can holdout rows be rewrapped as training data from outside the crate:
//!
//! ```compile_fail
//! use dxclass::pipeline::{ModelData, StandardScaler};
//!
//! fn rewrap(data: &ModelData) {
//!     let rewrapped = data.train.by_ref().map(|_| data.test.features.clone());
//!     let _ = StandardScaler::fit(&rewrapped);
//! }
//! ```

use std::ops::Deref;

/// Data that transformers and estimators may learn from
#[derive(Debug, Clone)]
pub struct Train<T>(T);

/// Data that may only be transformed and scored
#[derive(Debug, Clone)]
pub struct Holdout<T>(T);

impl<T> Train<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self(inner)
    }

    /// Derive another training-scope value from this one
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Train<U> {
        Train(f(self.0))
    }

    pub(crate) fn by_ref(&self) -> Train<&T> {
        Train(&self.0)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Holdout<T> {
    pub(crate) fn new(inner: T) -> Self {
        Self(inner)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Holdout<U> {
        Holdout(f(self.0))
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Train<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> Deref for Holdout<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}
