//! Train/test splitting and stratified k-fold assignment
//!
//! Both are driven by a seeded `StdRng`, so the same seed always produces
//! the same partition of row indices.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};
use super::features::FeatureFrame;
use super::scope::{Holdout, Train};

/// Options for the train/test split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Fraction of rows held out for testing, in (0, 1)
    pub test_fraction: f64,
    /// Seed for the shuffling RNG
    pub seed: u64,
    /// Preserve class proportions in both partitions
    pub stratify: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            stratify: false,
        }
    }
}

/// Disjoint row indices of the two partitions, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Features with their raw (un-encoded) labels
#[derive(Debug, Clone)]
pub struct LabeledFrame {
    pub features: FeatureFrame,
    pub labels: Vec<i64>,
}

impl SplitIndices {
    /// Materialise both partitions of `frame` and `labels`
    pub fn partition(
        &self,
        frame: &FeatureFrame,
        labels: &[i64],
    ) -> (Train<LabeledFrame>, Holdout<LabeledFrame>) {
        let pick = |indices: &[usize]| LabeledFrame {
            features: frame.take_rows(indices),
            labels: indices.iter().map(|&i| labels[i]).collect(),
        };
        (Train::new(pick(&self.train)), Holdout::new(pick(&self.test)))
    }
}

impl Train<LabeledFrame> {
    pub fn train_features(&self) -> Train<FeatureFrame> {
        self.by_ref().map(|t| t.features.clone())
    }

    pub fn train_labels(&self) -> Train<Vec<i64>> {
        self.by_ref().map(|t| t.labels.clone())
    }
}

/// Split row indices `0..labels.len()` into train and test partitions.
///
/// The test partition gets `ceil(n * test_fraction)` rows. With
/// `stratify`, each class contributes to the test partition in proportion
/// to its size and every class needs at least two rows.
pub fn train_test_split(labels: &[i64], options: &SplitOptions) -> PipelineResult<SplitIndices> {
    let fraction = options.test_fraction;
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PipelineError::InvalidFraction(fraction));
    }

    let n = labels.len();
    let n_test = (n as f64 * fraction).ceil() as usize;
    if n_test == 0 {
        return Err(PipelineError::EmptyPartition {
            partition: "test",
            rows: n,
            fraction,
        });
    }
    if n_test >= n {
        return Err(PipelineError::EmptyPartition {
            partition: "train",
            rows: n,
            fraction,
        });
    }

    let mut rng = StdRng::seed_from_u64(options.seed);

    let (mut train, mut test) = if options.stratify {
        stratified_split(labels, n_test, &mut rng)?
    } else {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);
        let train = order.split_off(n_test);
        (train, order)
    };

    train.sort_unstable();
    test.sort_unstable();
    log::debug!("split {} rows into {} train / {} test", n, train.len(), test.len());

    Ok(SplitIndices { train, test })
}

fn group_by_label<L: Ord + Copy>(labels: &[L]) -> BTreeMap<L, Vec<usize>> {
    let mut groups: BTreeMap<L, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(i);
    }
    groups
}

fn stratified_split(
    labels: &[i64],
    n_test: usize,
    rng: &mut StdRng,
) -> PipelineResult<(Vec<usize>, Vec<usize>)> {
    let n = labels.len();
    let groups = group_by_label(labels);

    if let Some((&label, members)) = groups.iter().find(|(_, m)| m.len() < 2) {
        return Err(PipelineError::StratificationImpossible {
            label,
            count: members.len(),
            needed: 2,
        });
    }

    // Floor of each class's exact share, then hand out the remainder by
    // largest fractional part (larger class first on ties).
    let exact: Vec<f64> = groups
        .values()
        .map(|m| m.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut quota: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_test - quota.iter().sum::<usize>();

    let sizes: Vec<usize> = groups.values().map(|m| m.len()).collect();
    let mut order: Vec<usize> = (0..quota.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.partial_cmp(&fa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(sizes[b].cmp(&sizes[a]))
    });
    // Keep one training row per class while possible.
    for reserve in [1usize, 0] {
        while remaining > 0 {
            let mut progressed = false;
            for &c in &order {
                if remaining > 0 && quota[c] + reserve < sizes[c] {
                    quota[c] += 1;
                    remaining -= 1;
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (members, &q) in groups.values().zip(quota.iter()) {
        let mut members = members.clone();
        members.shuffle(rng);
        test.extend_from_slice(&members[..q]);
        train.extend_from_slice(&members[q..]);
    }

    Ok((train, test))
}

/// One cross-validation fold: row indices into the data being folded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffled stratified k-fold assignment over encoded labels.
///
/// Each class's rows are shuffled and dealt round-robin across the folds,
/// continuing from where the previous class stopped, so fold sizes differ
/// by at most one and class proportions are preserved.
pub fn stratified_k_fold(labels: &[usize], k: usize, seed: u64) -> PipelineResult<Vec<Fold>> {
    let n = labels.len();
    if k < 2 || k > n {
        return Err(PipelineError::InvalidFolds { folds: k, rows: n });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let groups = group_by_label(labels);

    if let Some((label, members)) = groups.iter().find(|(_, m)| m.len() < k) {
        log::warn!(
            "class {} has only {} member(s), fewer than {} folds",
            label,
            members.len(),
            k
        );
    }

    let mut fold_of = vec![0usize; n];
    let mut dealt = 0usize;
    for members in groups.values() {
        let mut members = members.clone();
        members.shuffle(&mut rng);
        for idx in members {
            fold_of[idx] = dealt % k;
            dealt += 1;
        }
    }

    let folds = (0..k)
        .map(|f| {
            let (test, train): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| fold_of[i] == f);
            Fold { train, test }
        })
        .collect();

    Ok(folds)
}
