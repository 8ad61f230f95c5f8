//! Classification metrics over encoded labels
//!
//! Precision, recall and F1 follow the zero-division-is-zero convention.
//! AUC is rank based (Mann-Whitney) with average ranks for ties, and the
//! multi-class form is the macro one-vs-one average of Hand & Till.

use ndarray::Array2;
use serde::Serialize;

use super::error::{PipelineError, PipelineResult};

fn check_lengths(y_true: &[usize], y_pred: &[usize]) -> PipelineResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} true labels but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::UndefinedMetric("no samples".to_string()));
    }
    Ok(())
}

/// Fraction of exact matches
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> PipelineResult<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// `counts[true][predicted]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> PipelineResult<Self> {
        check_lengths(y_true, y_pred)?;
        let mut counts = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t >= n_classes || p >= n_classes {
                return Err(PipelineError::UnknownClassIndex {
                    index: t.max(p),
                    n_classes,
                });
            }
            counts[t][p] += 1;
        }
        Ok(Self { counts })
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 with macro and support-weighted averages
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let per_class: Vec<ClassMetrics> = (0..matrix.n_classes())
            .map(|c| {
                let tp = matrix.counts[c][c];
                let precision = ratio(tp, matrix.predicted(c));
                let recall = ratio(tp, matrix.support(c));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    precision,
                    recall,
                    f1,
                    support: matrix.support(c),
                }
            })
            .collect();

        let total = matrix.total();
        let k = per_class.len().max(1) as f64;
        let average = |weight: &dyn Fn(&ClassMetrics) -> f64, norm: f64| ClassMetrics {
            precision: per_class.iter().map(|m| m.precision * weight(m)).sum::<f64>() / norm,
            recall: per_class.iter().map(|m| m.recall * weight(m)).sum::<f64>() / norm,
            f1: per_class.iter().map(|m| m.f1 * weight(m)).sum::<f64>() / norm,
            support: total,
        };
        let macro_avg = average(&|_: &ClassMetrics| 1.0, k);
        let weighted_avg = average(&|m: &ClassMetrics| m.support as f64, total.max(1) as f64);

        let correct: usize = (0..matrix.n_classes()).map(|c| matrix.counts[c][c]).sum();
        Self {
            accuracy: ratio(correct, total),
            per_class,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn new(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> PipelineResult<Self> {
        Ok(Self::from_confusion(&ConfusionMatrix::new(y_true, y_pred, n_classes)?))
    }
}

/// Average ranks (1-based), ties sharing the mean of their positions
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Area under the ROC curve for binary ground truth.
///
/// `None` when either class is absent.
pub fn binary_auc(positive: &[bool], scores: &[f64]) -> Option<f64> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }
    let ranks = average_ranks(scores);
    let rank_sum: f64 = ranks
        .iter()
        .zip(positive)
        .filter(|(_, &p)| p)
        .map(|(r, _)| r)
        .sum();
    let u = rank_sum - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Some(u / (n_pos as f64 * n_neg as f64))
}

/// Macro one-vs-one AUC over the classes present in `y_true`.
///
/// For each unordered pair `(a, b)` the score is the mean of the AUC of
/// column `a` separating `a` from `b` and of column `b` separating `b`
/// from `a`, restricted to rows of those two classes.
pub fn roc_auc_ovo(y_true: &[usize], proba: &Array2<f64>) -> PipelineResult<f64> {
    if y_true.len() != proba.nrows() {
        return Err(PipelineError::ShapeMismatch(format!(
            "{} labels but {} probability rows",
            y_true.len(),
            proba.nrows()
        )));
    }
    let n_classes = proba.ncols();
    if let Some(&bad) = y_true.iter().find(|&&c| c >= n_classes) {
        return Err(PipelineError::UnknownClassIndex {
            index: bad,
            n_classes,
        });
    }

    let present: Vec<usize> = (0..n_classes).filter(|c| y_true.contains(c)).collect();
    if present.len() < 2 {
        return Err(PipelineError::UndefinedMetric(format!(
            "ROC AUC needs at least two classes in y_true, found {}",
            present.len()
        )));
    }

    let mut pair_scores = Vec::new();
    for (i, &a) in present.iter().enumerate() {
        for &b in &present[i + 1..] {
            let rows: Vec<usize> = (0..y_true.len())
                .filter(|&r| y_true[r] == a || y_true[r] == b)
                .collect();
            let is_a: Vec<bool> = rows.iter().map(|&r| y_true[r] == a).collect();
            let is_b: Vec<bool> = is_a.iter().map(|&x| !x).collect();
            let score_a: Vec<f64> = rows.iter().map(|&r| proba[[r, a]]).collect();
            let score_b: Vec<f64> = rows.iter().map(|&r| proba[[r, b]]).collect();

            let undefined = || PipelineError::UndefinedMetric(format!("class pair ({}, {})", a, b));
            let auc_a = binary_auc(&is_a, &score_a).ok_or_else(undefined)?;
            let auc_b = binary_auc(&is_b, &score_b).ok_or_else(undefined)?;
            pair_scores.push((auc_a + auc_b) / 2.0);
        }
    }

    Ok(pair_scores.iter().sum::<f64>() / pair_scores.len() as f64)
}

/// Headline holdout metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricSummary {
    pub accuracy: f64,
    pub precision_weighted: f64,
    pub recall_weighted: f64,
    pub f1_weighted: f64,
    /// `None` when the holdout holds a single class
    pub roc_auc_ovo: Option<f64>,
}

impl MetricSummary {
    pub fn compute(y_true: &[usize], y_pred: &[usize], proba: &Array2<f64>) -> PipelineResult<Self> {
        let report = ClassificationReport::new(y_true, y_pred, proba.ncols())?;
        let auc = match roc_auc_ovo(y_true, proba) {
            Ok(v) => Some(v),
            Err(PipelineError::UndefinedMetric(reason)) => {
                log::warn!("ROC AUC not reported: {}", reason);
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            accuracy: report.accuracy,
            precision_weighted: report.weighted_avg.precision,
            recall_weighted: report.weighted_avg.recall,
            f1_weighted: report.weighted_avg.f1,
            roc_auc_ovo: auc,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 2, 1], &[0, 1, 1, 1]).unwrap(), 0.75);
        assert!(accuracy(&[0], &[0, 1]).is_err());
    }

    #[test]
    fn test_average_ranks_with_ties() {
        assert_eq!(average_ranks(&[0.1, 0.4, 0.4, 0.2]), vec![1.0, 3.5, 3.5, 2.0]);
    }

    #[test]
    fn test_binary_auc() {
        let positive = [false, false, true, true];
        assert_eq!(binary_auc(&positive, &[0.1, 0.4, 0.35, 0.8]), Some(0.75));
        assert_eq!(binary_auc(&positive, &[0.5, 0.5, 0.5, 0.5]), Some(0.5));
        assert_eq!(binary_auc(&[true, true], &[0.1, 0.2]), None);
    }

    #[test]
    fn test_ovo_perfect_separation() {
        let y = vec![0, 1, 2, 0, 1, 2];
        let proba = array![
            [0.8, 0.1, 0.1],
            [0.1, 0.8, 0.1],
            [0.1, 0.1, 0.8],
            [0.7, 0.2, 0.1],
            [0.2, 0.7, 0.1],
            [0.1, 0.2, 0.7]
        ];
        assert!((roc_auc_ovo(&y, &proba).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ovo_binary_matches_binary_auc() {
        let y = vec![0, 0, 1, 1];
        let proba = array![[0.9, 0.1], [0.6, 0.4], [0.65, 0.35], [0.2, 0.8]];
        let positive: Vec<bool> = y.iter().map(|&c| c == 1).collect();
        let expected = binary_auc(&positive, &proba.column(1).to_vec()).unwrap();
        assert!((roc_auc_ovo(&y, &proba).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ovo_single_class_is_undefined() {
        let proba = array![[0.5, 0.5], [0.4, 0.6]];
        assert!(matches!(
            roc_auc_ovo(&[1, 1], &proba),
            Err(PipelineError::UndefinedMetric(_))
        ));
    }

    #[test]
    fn test_report_zero_division_is_zero() {
        // Class 2 is never predicted and class 1 never occurs.
        let report = ClassificationReport::new(&[0, 0, 2], &[0, 1, 0], 3).unwrap();
        assert_eq!(report.per_class[1].precision, 0.0);
        assert_eq!(report.per_class[1].recall, 0.0);
        assert_eq!(report.per_class[2].precision, 0.0);
        assert!((report.per_class[0].precision - 0.5).abs() < 1e-12);
        assert!((report.per_class[0].recall - 0.5).abs() < 1e-12);
        assert!((report.accuracy - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_average_uses_support() {
        let report = ClassificationReport::new(&[0, 0, 0, 1], &[0, 0, 0, 0], 2).unwrap();
        // Class 0: precision 0.75, recall 1; class 1: all zero.
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.precision - 0.5625).abs() < 1e-12);
        assert!((report.macro_avg.recall - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let m = ConfusionMatrix::new(&[0, 1, 1, 2], &[0, 2, 1, 2], 3).unwrap();
        assert_eq!(m.counts, vec![vec![1, 0, 0], vec![0, 1, 1], vec![0, 0, 1]]);
        assert_eq!(m.support(1), 2);
        assert_eq!(m.total(), 4);
    }
}
