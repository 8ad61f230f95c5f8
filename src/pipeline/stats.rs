//! Exploratory statistics
//!
//! Column summaries, missing-value counts, class counts and the AD versus
//! non-AD comparison table. Missing values are omitted per statistic.

use polars::prelude::*;
use serde::Serialize;

use super::error::PipelineResult;
use super::features::AGE_COLUMN;
use super::label::{Diagnosis, LABEL_COLUMN};
use super::loader::require_columns;

/// Features compared between AD and non-AD rows, with display names
pub const COMPARED_FEATURES: [(&str, &str); 2] =
    [(AGE_COLUMN, "Age at Examination"), ("MMSCORE", "MMSE")];

/// `describe`-style summary of one numeric column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Non-null values of a numeric column as f64
fn present_values(df: &DataFrame, name: &str) -> PipelineResult<Vec<f64>> {
    let cast = df.column(name)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().flatten().filter(|v| !v.is_nan()).collect())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Linear-interpolation quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Summaries of every numeric column, in frame order
pub fn describe(df: &DataFrame) -> PipelineResult<Vec<ColumnSummary>> {
    let mut summaries = Vec::new();
    for column in df.get_columns() {
        if !column.dtype().is_primitive_numeric() {
            continue;
        }
        let name = column.name().to_string();
        let mut values = present_values(df, &name)?;
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        summaries.push(ColumnSummary {
            count: values.len(),
            mean: mean(&values),
            std: sample_variance(&values).map(f64::sqrt),
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
            name,
        });
    }
    Ok(summaries)
}

/// Null count and ratio per column, most missing first
pub fn missing_summary(df: &DataFrame) -> Vec<(String, usize, f64)> {
    let rows = df.height();
    let mut summary: Vec<(String, usize, f64)> = df
        .get_columns()
        .iter()
        .map(|c| {
            let nulls = c.null_count();
            let ratio = if rows == 0 { 0.0 } else { nulls as f64 / rows as f64 };
            (c.name().to_string(), nulls, ratio)
        })
        .collect();
    summary.sort_by(|a, b| b.1.cmp(&a.1));
    summary
}

/// Row count per label value, ascending by label
pub fn label_counts(df: &DataFrame) -> PipelineResult<Vec<(i64, usize)>> {
    require_columns(df, &[LABEL_COLUMN])?;
    let cast = df.column(LABEL_COLUMN)?.cast(&DataType::Int64)?;
    let mut counts = std::collections::BTreeMap::new();
    for label in cast.i64()?.into_iter().flatten() {
        *counts.entry(label).or_insert(0usize) += 1;
    }
    Ok(counts.into_iter().collect())
}

/// Natural log of the gamma function (Lanczos approximation, g = 7)
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let series = COEFFS[1..]
        .iter()
        .enumerate()
        .fold(COEFFS[0], |acc, (i, c)| acc + c / (x + i as f64 + 1.0));
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Continued fraction for the incomplete beta function (modified Lentz)
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;
    const EPS: f64 = 1e-15;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=300 {
        let m = m as f64;
        let m2 = 2.0 * m;
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Regularized incomplete beta function `I_x(a, b)`
fn regularized_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Two-sided p-value of Student's t statistic with `df` degrees of freedom
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    regularized_beta(df / 2.0, 0.5, df / (df + t * t))
}

/// Two-sample Student t-test assuming equal variances; returns (t, p).
///
/// `None` when either sample has fewer than two values or both are constant.
pub fn t_test_equal_var(a: &[f64], b: &[f64]) -> Option<(f64, f64)> {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (sample_variance(a)?, sample_variance(b)?);
    let df = na + nb - 2.0;
    let pooled = ((na - 1.0) * va + (nb - 1.0) * vb) / df;
    let se = (pooled * (1.0 / na + 1.0 / nb)).sqrt();
    if se == 0.0 {
        return None;
    }
    let t = (mean(a)? - mean(b)?) / se;
    Some((t, student_t_two_sided(t, df)))
}

/// Pearson correlation over pairs where both values are present
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if !a.is_nan() && !b.is_nan() => Some((*a, *b)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// One row of the AD versus non-AD comparison table
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsRow {
    pub feature: String,
    pub mean_ad: Option<f64>,
    pub mean_non_ad: Option<f64>,
    pub t_test_p_value: Option<f64>,
    pub pearson: Option<f64>,
    pub probability_ad: f64,
    pub probability_non_ad: f64,
}

fn column_options(df: &DataFrame, name: &str) -> PipelineResult<Vec<Option<f64>>> {
    let cast = df.column(name)?.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Compare the age and MMSE columns between AD and non-AD rows.
///
/// Expects the derived frame (labels and `ExamAge` present). Sentinel rows
/// belong to neither group and are excluded from the probabilities too.
pub fn statistics_table(df: &DataFrame) -> PipelineResult<Vec<StatisticsRow>> {
    let mut required = vec![LABEL_COLUMN];
    required.extend(COMPARED_FEATURES.iter().map(|(column, _)| *column));
    require_columns(df, &required)?;

    let labels: Vec<Option<i64>> = df
        .column(LABEL_COLUMN)?
        .cast(&DataType::Int64)?
        .i64()?
        .into_iter()
        .collect();
    let ad_code = i64::from(Diagnosis::Alzheimers.code());
    let is_ad = |l: &Option<i64>| *l == Some(ad_code);
    let is_non_ad = |l: &Option<i64>| {
        matches!(l, Some(code) if *code != ad_code && Diagnosis::from_code(*code).is_some())
    };

    let n_ad = labels.iter().filter(|l| is_ad(l)).count();
    let n_non_ad = labels.iter().filter(|l| is_non_ad(l)).count();
    let labelled = (n_ad + n_non_ad).max(1) as f64;

    let columns = COMPARED_FEATURES
        .iter()
        .map(|(column, _)| column_options(df, column))
        .collect::<PipelineResult<Vec<_>>>()?;
    let correlation = pearson(&columns[0], &columns[1]);

    let rows = COMPARED_FEATURES
        .iter()
        .zip(&columns)
        .map(|((_, display), values)| {
            let group = |pick: &dyn Fn(&Option<i64>) -> bool| -> Vec<f64> {
                values
                    .iter()
                    .zip(&labels)
                    .filter(|(_, l)| pick(l))
                    .filter_map(|(v, _)| *v)
                    .filter(|v| !v.is_nan())
                    .collect()
            };
            let ad = group(&is_ad);
            let non_ad = group(&is_non_ad);
            StatisticsRow {
                feature: display.to_string(),
                mean_ad: mean(&ad),
                mean_non_ad: mean(&non_ad),
                t_test_p_value: t_test_equal_var(&ad, &non_ad).map(|(_, p)| p),
                pearson: correlation,
                probability_ad: n_ad as f64 / labelled,
                probability_non_ad: n_non_ad as f64 / labelled,
            }
        })
        .collect();

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_matches_factorials() {
        assert!((ln_gamma(1.0)).abs() < 1e-12);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn test_student_t_reference_values() {
        // t = 2.0 with 10 degrees of freedom: two-sided p = 0.07338803
        assert!((student_t_two_sided(2.0, 10.0) - 0.073_388_03).abs() < 1e-6);
        assert!((student_t_two_sided(0.0, 5.0) - 1.0).abs() < 1e-12);
        // t = 1 with 1 df is the Cauchy case: p = 0.5
        assert!((student_t_two_sided(1.0, 1.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_t_test_equal_var() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [3.0, 4.0, 5.0, 6.0, 7.0];
        let (t, p) = t_test_equal_var(&a, &b).unwrap();
        assert!((t + 2.0).abs() < 1e-12);
        // 8 degrees of freedom: two-sided p = 0.08051624
        assert!((p - 0.080_516_24).abs() < 1e-6);
        assert!(t_test_equal_var(&[1.0], &b).is_none());
    }

    #[test]
    fn test_pearson_skips_missing_pairs() {
        let x = [Some(1.0), Some(2.0), None, Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        let flat = [Some(1.0), Some(1.0)];
        assert!(pearson(&flat, &[Some(1.0), Some(2.0)]).is_none());
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_statistics_table_groups() {
        let df = df! {
            "DXTYPE" => [0i32, 1, 2, 2, -1],
            "ExamAge" => [70.0f64, 72.0, 80.0, 82.0, 60.0],
            "MMSCORE" => [Some(29.0f64), Some(27.0), Some(20.0), None, Some(30.0)],
        }
        .unwrap();
        let table = statistics_table(&df).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].feature, "Age at Examination");
        assert_eq!(table[0].mean_ad, Some(81.0));
        assert_eq!(table[0].mean_non_ad, Some(71.0));
        assert_eq!(table[1].mean_ad, Some(20.0));
        assert_eq!(table[0].probability_ad, 0.5);
        assert_eq!(table[0].probability_non_ad, 0.5);
    }

    #[test]
    fn test_describe_skips_text_columns() {
        let df = df! {
            "a" => [Some(1.0f64), None, Some(3.0)],
            "b" => ["x", "y", "z"],
        }
        .unwrap();
        let summary = describe(&df).unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].mean, Some(2.0));
        assert_eq!(missing_summary(&df)[0], ("a".to_string(), 1, 1.0 / 3.0));
    }
}
