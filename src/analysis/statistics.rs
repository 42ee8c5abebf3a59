//! Pearson correlation matrix and the two-sample Student's t-test.
//!
//! The t distribution CDF is evaluated through the regularized incomplete
//! beta function (continued fraction, modified Lentz) with a Lanczos
//! log-gamma.

use crate::analysis::aggregator::Measure;
use crate::analysis::metrics::ratio;
use crate::error::AnalysisError;
use crate::models::Dataset;
use serde::Serialize;
use std::f64::consts::PI;

/// Measures included in the correlation matrix, in display order.
pub const CORRELATION_MEASURES: [Measure; 6] = [
    Measure::SalesAmount,
    Measure::GrossMarginPct,
    Measure::CustomerCount,
    Measure::AvgBasketValue,
    Measure::InventoryTurnoverRatio,
    Measure::CustomerSatisfactionScore,
];

/// Pearson's r, clamped to [-1, 1]. `NaN` when either series is constant,
/// the lengths differ, or fewer than two points are given.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    ratio(cov, (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

/// Symmetric matrix of pairwise Pearson coefficients.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub measures: Vec<Measure>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Off-diagonal pairs with `|r| > threshold`, upper triangle, row-major.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();

        for i in 0..self.measures.len() {
            for j in (i + 1)..self.measures.len() {
                let r = self.values[i][j];
                if r.abs() > threshold {
                    pairs.push(CorrelationPair {
                        first: self.measures[i],
                        second: self.measures[j],
                        r,
                        direction: if r > 0.0 {
                            Direction::Positive
                        } else {
                            Direction::Negative
                        },
                    });
                }
            }
        }

        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Positive => write!(f, "positive"),
            Direction::Negative => write!(f, "negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub first: Measure,
    pub second: Measure,
    pub r: f64,
    pub direction: Direction,
}

/// Pairs where both values are present.
fn complete_pairs(xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
    xs.iter()
        .zip(ys)
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(x, y)| (*x, *y))
        .unzip()
}

/// Pearson coefficients over pairwise-complete rows.
pub fn correlation_matrix(dataset: &Dataset, measures: &[Measure]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = measures
        .iter()
        .map(|m| dataset.records().iter().map(|r| m.value(r)).collect())
        .collect();

    let size = measures.len();
    let mut values = vec![vec![f64::NAN; size]; size];

    for i in 0..size {
        // Constant columns keep NaN on the diagonal
        let (xs, ys) = complete_pairs(&columns[i], &columns[i]);
        let self_r = pearson(&xs, &ys);
        values[i][i] = if self_r.is_nan() { f64::NAN } else { 1.0 };

        for j in (i + 1)..size {
            let (xs, ys) = complete_pairs(&columns[i], &columns[j]);
            let r = pearson(&xs, &ys);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        measures: measures.to_vec(),
        values,
    }
}

/// Outcome of a pooled-variance two-sample t-test on `sales_amount`.
#[derive(Debug, Clone, Serialize)]
pub struct TTestResult {
    pub group_a: String,
    pub group_b: String,
    pub n_a: usize,
    pub n_b: usize,
    pub mean_a: f64,
    pub mean_b: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    pub alpha: f64,
    /// `p_value < alpha`. False when the p-value is undefined.
    pub significant: bool,
}

/// Compare `sales_amount` between two tiers selected by exact match.
/// Rows with missing sales are left out of both samples.
pub fn tier_sales_ttest(
    dataset: &Dataset,
    tier_a: &str,
    tier_b: &str,
    alpha: f64,
) -> Result<TTestResult, AnalysisError> {
    let sales = |tier: &str| -> Vec<f64> {
        dataset
            .filter_tier(tier)
            .map(|r| r.sales_amount)
            .filter(|v| !v.is_nan())
            .collect()
    };
    let sample_a = sales(tier_a);
    let sample_b = sales(tier_b);

    for (tier, sample) in [(tier_a, &sample_a), (tier_b, &sample_b)] {
        if sample.is_empty() {
            return Err(AnalysisError::EmptyGroup {
                dimension: "tier",
                value: tier.to_string(),
            });
        }
    }

    let outcome = two_sample_ttest(&sample_a, &sample_b)?;

    Ok(TTestResult {
        group_a: tier_a.to_string(),
        group_b: tier_b.to_string(),
        n_a: sample_a.len(),
        n_b: sample_b.len(),
        mean_a: outcome.mean_a,
        mean_b: outcome.mean_b,
        t_statistic: outcome.t,
        degrees_of_freedom: outcome.df,
        p_value: outcome.p,
        alpha,
        significant: outcome.p < alpha,
    })
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TTestOutcome {
    pub mean_a: f64,
    pub mean_b: f64,
    pub t: f64,
    pub df: f64,
    pub p: f64,
}

/// Student's t-test assuming equal variances.
pub(crate) fn two_sample_ttest(a: &[f64], b: &[f64]) -> Result<TTestOutcome, AnalysisError> {
    let observed = a.len() + b.len();
    if a.is_empty() || b.is_empty() || observed < 3 {
        return Err(AnalysisError::InsufficientObservations {
            test: "two-sample t-test",
            observed,
            required: 3,
        });
    }

    let (n_a, n_b) = (a.len() as f64, b.len() as f64);
    let mean_a = a.iter().sum::<f64>() / n_a;
    let mean_b = b.iter().sum::<f64>() / n_b;
    let ss_a: f64 = a.iter().map(|x| (x - mean_a).powi(2)).sum();
    let ss_b: f64 = b.iter().map(|x| (x - mean_b).powi(2)).sum();

    let df = n_a + n_b - 2.0;
    let pooled_variance = (ss_a + ss_b) / df;
    let standard_error = (pooled_variance * (1.0 / n_a + 1.0 / n_b)).sqrt();
    let t = ratio(mean_a - mean_b, standard_error);

    Ok(TTestOutcome {
        mean_a,
        mean_b,
        t,
        df,
        p: students_t_two_sided_p(t, df),
    })
}

/// `P(|T| ≥ |t|)` for Student's t with `df` degrees of freedom.
pub fn students_t_two_sided_p(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }

    regularized_incomplete_beta(df / (df + t * t), df / 2.0, 0.5)
}

/// `I_x(a, b)` for `a, b > 0`.
pub(crate) fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();

    // The continued fraction converges fastest below the mean of the distribution
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITERATIONS: usize = 300;
    const EPSILON: f64 = 3e-14;
    const TINY: f64 = 1e-300;

    let nudge = |v: f64| if v.abs() < TINY { TINY } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 / nudge(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / nudge(1.0 + aa * d);
        c = nudge(1.0 + aa / c);
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / nudge(1.0 + aa * d);
        c = nudge(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    h
}

const LANCZOS_G: f64 = 7.0;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
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

/// Natural log of the gamma function for `x > 0`.
pub(crate) fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| acc + c / (x + i as f64));

    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{record, sample_dataset};

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(close(ln_gamma(1.0), 0.0, 1e-12));
        assert!(close(ln_gamma(5.0), 24f64.ln(), 1e-10));
        assert!(close(ln_gamma(0.5), PI.sqrt().ln(), 1e-10));
        assert!(close(ln_gamma(0.25), 1.288_022_524_698_077_5, 1e-9));
    }

    #[test]
    fn test_incomplete_beta_bounds_and_symmetry() {
        assert_eq!(regularized_incomplete_beta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_incomplete_beta(1.0, 2.0, 3.0), 1.0);
        // I_x(a, b) = 1 - I_{1-x}(b, a)
        let lhs = regularized_incomplete_beta(0.3, 2.5, 4.0);
        let rhs = 1.0 - regularized_incomplete_beta(0.7, 4.0, 2.5);
        assert!(close(lhs, rhs, 1e-12));
        // I_x(1, 1) = x
        assert!(close(regularized_incomplete_beta(0.42, 1.0, 1.0), 0.42, 1e-12));
    }

    #[test]
    fn test_students_t_p_values() {
        assert!(close(students_t_two_sided_p(2.0, 10.0), 0.073_388, 1e-5));
        // df = 1 is the Cauchy distribution
        assert!(close(students_t_two_sided_p(1.0, 1.0), 0.5, 1e-10));
        assert!(close(students_t_two_sided_p(0.0, 5.0), 1.0, 1e-12));
        assert_eq!(students_t_two_sided_p(f64::INFINITY, 5.0), 0.0);
        assert!(students_t_two_sided_p(f64::NAN, 5.0).is_nan());
    }

    #[test]
    fn test_two_sample_ttest_pooled() {
        let a = [10.0, 12.0, 14.0, 16.0, 18.0];
        let b = [5.0, 7.0, 9.0, 11.0];
        let outcome = two_sample_ttest(&a, &b).unwrap();

        assert_eq!(outcome.df, 7.0);
        assert!(close(outcome.t, 3.055_050_463, 1e-8));
        assert!(close(outcome.p, 0.018_451_5, 1e-6));
    }

    #[test]
    fn test_two_sample_ttest_requires_three_observations() {
        let err = two_sample_ttest(&[1.0], &[2.0]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientObservations { observed: 2, .. }
        ));
    }

    #[test]
    fn test_zero_variance_gives_undefined_p() {
        let outcome = two_sample_ttest(&[5.0, 5.0], &[5.0, 5.0]).unwrap();
        assert!(outcome.t.is_nan());
        assert!(outcome.p.is_nan());
    }

    #[test]
    fn test_tier_ttest_on_fixture() {
        let result = tier_sales_ttest(&sample_dataset(), "Metro", "Tier_1", 0.05).unwrap();
        assert_eq!(result.n_a, 16);
        assert_eq!(result.n_b, 16);
        assert_eq!(result.degrees_of_freedom, 30.0);
        assert!((0.0..=1.0).contains(&result.p_value));
        assert_eq!(result.significant, result.p_value < 0.05);
    }

    #[test]
    fn test_tier_ttest_missing_tier_is_error() {
        let err = tier_sales_ttest(&sample_dataset(), "Metro", "Tier_9", 0.05).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::EmptyGroup {
                dimension: "tier",
                value: "Tier_9".to_string()
            }
        );
    }

    #[test]
    fn test_pearson_known_value() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]);
        assert!(close(r, 0.774_596_669, 1e-8));
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0, 1e-12));
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_correlation_matrix_properties() {
        let matrix = correlation_matrix(&sample_dataset(), &CORRELATION_MEASURES);
        let size = CORRELATION_MEASURES.len();
        assert_eq!(matrix.values.len(), size);

        for i in 0..size {
            assert_eq!(matrix.values[i][i], 1.0);
            for j in 0..size {
                let r = matrix.values[i][j];
                assert!((-1.0..=1.0).contains(&r));
                assert_eq!(r, matrix.values[j][i]);
            }
        }
    }

    #[test]
    fn test_strong_pairs_report_direction() {
        let mut records = Vec::new();
        for i in 0..6 {
            let mut r = record(&format!("S{}", i), "A", 100.0 * (i + 1) as f64, 1.0);
            r.customer_count = Some(10 * (i as u64 + 1));
            r.customer_satisfaction_score = 5.0 - i as f64 * 0.5;
            r.avg_basket_value = if i % 2 == 0 { 1.0 } else { 2.0 };
            records.push(r);
        }
        let matrix = correlation_matrix(
            &Dataset::new(records),
            &[
                Measure::SalesAmount,
                Measure::CustomerCount,
                Measure::CustomerSatisfactionScore,
            ],
        );

        let pairs = matrix.strong_pairs(0.5);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].first, Measure::SalesAmount);
        assert_eq!(pairs[0].second, Measure::CustomerCount);
        assert_eq!(pairs[0].direction, Direction::Positive);
        assert_eq!(pairs[1].second, Measure::CustomerSatisfactionScore);
        assert_eq!(pairs[1].direction, Direction::Negative);
        assert_eq!(matrix.values[1][0], pairs[0].r);
    }

    #[test]
    fn test_missing_values_are_dropped_pairwise() {
        let mut records = Vec::new();
        for i in 0..5 {
            let mut r = record(&format!("S{}", i), "A", 100.0 * (i + 1) as f64, 1.0);
            r.customer_count = Some(10 * (i as u64 + 1));
            r.customer_satisfaction_score = 5.0 - i as f64 * 0.5;
            records.push(r);
        }
        records[2].customer_count = None;
        records[4].sales_amount = f64::NAN;
        let matrix = correlation_matrix(
            &Dataset::new(records),
            &[
                Measure::SalesAmount,
                Measure::CustomerCount,
                Measure::CustomerSatisfactionScore,
            ],
        );

        assert!((matrix.values[0][1] - 1.0).abs() < 1e-9);
        assert!((matrix.values[0][2] + 1.0).abs() < 1e-9);
        assert!((matrix.values[1][2] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ttest_skips_missing_sales() {
        let mut records = Vec::new();
        for (i, (tier, sales)) in [
            ("Metro", 100.0),
            ("Metro", 110.0),
            ("Metro", f64::NAN),
            ("Tier_1", 50.0),
            ("Tier_1", 60.0),
        ]
        .into_iter()
        .enumerate()
        {
            let mut r = record(&format!("S{}", i), "A", sales, 1.0);
            r.tier = tier.to_string();
            records.push(r);
        }

        let result = tier_sales_ttest(&Dataset::new(records), "Metro", "Tier_1", 0.05).unwrap();
        assert_eq!(result.n_a, 2);
        assert_eq!(result.n_b, 2);
        assert_eq!(result.mean_a, 105.0);
        assert!(result.t_statistic.is_finite());
    }
}
