//! Parametric two-group statistics used to score the rows of a data matrix.
//!
//! Everything is computed from per-group sums and sums of squares so a row can
//! be scored in a single pass over its samples.

use crate::testing::{TTestType, TestResult};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Sum, sum of squares and count of one sample group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupSums {
    pub sum: f64,
    pub sum_sq: f64,
    pub n: f64,
}

impl GroupSums {
    /// Accumulates the values of `row` at `indices`.
    pub fn accumulate(row: impl Fn(usize) -> f64, indices: &[usize]) -> Self {
        let mut sums = GroupSums::default();
        for &i in indices {
            let value = row(i);
            sums.sum += value;
            sums.sum_sq += value * value;
        }
        sums.n = indices.len() as f64;
        sums
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.n
    }

    /// Unbiased sample variance.
    pub fn variance(&self) -> f64 {
        (self.sum_sq - self.sum * self.sum / self.n) / (self.n - 1.0)
    }
}

/// Perform a t-test comparing two samples.
///
/// Returns `TestResult` with t-statistic 0 and p-value 1 when a group has fewer
/// than two observations.
pub fn t_test(x: &[f64], y: &[f64], test_type: TTestType) -> TestResult {
    let all_x: Vec<usize> = (0..x.len()).collect();
    let all_y: Vec<usize> = (0..y.len()).collect();
    let g1 = GroupSums::accumulate(|i| x[i], &all_x);
    let g2 = GroupSums::accumulate(|i| y[i], &all_y);
    t_test_from_sums(&g1, &g2, test_type)
}

/// Perform a t-test using precomputed summary statistics.
///
/// # Arguments
///
/// * `g1`, `g2` - Sums, sums of squares and counts of both groups
/// * `test_type` - Type of t-test to perform (Student's or Welch's)
pub fn t_test_from_sums(g1: &GroupSums, g2: &GroupSums, test_type: TTestType) -> TestResult {
    let Some((t_stat, df)) = t_statistic_and_df(g1, g2, test_type) else {
        return TestResult::new(0.0, 1.0);
    };
    if t_stat == 0.0 {
        return TestResult::new(0.0, 1.0).with_metadata("df", df);
    }
    TestResult::new(t_stat, t_test_p_value(t_stat, df)).with_metadata("df", df)
}

/// The t statistic alone, without a p-value. 0 when a group has fewer than
/// two observations or the means are equal.
pub fn t_statistic_from_sums(g1: &GroupSums, g2: &GroupSums, test_type: TTestType) -> f64 {
    t_statistic_and_df(g1, g2, test_type).map_or(0.0, |(t, _)| t)
}

fn t_statistic_and_df(g1: &GroupSums, g2: &GroupSums, test_type: TTestType) -> Option<(f64, f64)> {
    let (n1, n2) = (g1.n, g2.n);
    if n1 < 2.0 || n2 < 2.0 {
        return None;
    }

    let var1 = g1.variance();
    let var2 = g2.variance();
    let mean_diff = g1.mean() - g2.mean();

    let (t_stat, df) = match test_type {
        TTestType::Student => {
            let pooled_var = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / (n1 + n2 - 2.0);
            let std_err = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
            (mean_diff / std_err, n1 + n2 - 2.0)
        }
        TTestType::Welch => {
            let term1 = var1 / n1;
            let term2 = var2 / n2;
            let combined_var = term1 + term2;
            let t = mean_diff / combined_var.sqrt();

            // Welch-Satterthwaite
            let df = combined_var * combined_var
                / (term1 * term1 / (n1 - 1.0) + term2 * term2 / (n2 - 1.0));
            (t, df)
        }
    };

    if mean_diff == 0.0 {
        return Some((0.0, df));
    }
    Some((t_stat, df))
}

/// Two-sided p-value of a t statistic.
fn t_test_p_value(t_stat: f64, df: f64) -> f64 {
    if !t_stat.is_finite() {
        return if t_stat.is_infinite() { 0.0 } else { 1.0 };
    }
    if df <= 0.0 || !df.is_finite() {
        return 1.0;
    }

    let abs_t = t_stat.abs();
    // normal approximation for large degrees of freedom
    if df > 100.0 {
        return match Normal::new(0.0, 1.0) {
            Ok(normal) => (2.0 * normal.sf(abs_t)).min(1.0),
            Err(_) => 1.0,
        };
    }

    match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => (2.0 * t_dist.sf(abs_t)).min(1.0),
        Err(_) => 1.0,
    }
}

/// Signal-to-noise ratio `(mean1 - mean2) / (sd1 + sd2)` of two groups.
///
/// Standard deviations are floored at 0.2 * |mean| (and at 0.2 when the mean is
/// zero) so near-constant rows do not explode.
pub fn signal_to_noise(g1: &GroupSums, g2: &GroupSums) -> f64 {
    if g1.n < 2.0 || g2.n < 2.0 {
        return 0.0;
    }
    let floor = |sums: &GroupSums| {
        let mean = sums.mean();
        let min_sd = if mean == 0.0 { 0.2 } else { 0.2 * mean.abs() };
        sums.variance().max(0.0).sqrt().max(min_sd)
    };
    (g1.mean() - g2.mean()) / (floor(g1) + floor(g2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clearly_different_groups() {
        let result = t_test(&[1.0, 2.0, 3.0], &[7.0, 8.0, 9.0], TTestType::Student);
        // mean diff -6, pooled var 1, se = sqrt(2/3)
        assert_relative_eq!(result.statistic, -6.0 / (2.0_f64 / 3.0).sqrt(), epsilon = 1e-10);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn test_identical_groups() {
        let result = t_test(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], TTestType::Welch);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_minimal_sample_size() {
        let result = t_test(&[1.0], &[2.0, 3.0], TTestType::Student);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_welch_degrees_of_freedom() {
        let result = t_test(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0, 10.0], TTestType::Welch);
        let df = result.metadata["df"];
        assert!(df > 3.0 && df < 7.0);
        assert!(result.statistic < 0.0);
    }

    #[test]
    fn test_signal_to_noise() {
        let idx = [0, 1, 2];
        let g1 = GroupSums::accumulate(|i| [4.0, 5.0, 6.0][i], &idx);
        let g2 = GroupSums::accumulate(|i| [1.0, 2.0, 3.0][i], &idx);
        assert_relative_eq!(signal_to_noise(&g1, &g2), 3.0 / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_statistic_only_matches_full_test() {
        let idx = [0, 1, 2, 3];
        let g1 = GroupSums::accumulate(|i| [2.0, 4.0, 3.0, 5.0][i], &idx);
        let g2 = GroupSums::accumulate(|i| [1.0, 0.5, 2.0, 1.5][i], &idx);
        for test_type in [TTestType::Student, TTestType::Welch] {
            let full = t_test_from_sums(&g1, &g2, test_type);
            assert_relative_eq!(t_statistic_from_sums(&g1, &g2, test_type), full.statistic, epsilon = 1e-12);
        }
        let single = GroupSums::accumulate(|_| 1.0, &[0]);
        assert_eq!(t_statistic_from_sums(&single, &g2, TTestType::Welch), 0.0);
    }
}
