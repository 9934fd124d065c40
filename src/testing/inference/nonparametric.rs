use crate::testing::Alternative;
use statrs::distribution::{ContinuousCDF, Normal};

/// Wilcoxon rank-sum z-score of `k` members whose ranks sum to `rank_sum`
/// inside a ranking of `n` items.
///
/// Ranks are 1-based and ascending in value, so a positive z-score means the
/// members sit towards the high end of the ranking.
pub fn rank_sum_z_score(rank_sum: f64, k: usize, n: usize) -> f64 {
    if k == 0 || k >= n {
        return 0.0;
    }
    let k_f = k as f64;
    let n_f = n as f64;
    let mean = k_f * (n_f + 1.0) / 2.0;
    let var = k_f * (n_f - k_f) * (n_f + 1.0) / 12.0;
    (rank_sum - mean) / var.sqrt()
}

/// Normal-approximation p-value for a z-score.
pub fn normal_p_value(z: f64, alternative: Alternative) -> f64 {
    if z.is_nan() {
        return 1.0;
    }
    let normal = match Normal::new(0.0, 1.0) {
        Ok(normal) => normal,
        Err(_) => return 1.0,
    };
    let p = match alternative {
        Alternative::TwoSided => 2.0 * normal.sf(z.abs()),
        Alternative::Less => normal.cdf(z),
        Alternative::Greater => normal.sf(z),
    };
    p.clamp(0.0, 1.0)
}
