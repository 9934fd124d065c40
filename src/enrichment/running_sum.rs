//! Kolmogorov-Smirnov style running-sum statistics.

use crate::data::{Category, ScoreOrder, ScoreSet};
use crate::enrichment::utils::RankedUniverse;
use crate::enrichment::EnrichmentStatistic;
use crate::error::{EnrichmentError, Result};

/// Signed extremum of the unweighted walk over `n` ranks with hits at the
/// ascending, distinct, 0-based ranks in `hits`.
///
/// The walk adds `n - k` at every hit and subtracts `k` at every other rank, so
/// it starts and ends at zero. Of the running maximum and minimum, the one with
/// the larger magnitude is returned; equal magnitudes resolve to the maximum.
pub fn running_sum(n: usize, hits: &[usize]) -> i64 {
    let k = hits.len();
    if k == 0 || k >= n {
        return 0;
    }
    let up = (n - k) as i64;
    let down = k as i64;

    let mut max = 0i64;
    let mut min = 0i64;
    for (m, &pos) in hits.iter().enumerate() {
        let misses = (pos - m) as i64;
        let m = m as i64;
        // lowest point is just before a hit, highest just after
        min = min.min(m * up - misses * down);
        max = max.max((m + 1) * up - misses * down);
    }

    if max >= -min { max } else { min }
}

/// Weighted counterpart of [`running_sum`].
///
/// A hit at rank `r` adds `weights[r] / Σ weights[hits]`, every other rank
/// subtracts `1 / (n - k)`. Falls back to unit weights when all hit weights
/// are zero.
pub fn weighted_running_sum(weights: &[f64], hits: &[usize]) -> f64 {
    let n = weights.len();
    let k = hits.len();
    if k == 0 || k >= n {
        return 0.0;
    }

    let total: f64 = hits.iter().map(|&h| weights[h]).sum();
    let weight_of = |pos: usize| {
        if total > 0.0 {
            weights[pos] / total
        } else {
            1.0 / k as f64
        }
    };
    let miss_step = 1.0 / (n - k) as f64;

    let mut max = 0.0f64;
    let mut min = 0.0f64;
    let mut cumulative = 0.0;
    for (m, &pos) in hits.iter().enumerate() {
        let misses = (pos - m) as f64;
        min = min.min(cumulative - misses * miss_step);
        cumulative += weight_of(pos);
        max = max.max(cumulative - misses * miss_step);
    }

    if max >= -min { max } else { min }
}

fn ranked_universe(scores: &ScoreSet) -> Result<(RankedUniverse, Vec<f64>)> {
    if let Some(score) = scores.first_non_finite() {
        return Err(EnrichmentError::NonFinite(score.identifier().name().to_string()));
    }
    let ranked = scores.clone().sorted_by(ScoreOrder::ByValue);
    Ok((RankedUniverse::new(ranked.identifiers()), ranked.values()))
}

/// Unweighted running-sum statistic over a score ranking.
#[derive(Debug, Clone)]
pub struct RunningSum {
    universe: RankedUniverse,
}

impl RunningSum {
    pub fn new(scores: &ScoreSet) -> Result<Self> {
        let (universe, _) = ranked_universe(scores)?;
        Ok(RunningSum { universe })
    }
}

impl EnrichmentStatistic for RunningSum {
    fn name(&self) -> &'static str {
        "running-sum"
    }

    fn preferred_order(&self) -> ScoreOrder {
        ScoreOrder::ByValue
    }

    fn row_wise_p_value_is_direct(&self) -> bool {
        false
    }

    fn has_combinatorial_null(&self) -> bool {
        true
    }

    fn universe_size(&self) -> usize {
        self.universe.len()
    }

    fn member_positions(&self, category: &Category) -> Vec<usize> {
        self.universe.member_positions(category)
    }

    fn compute_score_from_positions(&self, positions: &[usize]) -> f64 {
        running_sum(self.universe.len(), positions) as f64
    }
}

/// Running-sum statistic weighted by the magnitude of each score.
#[derive(Debug, Clone)]
pub struct WeightedRunningSum {
    universe: RankedUniverse,
    weights: Vec<f64>,
}

impl WeightedRunningSum {
    pub fn new(scores: &ScoreSet) -> Result<Self> {
        let (universe, values) = ranked_universe(scores)?;
        let weights = values.into_iter().map(f64::abs).collect();
        Ok(WeightedRunningSum { universe, weights })
    }
}

impl EnrichmentStatistic for WeightedRunningSum {
    fn name(&self) -> &'static str {
        "weighted-running-sum"
    }

    fn preferred_order(&self) -> ScoreOrder {
        ScoreOrder::ByValue
    }

    fn row_wise_p_value_is_direct(&self) -> bool {
        false
    }

    fn universe_size(&self) -> usize {
        self.universe.len()
    }

    fn member_positions(&self, category: &Category) -> Vec<usize> {
        self.universe.member_positions(category)
    }

    fn compute_score_from_positions(&self, positions: &[usize]) -> f64 {
        weighted_running_sum(&self.weights, positions)
    }
}
