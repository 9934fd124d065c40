use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::enrichment::{CategoryTest, EnrichmentStatistic};
use crate::error::{EnrichmentError, Result};
use crate::testing::permutation::{at_least_as_extreme, empirical_p_value};
use crate::testing::utils::linear_merge;

/// Permutes identifier labels of the ranking.
///
/// Under a random labeling a category with `k` members occupies a uniformly
/// random `k`-subset of positions, so each iteration only draws a random prefix
/// as long as the largest category. Categories are visited by ascending hit
/// count: the part of the prefix that becomes visible for the next category is
/// sorted on its own and linearly merged with the already sorted part, instead
/// of re-sorting the whole prefix for every category.
#[derive(Debug, Clone, Copy)]
pub struct RowPermutation {
    permutations: usize,
    seed: u64,
}

impl RowPermutation {
    pub fn new(permutations: usize, seed: u64) -> Self {
        RowPermutation { permutations, seed }
    }

    /// Writes empirical p-values into `tests[..].result.raw_pvalue`.
    pub fn run(&self, statistic: &dyn EnrichmentStatistic, tests: &mut [CategoryTest]) -> Result<()> {
        if tests.is_empty() {
            return Ok(());
        }
        if !statistic.supports_index_based_computation() {
            return Err(EnrichmentError::Config(format!(
                "statistic '{}' cannot be recomputed from positions",
                statistic.name()
            )));
        }
        if self.permutations == 0 {
            warn!("zero permutations requested, reporting p-value 1 for {} categories", tests.len());
            for test in tests.iter_mut() {
                test.result.raw_pvalue = 1.0;
            }
            return Ok(());
        }

        let counts = self.count_extreme(statistic, tests);
        for (test, count) in tests.iter_mut().zip(counts) {
            test.result.raw_pvalue = empirical_p_value(count, self.permutations);
        }
        Ok(())
    }

    fn count_extreme(&self, statistic: &dyn EnrichmentStatistic, tests: &[CategoryTest]) -> Vec<usize> {
        let n = statistic.universe_size();
        let mut order: Vec<usize> = (0..tests.len()).collect();
        order.sort_by_key(|&t| tests[t].hits());
        let max_hits = order.last().map(|&t| tests[t].hits()).unwrap_or(0).min(n);

        debug!(
            "row permutation of {} categories, {} permutations, prefix {max_hits} of {n}",
            tests.len(),
            self.permutations
        );

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut positions: Vec<usize> = (0..n).collect();
        let mut sorted: Vec<usize> = Vec::with_capacity(max_hits);
        let mut merged: Vec<usize> = Vec::with_capacity(max_hits);
        let mut chunk: Vec<usize> = Vec::with_capacity(max_hits);
        let mut counts = vec![0usize; tests.len()];

        for _ in 0..self.permutations {
            // partial Fisher-Yates: positions[..max_hits] is a uniform random draw
            for i in 0..max_hits {
                let j = rng.gen_range(i..n);
                positions.swap(i, j);
            }

            sorted.clear();
            for &t in &order {
                let k = tests[t].hits();
                if k > sorted.len() {
                    chunk.clear();
                    chunk.extend_from_slice(&positions[sorted.len()..k]);
                    chunk.sort_unstable();
                    linear_merge(&sorted, &chunk, &mut merged);
                    std::mem::swap(&mut sorted, &mut merged);
                }

                let permuted = statistic.compute_score_from_positions(&sorted);
                let observed = &tests[t].result;
                if at_least_as_extreme(permuted, observed.score, observed.enriched) {
                    counts[t] += 1;
                }
            }
        }

        counts
    }
}
