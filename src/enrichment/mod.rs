//! Enrichment statistics for categories against a scored identifier list.
//!
//! ## Available Statistics
//!
//! - **ORA** ([`OverRepresentation`]): hit counts against a reference universe, hypergeometric p-values
//! - **Running sum** ([`RunningSum`]): Kolmogorov-Smirnov style walk over the ranking, no direct p-value
//! - **Weighted running sum** ([`WeightedRunningSum`]): the walk weighted by score magnitude
//! - **Rank sum** ([`RankSum`]): Wilcoxon z-score with a normal-approximation p-value
//!
//! Every statistic works on 0-based positions of category members inside its
//! own ranking of the universe. That representation is what the permutation
//! framework shuffles.

use serde::Serialize;

use crate::data::{Category, ScoreOrder, ScoreSet};
use crate::error::{EnrichmentError, Result};
use crate::testing::correction::PValued;

mod ora;
mod rank_sum;
mod running_sum;
pub(crate) mod utils;

pub use ora::{OraTail, OverRepresentation};
pub use rank_sum::RankSum;
pub use running_sum::{RunningSum, WeightedRunningSum, running_sum, weighted_running_sum};

/// A statistic bound to the scores of one job.
pub trait EnrichmentStatistic: Send + Sync {
    fn name(&self) -> &'static str;

    /// Order the statistic ranks its scores in.
    fn preferred_order(&self) -> ScoreOrder;

    /// Whether [`direct_p_value`](Self::direct_p_value) yields an analytic p-value.
    fn row_wise_p_value_is_direct(&self) -> bool;

    /// Whether the score can be recomputed from member positions alone.
    fn supports_index_based_computation(&self) -> bool {
        true
    }

    /// Whether the exact/approximate running-sum engine describes the null.
    fn has_combinatorial_null(&self) -> bool {
        false
    }

    fn universe_size(&self) -> usize;

    /// Ascending positions of the category members inside the ranking.
    fn member_positions(&self, category: &Category) -> Vec<usize>;

    /// A category is usable when it has members in the universe and does not
    /// cover all of it.
    fn can_use_category(&self, category: &Category) -> bool {
        let hits = self.member_positions(category).len();
        hits > 0 && hits < self.universe_size()
    }

    fn compute_score_from_positions(&self, positions: &[usize]) -> f64;

    fn compute_score(&self, category: &Category) -> f64 {
        self.compute_score_from_positions(&self.member_positions(category))
    }

    /// Score expected under the null for a category with `hits` members.
    fn expected_score(&self, _hits: usize) -> f64 {
        0.0
    }

    fn direct_p_value(&self, _score: f64, _hits: usize) -> Option<f64> {
        None
    }
}

/// Selects which statistic a job computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatisticKind {
    OverRepresentation,
    #[default]
    RunningSum,
    WeightedRunningSum,
    RankSum,
}

impl StatisticKind {
    pub fn needs_reference(&self) -> bool {
        matches!(self, StatisticKind::OverRepresentation)
    }

    /// Binds the statistic to a job's scores.
    ///
    /// Over-representation treats `scores` as the test set and needs the
    /// reference universe.
    pub fn build(
        &self,
        scores: &ScoreSet,
        reference: Option<&ScoreSet>,
        ora_tail: OraTail,
    ) -> Result<Box<dyn EnrichmentStatistic>> {
        Ok(match self {
            StatisticKind::OverRepresentation => {
                let reference = reference.ok_or_else(|| {
                    EnrichmentError::Config(
                        "over-representation analysis requires a reference set".into(),
                    )
                })?;
                Box::new(OverRepresentation::new(reference, scores, ora_tail)?)
            }
            StatisticKind::RunningSum => Box::new(RunningSum::new(scores)?),
            StatisticKind::WeightedRunningSum => Box::new(WeightedRunningSum::new(scores)?),
            StatisticKind::RankSum => Box::new(RankSum::new(scores)?),
        })
    }
}

/// Outcome for one category of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub name: String,
    pub reference: String,
    pub hits: usize,
    pub score: f64,
    pub expected_score: f64,
    pub raw_pvalue: f64,
    pub corrected_pvalue: f64,
    pub enriched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_score: Option<f64>,
}

impl EnrichmentResult {
    /// P-values start at 1 and are filled in by the significance stage.
    pub fn new(category: &Category, hits: usize, score: f64, expected_score: f64) -> Self {
        EnrichmentResult {
            name: category.name().to_string(),
            reference: category.reference().unwrap_or_default().to_string(),
            hits,
            score,
            expected_score,
            raw_pvalue: 1.0,
            corrected_pvalue: 1.0,
            enriched: score > expected_score,
            normalized_score: None,
        }
    }
}

impl PValued for EnrichmentResult {
    fn p_value(&self) -> f64 {
        self.raw_pvalue
    }

    fn set_adjusted_p_value(&mut self, adjusted: f64) {
        self.corrected_pvalue = adjusted;
    }
}

/// A category that passed filtering, with its positions kept for permutation.
#[derive(Debug, Clone)]
pub struct CategoryTest {
    /// Index of the category in the slice it was evaluated from.
    pub category: usize,
    pub positions: Vec<usize>,
    pub result: EnrichmentResult,
}

impl CategoryTest {
    pub fn hits(&self) -> usize {
        self.positions.len()
    }
}

/// Scores every usable category whose hit count lies in `[min_size, max_size]`.
///
/// Categories without eligible members never produce a test.
pub fn evaluate_categories(
    statistic: &dyn EnrichmentStatistic,
    categories: &[Category],
    min_size: usize,
    max_size: usize,
) -> Vec<CategoryTest> {
    let mut tests = Vec::new();
    for (index, category) in categories.iter().enumerate() {
        if !statistic.can_use_category(category) {
            log::debug!("category '{}' has no usable members, skipped", category.name());
            continue;
        }
        let positions = statistic.member_positions(category);
        let hits = positions.len();
        if hits < min_size || hits > max_size {
            log::debug!(
                "category '{}' with {hits} hits outside [{min_size}, {max_size}], skipped",
                category.name()
            );
            continue;
        }
        let score = statistic.compute_score_from_positions(&positions);
        let expected = statistic.expected_score(hits);
        tests.push(CategoryTest {
            category: index,
            positions,
            result: EnrichmentResult::new(category, hits, score, expected),
        });
    }
    tests
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Identifier, Score};

    fn scores(prefix: &str, n: usize) -> ScoreSet {
        ScoreSet::new(
            (0..n)
                .map(|i| Score::new(Identifier::intern(&format!("{prefix}-{i}")), (n - i) as f64))
                .collect(),
        )
        .unwrap()
    }

    fn category(name: &str, prefix: &str, members: &[usize]) -> Category {
        Category::new(name, members.iter().map(|i| Identifier::intern(&format!("{prefix}-{i}"))))
    }

    #[test]
    fn test_size_filter_and_empty_categories() {
        let set = scores("ev", 10);
        let stat = StatisticKind::RunningSum.build(&set, None, OraTail::OneSided).unwrap();
        let categories = vec![
            category("tiny", "ev", &[0]),
            category("good", "ev", &[1, 3, 4]),
            category("absent", "other-ev", &[0, 1]),
            category("everything", "ev", &(0..10).collect::<Vec<_>>()),
        ];
        let tests = evaluate_categories(stat.as_ref(), &categories, 2, 8);
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].result.name, "good");
        assert_eq!(tests[0].category, 1);
        assert_eq!(tests[0].result.score, 15.0);
        assert!(tests[0].result.enriched);
        assert_eq!(tests[0].hits(), 3);
    }

    #[test]
    fn test_ora_needs_reference() {
        let set = scores("ev-ora", 5);
        let err = StatisticKind::OverRepresentation
            .build(&set, None, OraTail::OneSided)
            .err()
            .unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_result_accessor_keeps_raw_value() {
        let cat = category("c", "ev-acc", &[0]);
        let mut result = EnrichmentResult::new(&cat, 1, 2.0, 1.0);
        result.raw_pvalue = 0.2;
        result.set_adjusted_p_value(0.4);
        assert_eq!(result.p_value(), 0.2);
        assert_eq!(result.corrected_pvalue, 0.4);
        assert!(result.enriched);
    }

    #[test]
    fn test_capabilities() {
        let set = scores("ev-cap", 6);
        let ks = StatisticKind::RunningSum.build(&set, None, OraTail::OneSided).unwrap();
        assert!(ks.has_combinatorial_null());
        assert!(!ks.row_wise_p_value_is_direct());
        let rank = StatisticKind::RankSum.build(&set, None, OraTail::OneSided).unwrap();
        assert!(rank.row_wise_p_value_is_direct());
        assert!(rank.supports_index_based_computation());
        assert_eq!(rank.preferred_order(), ScoreOrder::ByValue);
    }
}
