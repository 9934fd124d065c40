use crate::data::{Category, ScoreOrder, ScoreSet};
use crate::enrichment::utils::RankedUniverse;
use crate::enrichment::EnrichmentStatistic;
use crate::error::{EnrichmentError, Result};
use crate::testing::inference::nonparametric::{normal_p_value, rank_sum_z_score};
use crate::testing::utils::average_ranks;
use crate::testing::Alternative;

/// Wilcoxon rank-sum z-score of the category members.
///
/// Ranks are ascending in value with ties averaged, so positive scores mean the
/// category sits at the top of the ranking.
#[derive(Debug, Clone)]
pub struct RankSum {
    universe: RankedUniverse,
    /// ascending rank of the item at each (decreasing value) position
    ranks: Vec<f64>,
}

impl RankSum {
    pub fn new(scores: &ScoreSet) -> Result<Self> {
        if let Some(score) = scores.first_non_finite() {
            return Err(EnrichmentError::NonFinite(score.identifier().name().to_string()));
        }
        let ranked = scores.clone().sorted_by(ScoreOrder::ByValue);
        let ranks = average_ranks(&ranked.values());
        Ok(RankSum {
            universe: RankedUniverse::new(ranked.identifiers()),
            ranks,
        })
    }
}

impl EnrichmentStatistic for RankSum {
    fn name(&self) -> &'static str {
        "rank-sum"
    }

    fn preferred_order(&self) -> ScoreOrder {
        ScoreOrder::ByValue
    }

    fn row_wise_p_value_is_direct(&self) -> bool {
        true
    }

    fn universe_size(&self) -> usize {
        self.universe.len()
    }

    fn member_positions(&self, category: &Category) -> Vec<usize> {
        self.universe.member_positions(category)
    }

    fn compute_score_from_positions(&self, positions: &[usize]) -> f64 {
        let rank_sum: f64 = positions.iter().map(|&p| self.ranks[p]).sum();
        rank_sum_z_score(rank_sum, positions.len(), self.universe.len())
    }

    fn direct_p_value(&self, score: f64, hits: usize) -> Option<f64> {
        if hits == 0 || hits >= self.universe.len() {
            return Some(1.0);
        }
        let alternative = if score >= 0.0 {
            Alternative::Greater
        } else {
            Alternative::Less
        };
        Some(normal_p_value(score, alternative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Identifier, Score};
    use approx::assert_relative_eq;

    fn scores() -> ScoreSet {
        ScoreSet::new(
            (0..10)
                .map(|i| Score::new(Identifier::intern(&format!("rk-{i}")), i as f64))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_top_category_is_positive() {
        let stat = RankSum::new(&scores()).unwrap();
        let cat = Category::new("top", ["rk-9", "rk-8", "rk-7"].map(Identifier::intern));
        let z = stat.compute_score(&cat);
        // ranks 10, 9, 8: W = 27, mean = 16.5, var = 19.25
        assert_relative_eq!(z, 10.5 / 19.25_f64.sqrt(), epsilon = 1e-12);
        let p = stat.direct_p_value(z, 3).unwrap();
        assert!(p < 0.05);
    }

    #[test]
    fn test_bottom_category_is_negative() {
        let stat = RankSum::new(&scores()).unwrap();
        let cat = Category::new("bottom", ["rk-0", "rk-1", "rk-2"].map(Identifier::intern));
        let z = stat.compute_score(&cat);
        assert!(z < 0.0);
        assert!(stat.direct_p_value(z, 3).unwrap() < 0.05);
    }

    #[test]
    fn test_ties_share_ranks() {
        let set = ScoreSet::new(vec![
            Score::new(Identifier::intern("rk-t1"), 1.0),
            Score::new(Identifier::intern("rk-t2"), 1.0),
            Score::new(Identifier::intern("rk-t3"), 0.0),
            Score::new(Identifier::intern("rk-t4"), 2.0),
        ])
        .unwrap();
        let stat = RankSum::new(&set).unwrap();
        let a = stat.compute_score(&Category::new("a", [Identifier::intern("rk-t1")]));
        let b = stat.compute_score(&Category::new("b", [Identifier::intern("rk-t2")]));
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }
}
