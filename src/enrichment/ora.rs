//! Over-representation analysis of a test set against a reference universe.

use log::warn;

use crate::data::{Category, ScoreOrder, ScoreSet};
use crate::enrichment::utils::RankedUniverse;
use crate::enrichment::EnrichmentStatistic;
use crate::error::{EnrichmentError, Result};
use crate::testing::inference::discrete::hypergeometric_test;
use crate::testing::Alternative;

/// Which tail the over-representation p-value uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OraTail {
    /// Upper tail when observed exceeds expected, lower tail otherwise.
    #[default]
    OneSided,
    /// Fisher's exact two-sided test.
    TwoSided,
}

/// Counts category members inside the test set.
///
/// The universe is the reference set with test-set members moved to the front,
/// so a category's hit count is the number of its positions below the test-set
/// size. That keeps the statistic index based and therefore permutable.
#[derive(Debug, Clone)]
pub struct OverRepresentation {
    universe: RankedUniverse,
    test_size: usize,
    tail: OraTail,
}

impl OverRepresentation {
    pub fn new(reference: &ScoreSet, test_set: &ScoreSet, tail: OraTail) -> Result<Self> {
        if reference.is_empty() {
            return Err(EnrichmentError::Numeric("reference set is empty".into()));
        }
        let mut reference = reference.clone();
        reference.sort_by(ScoreOrder::ByIdentifier);

        let (mut inside, mut outside) = (Vec::new(), Vec::new());
        for score in reference.iter() {
            if test_set.contains(score.identifier()) {
                inside.push(score.identifier());
            } else {
                outside.push(score.identifier());
            }
        }

        let missing = test_set.len() - inside.len();
        if missing > 0 {
            warn!("{missing} test set identifiers are not part of the reference set and are ignored");
        }

        let test_size = inside.len();
        inside.extend(outside);
        Ok(OverRepresentation {
            universe: RankedUniverse::new(inside),
            test_size,
            tail,
        })
    }

    pub fn test_size(&self) -> usize {
        self.test_size
    }
}

impl EnrichmentStatistic for OverRepresentation {
    fn name(&self) -> &'static str {
        "over-representation"
    }

    fn preferred_order(&self) -> ScoreOrder {
        ScoreOrder::ByIdentifier
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

    /// Members inside the reference are all eligible, unlike the ranking
    /// statistics a category may cover the whole universe.
    fn can_use_category(&self, category: &Category) -> bool {
        !self.member_positions(category).is_empty()
    }

    fn compute_score_from_positions(&self, positions: &[usize]) -> f64 {
        // positions are ascending, count those inside the test-set prefix
        positions.partition_point(|&p| p < self.test_size) as f64
    }

    fn expected_score(&self, hits: usize) -> f64 {
        hits as f64 * self.test_size as f64 / self.universe.len() as f64
    }

    fn direct_p_value(&self, score: f64, hits: usize) -> Option<f64> {
        let alternative = match self.tail {
            OraTail::OneSided => Alternative::towards(score, self.expected_score(hits)),
            OraTail::TwoSided => Alternative::TwoSided,
        };
        let result = hypergeometric_test(
            self.universe.len() as u64,
            hits as u64,
            self.test_size as u64,
            score.max(0.0) as u64,
            alternative,
        );
        Some(result.p_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Identifier, Score};
    use approx::assert_relative_eq;

    fn set(prefix: &str, range: std::ops::Range<usize>) -> ScoreSet {
        ScoreSet::new(
            range
                .map(|i| Score::new(Identifier::intern(&format!("{prefix}-{i}")), 0.0))
                .collect(),
        )
        .unwrap()
    }

    fn category(prefix: &str, members: &[usize]) -> Category {
        Category::new(
            "cat",
            members.iter().map(|i| Identifier::intern(&format!("{prefix}-{i}"))),
        )
    }

    #[test]
    fn test_observed_and_expected() {
        let reference = set("ora", 0..20);
        let test = set("ora", 0..5);
        let ora = OverRepresentation::new(&reference, &test, OraTail::OneSided).unwrap();
        let cat = category("ora", &[0, 1, 2, 10, 11]);

        let positions = ora.member_positions(&cat);
        assert_eq!(positions.len(), 5);
        assert_eq!(ora.compute_score(&cat), 3.0);
        assert_relative_eq!(ora.expected_score(5), 1.25);

        let p = ora.direct_p_value(3.0, 5).unwrap();
        let expected = (10.0 * 105.0 + 5.0 * 15.0 + 1.0) / 15504.0;
        assert_relative_eq!(p, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_depletion_uses_lower_tail() {
        let reference = set("ora-d", 0..20);
        let test = set("ora-d", 0..10);
        let ora = OverRepresentation::new(&reference, &test, OraTail::OneSided).unwrap();
        let cat = category("ora-d", &[12, 13, 14, 15, 16, 17]);
        assert_eq!(ora.compute_score(&cat), 0.0);
        let p = ora.direct_p_value(0.0, 6).unwrap();
        // P(X = 0) with N=20, K=6, n=10
        assert_relative_eq!(p, 10.0 * 9.0 * 8.0 * 7.0 * 6.0 * 5.0 / (20.0 * 19.0 * 18.0 * 17.0 * 16.0 * 15.0), epsilon = 1e-10);
    }

    #[test]
    fn test_foreign_test_members_ignored() {
        let reference = set("ora-f", 0..10);
        let mut scores: Vec<Score> = set("ora-f", 0..3).iter().copied().collect();
        scores.push(Score::new(Identifier::intern("ora-f-outside"), 0.0));
        let test = ScoreSet::new(scores).unwrap();
        let ora = OverRepresentation::new(&reference, &test, OraTail::TwoSided).unwrap();
        assert_eq!(ora.test_size(), 3);
        assert!(!ora.can_use_category(&category("ora-f", &[42])));
    }
}
