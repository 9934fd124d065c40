use std::cmp::Ordering;

use crate::data::{Category, Identifier};
use crate::error::{EnrichmentError, Result};

/// An identifier paired with its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    identifier: Identifier,
    value: f64,
}

impl Score {
    pub fn new(identifier: Identifier, value: f64) -> Self {
        Score { identifier, value }
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// The order a [`ScoreSet`] is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScoreOrder {
    /// Ascending identifier; required for membership and subset queries.
    ByIdentifier,
    /// Decreasing value with non-finite values last; required for ranking.
    ByValue,
}

/// Decreasing by value, NaN last, identifier as tie breaker so sorting is
/// deterministic.
fn by_value(a: &Score, b: &Score) -> Ordering {
    match (a.value.is_nan(), b.value.is_nan()) {
        (true, true) => a.identifier.cmp(&b.identifier),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b
            .value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.identifier.cmp(&b.identifier)),
    }
}

/// Ordered collection of scores, tracked to be in exactly one [`ScoreOrder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSet {
    scores: Vec<Score>,
    order: ScoreOrder,
}

impl ScoreSet {
    /// Builds a score set in canonical (identifier) order.
    ///
    /// Identifiers must be unique.
    pub fn new(mut scores: Vec<Score>) -> Result<Self> {
        scores.sort_by_key(|s| s.identifier);
        if let Some(w) = scores.windows(2).find(|w| w[0].identifier == w[1].identifier) {
            return Err(EnrichmentError::DuplicateIdentifier(
                w[0].identifier.name().to_string(),
            ));
        }
        Ok(ScoreSet {
            scores,
            order: ScoreOrder::ByIdentifier,
        })
    }

    /// Builds a score set from values that share the order of `identifiers`.
    pub fn from_parts(identifiers: &[Identifier], values: &[f64]) -> Result<Self> {
        if identifiers.len() != values.len() {
            return Err(EnrichmentError::Numeric(format!(
                "{} identifiers but {} values",
                identifiers.len(),
                values.len()
            )));
        }
        ScoreSet::new(
            identifiers
                .iter()
                .zip(values)
                .map(|(&id, &v)| Score::new(id, v))
                .collect(),
        )
    }

    pub fn order(&self) -> ScoreOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Score> {
        self.scores.iter()
    }

    pub fn as_slice(&self) -> &[Score] {
        &self.scores
    }

    pub fn identifiers(&self) -> Vec<Identifier> {
        self.scores.iter().map(|s| s.identifier).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.value).collect()
    }

    pub fn has_non_finite(&self) -> bool {
        self.scores.iter().any(|s| !s.value.is_finite())
    }

    /// Returns the first score whose value is not finite.
    pub fn first_non_finite(&self) -> Option<&Score> {
        self.scores.iter().find(|s| !s.value.is_finite())
    }

    /// Sorts in place; sorting twice by the same order is a no-op.
    pub fn sort_by(&mut self, order: ScoreOrder) {
        if self.order == order {
            return;
        }
        match order {
            ScoreOrder::ByIdentifier => self.scores.sort_by_key(|s| s.identifier),
            ScoreOrder::ByValue => self.scores.sort_by(by_value),
        }
        self.order = order;
    }

    pub fn sorted_by(mut self, order: ScoreOrder) -> Self {
        self.sort_by(order);
        self
    }

    pub fn contains(&self, id: Identifier) -> bool {
        self.position_of(id).is_some()
    }

    pub fn value_of(&self, id: Identifier) -> Option<f64> {
        self.position_of(id).map(|i| self.scores[i].value)
    }

    /// Position of `id` in the current order.
    pub fn position_of(&self, id: Identifier) -> Option<usize> {
        match self.order {
            ScoreOrder::ByIdentifier => self
                .scores
                .binary_search_by_key(&id, |s| s.identifier)
                .ok(),
            ScoreOrder::ByValue => self.scores.iter().position(|s| s.identifier == id),
        }
    }

    /// The scores whose identifier belongs to `category`, in the current order.
    pub fn subset(&self, category: &Category) -> ScoreSet {
        ScoreSet {
            scores: self
                .scores
                .iter()
                .filter(|s| category.contains(s.identifier))
                .copied()
                .collect(),
            order: self.order,
        }
    }

    /// Keeps only the scores with finite values.
    pub fn retain_finite(&mut self) -> usize {
        let before = self.scores.len();
        self.scores.retain(|s| s.value.is_finite());
        before - self.scores.len()
    }
}

impl<'a> IntoIterator for &'a ScoreSet {
    type Item = &'a Score;
    type IntoIter = std::slice::Iter<'a, Score>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}
