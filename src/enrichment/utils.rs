use std::collections::HashMap;

use crate::data::{Category, Identifier};

/// Maps identifiers to their 0-based position in a fixed ranking.
#[derive(Debug, Clone)]
pub(crate) struct RankedUniverse {
    identifiers: Vec<Identifier>,
    positions: HashMap<Identifier, usize>,
}

impl RankedUniverse {
    pub fn new(identifiers: Vec<Identifier>) -> Self {
        let positions = identifiers
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos))
            .collect();
        RankedUniverse {
            identifiers,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Ascending positions of the category members present in the ranking.
    pub fn member_positions(&self, category: &Category) -> Vec<usize> {
        let mut positions: Vec<usize> = category
            .members()
            .iter()
            .filter_map(|id| self.positions.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_positions_sorted() {
        let ids: Vec<Identifier> = ["ru-d", "ru-a", "ru-c", "ru-b"]
            .iter()
            .map(|n| Identifier::intern(n))
            .collect();
        let universe = RankedUniverse::new(ids);
        let cat = Category::new(
            "c",
            ["ru-b", "ru-d", "ru-x"].iter().map(|n| Identifier::intern(n)),
        );
        assert_eq!(universe.member_positions(&cat), vec![0, 3]);
        assert_eq!(universe.len(), 4);
    }
}
