//! Empirical p-values by permutation.
//!
//! - [`RowPermutation`]: random relabeling of the ranking, done on positions with
//!   an incrementally sorted prefix
//! - [`ColumnPermutation`]: reshuffles sample groups of a [`DataMatrix`] and
//!   rescores every row
//!
//! Both run a fixed number of permutations to completion. A permuted statistic
//! counts against a category when it is at least as extreme as the observed
//! one in the observed direction: `>=` for enrichment, `<=` for depletion.

mod column;
mod row;

pub use column::{ColumnMode, ColumnPermutation, DataMatrix};
pub use row::RowPermutation;

/// `(count + 1) / permutations`, capped at 1.
///
/// The pseudo-count keeps permutation p-values away from exactly zero. Zero
/// permutations carry no evidence and yield 1.
pub fn empirical_p_value(count: usize, permutations: usize) -> f64 {
    if permutations == 0 {
        return 1.0;
    }
    ((count + 1) as f64 / permutations as f64).min(1.0)
}

#[inline]
pub(crate) fn at_least_as_extreme(permuted: f64, observed: f64, enriched: bool) -> bool {
    if enriched {
        permuted >= observed
    } else {
        permuted <= observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empirical_p_value() {
        assert_eq!(empirical_p_value(0, 1000), 0.001);
        assert_eq!(empirical_p_value(49, 100), 0.5);
        assert_eq!(empirical_p_value(100, 100), 1.0);
        assert_eq!(empirical_p_value(0, 0), 1.0);
    }

    #[test]
    fn test_direction() {
        assert!(at_least_as_extreme(5.0, 5.0, true));
        assert!(!at_least_as_extreme(4.0, 5.0, true));
        assert!(at_least_as_extreme(-6.0, -5.0, false));
        assert!(!at_least_as_extreme(-4.0, -5.0, false));
    }
}
