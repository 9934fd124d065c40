use approx::assert_relative_eq;
use category_enrichment::data::{Category, Identifier, Score, ScoreOrder, ScoreSet};
use category_enrichment::enrichment::{OraTail, StatisticKind, evaluate_categories, running_sum};
use category_enrichment::testing::correction::{CorrectionMethod, adjusted_p_values};
use category_enrichment::testing::inference::parametric::t_test;
use category_enrichment::testing::significance::{right_p_value, two_sided_p_value};
use category_enrichment::testing::TTestType;
use num::rational::BigRational;

#[cfg(test)]
mod running_sum_tests {
    use super::*;

    #[test]
    fn check_known_statistics() {
        assert_eq!(running_sum(10, &[1, 3, 4]), 15);
        assert_eq!(running_sum(15, &[0, 7, 10, 11, 12, 14]), -30);
    }

    #[test]
    fn check_exact_and_approximate_tails() {
        assert_relative_eq!(two_sided_p_value::<BigRational>(8, 4, 12.0), 0.228571, epsilon = 1e-5);
        assert_relative_eq!(right_p_value::<BigRational>(8, 4, 12.0), 0.11428571, epsilon = 1e-7);
        assert_relative_eq!(right_p_value::<f64>(8, 4, 12.0), 0.11428571, epsilon = 1e-5);
    }

    #[test]
    fn check_exact_matches_approximate_on_larger_lattice() {
        for &(n, k, score) in &[(60, 7, 150.0), (60, 7, -200.0), (45, 12, 180.0)] {
            let exact = two_sided_p_value::<BigRational>(n, k, score);
            let approx = two_sided_p_value::<f64>(n, k, score);
            assert_relative_eq!(exact, approx, epsilon = 1e-5);
        }
    }
}

#[cfg(test)]
mod correction_tests {
    use super::*;

    const INPUT: [f64; 5] = [0.05, 0.01, 0.07, 0.03, 0.10];

    #[test]
    fn check_bonferroni() {
        let adjusted = adjusted_p_values(&INPUT, CorrectionMethod::Bonferroni).unwrap();
        for (a, e) in adjusted.iter().zip([0.25, 0.05, 0.35, 0.15, 0.50]) {
            assert_relative_eq!(*a, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn check_benjamini_hochberg_sorted() {
        let mut adjusted = adjusted_p_values(&INPUT, CorrectionMethod::BenjaminiHochberg).unwrap();
        adjusted.sort_by(f64::total_cmp);
        for (a, e) in adjusted.iter().zip([0.05, 0.075, 0.0833333, 0.0875, 0.10]) {
            assert_relative_eq!(*a, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn check_every_method_is_bounded_and_monotone() {
        let raw: [f64; 7] = [0.001, 0.2, 0.04, 0.9, 0.04, 0.5, 0.0];
        let mut order: Vec<usize> = (0..raw.len()).collect();
        order.sort_by(|&a, &b| raw[a].total_cmp(&raw[b]));

        for method in CorrectionMethod::ALL {
            let adjusted = adjusted_p_values(&raw, method).unwrap();
            for (r, a) in raw.iter().zip(&adjusted) {
                assert!((0.0..=1.0).contains(a), "{method}: {a}");
                assert!(a >= r, "{method}: adjusted {a} below raw {r}");
            }
            for pair in order.windows(2) {
                assert!(adjusted[pair[0]] <= adjusted[pair[1]] + 1e-15, "{method} not monotone");
            }
        }
    }

    #[test]
    fn check_tokens_parse_case_insensitively() {
        assert_eq!("BONFERRONI".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::Bonferroni);
        assert_eq!("benjamini_hochberg".parse::<CorrectionMethod>().unwrap(), CorrectionMethod::BenjaminiHochberg);
        assert!("nonsense".parse::<CorrectionMethod>().is_err());
    }
}

#[cfg(test)]
mod score_set_tests {
    use super::*;

    fn set() -> ScoreSet {
        ScoreSet::new(
            ["ut-c", "ut-a", "ut-d", "ut-b"]
                .iter()
                .zip([0.5, 2.0, -1.0, 2.0])
                .map(|(name, v)| Score::new(Identifier::intern(name), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn check_subset_of_whole_universe_is_identity() {
        let scores = set();
        let everything = Category::new("all", scores.identifiers());
        assert_eq!(scores.subset(&everything), scores);
    }

    #[test]
    fn check_sorting_is_idempotent() {
        let once = set().sorted_by(ScoreOrder::ByValue);
        let twice = once.clone().sorted_by(ScoreOrder::ByValue);
        assert_eq!(once, twice);
        assert_eq!(once.as_slice()[0].value(), 2.0);
        assert_eq!(once.as_slice()[3].value(), -1.0);
    }

    #[test]
    fn check_category_without_members_never_tested() {
        let scores = set();
        let stat = StatisticKind::RankSum.build(&scores, None, OraTail::OneSided).unwrap();
        let categories = vec![Category::new("absent", [Identifier::intern("ut-zzz")])];
        assert!(evaluate_categories(stat.as_ref(), &categories, 1, 10).is_empty());
    }
}

#[cfg(test)]
mod t_test_tests {
    use super::*;

    #[test]
    fn check_separated_groups() {
        let result = t_test(&[1.0, 2.0, 3.0], &[7.0, 8.0, 9.0], TTestType::Student);
        assert!(result.p_value < 0.05);
        assert!(result.statistic.abs() > 2.0);
    }

    #[test]
    fn check_identical_groups() {
        let result = t_test(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], TTestType::Welch);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }
}
