use crate::testing::{Alternative, TestResult};
use statrs::distribution::{Discrete, DiscreteCDF, Hypergeometric};

/// Relative tolerance when comparing table probabilities in the two-sided test.
const PMF_TOLERANCE: f64 = 1e-7;

/// Performs an exact test on a 2x2 contingency table described by its margins.
///
/// * `population` - size of the reference universe
/// * `successes` - category members inside the universe
/// * `draws` - size of the test set
/// * `observed` - category members inside the test set
///
/// The two-sided variant is Fisher's exact test: the sum of all table
/// probabilities not exceeding the probability of the observed table.
pub fn hypergeometric_test(
    population: u64,
    successes: u64,
    draws: u64,
    observed: u64,
    alternative: Alternative,
) -> TestResult {
    let observed_f = observed as f64;
    if population == 0 || successes == 0 || draws == 0 {
        return TestResult::new(observed_f, 1.0);
    }

    let dist = match Hypergeometric::new(population, successes, draws) {
        Ok(dist) => dist,
        Err(_) => return TestResult::new(observed_f, 1.0), // Fallback for invalid margins
    };

    let lower = (draws + successes).saturating_sub(population);
    let upper = draws.min(successes);

    let p_value = match alternative {
        Alternative::Greater => {
            if observed <= lower {
                1.0
            } else {
                dist.sf(observed - 1)
            }
        }
        Alternative::Less => dist.cdf(observed),
        Alternative::TwoSided => {
            let observed_pmf = dist.pmf(observed);
            let threshold = observed_pmf * (1.0 + PMF_TOLERANCE);
            (lower..=upper)
                .map(|x| dist.pmf(x))
                .filter(|&pmf| pmf <= threshold)
                .sum()
        }
    };

    let expected = successes as f64 * draws as f64 / population as f64;
    TestResult::new(observed_f, p_value.clamp(0.0, 1.0)).with_metadata("expected", expected)
}
