use log::{debug, warn};
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::data::{Category, Identifier, ScoreSet};
use crate::enrichment::{CategoryTest, OraTail, StatisticKind, evaluate_categories};
use crate::error::{EnrichmentError, Result};
use crate::testing::inference::{ScoringMethod, score_rows};
use crate::testing::permutation::{at_least_as_extreme, empirical_p_value};
use crate::testing::utils::{extract_unique_groups, get_group_indices, two_group_indices};

/// Identifier-by-sample matrix from which per-identifier scores are derived.
#[derive(Debug, Clone)]
pub struct DataMatrix {
    identifiers: Vec<Identifier>,
    values: Array2<f64>,
}

impl DataMatrix {
    pub fn new(identifiers: Vec<Identifier>, values: Array2<f64>) -> Result<Self> {
        if identifiers.len() != values.nrows() {
            return Err(EnrichmentError::Numeric(format!(
                "{} row identifiers for a matrix with {} rows",
                identifiers.len(),
                values.nrows()
            )));
        }
        Ok(DataMatrix {
            identifiers,
            values,
        })
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn nsamples(&self) -> usize {
        self.values.ncols()
    }
}

/// How column-permutation tails are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnMode {
    /// Count permutations at least as extreme as the observed statistic.
    #[default]
    Standard,
    /// Running-sum variant: scores are divided by the mean of the permuted
    /// statistics of the same sign, and tails only consider permutations of the
    /// observed sign.
    SignNormalized,
}

/// Permutes the sample-group assignment and recomputes every row score.
pub struct ColumnPermutation<'a> {
    permutations: usize,
    seed: u64,
    kind: StatisticKind,
    method: &'a dyn ScoringMethod,
    mode: ColumnMode,
}

impl<'a> ColumnPermutation<'a> {
    pub fn new(permutations: usize, seed: u64, kind: StatisticKind, method: &'a dyn ScoringMethod) -> Self {
        ColumnPermutation {
            permutations,
            seed,
            kind,
            method,
            mode: ColumnMode::Standard,
        }
    }

    pub fn with_mode(mut self, mode: ColumnMode) -> Self {
        self.mode = mode;
        self
    }

    /// Scores rows for the observed groups, evaluates `categories` and assigns
    /// empirical p-values.
    ///
    /// Rows whose observed score is not finite are excluded with a warning.
    pub fn run(
        &self,
        matrix: &DataMatrix,
        group_ids: &[usize],
        categories: &[Category],
        min_size: usize,
        max_size: usize,
    ) -> Result<Vec<CategoryTest>> {
        if self.kind.needs_reference() {
            return Err(EnrichmentError::Config(
                "column permutation needs a score based statistic".into(),
            ));
        }
        if self.mode == ColumnMode::SignNormalized
            && !matches!(self.kind, StatisticKind::RunningSum | StatisticKind::WeightedRunningSum)
        {
            return Err(EnrichmentError::Config(
                "sign-normalized column permutation requires a running-sum statistic".into(),
            ));
        }
        if group_ids.len() != matrix.nsamples() {
            return Err(EnrichmentError::Config(format!(
                "{} group labels for {} samples",
                group_ids.len(),
                matrix.nsamples()
            )));
        }

        let (group1, group2) = two_group_indices(group_ids)?;
        let observed = score_rows(matrix.values(), &group1, &group2, self.method);

        let rows: Vec<usize> = (0..matrix.nrows())
            .filter(|&row| {
                let finite = observed[row].is_finite();
                if !finite {
                    warn!(
                        "non-finite {} score for '{}', row excluded",
                        self.method.name(),
                        matrix.identifiers()[row]
                    );
                }
                finite
            })
            .collect();
        let identifiers: Vec<Identifier> = rows.iter().map(|&r| matrix.identifiers()[r]).collect();

        let scores = ScoreSet::from_parts(&identifiers, &pick(&observed, &rows))?;
        let statistic = self.kind.build(&scores, None, OraTail::default())?;
        let mut tests = evaluate_categories(statistic.as_ref(), categories, min_size, max_size);
        if tests.is_empty() {
            return Ok(tests);
        }
        if self.permutations == 0 {
            warn!("zero permutations requested, reporting p-value 1 for {} categories", tests.len());
            return Ok(tests);
        }

        let null = self.null_statistics(matrix, group_ids, &rows, &identifiers, categories, &tests)?;
        match self.mode {
            ColumnMode::Standard => assign_standard(&mut tests, &null, self.permutations),
            ColumnMode::SignNormalized => assign_sign_normalized(&mut tests, &null),
        }
        Ok(tests)
    }

    /// `null[t][p]`: statistic of test `t` under permutation `p`.
    fn null_statistics(
        &self,
        matrix: &DataMatrix,
        group_ids: &[usize],
        rows: &[usize],
        identifiers: &[Identifier],
        categories: &[Category],
        tests: &[CategoryTest],
    ) -> Result<Vec<Vec<f64>>> {
        let unique_groups = extract_unique_groups(group_ids);
        let mut labels = group_ids.to_vec();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut null = vec![Vec::with_capacity(self.permutations); tests.len()];

        debug!(
            "column permutation of {} samples, {} rows, {} permutations",
            labels.len(),
            rows.len(),
            self.permutations
        );

        for _ in 0..self.permutations {
            labels.shuffle(&mut rng);
            let (group1, group2) = get_group_indices(&labels, &unique_groups);
            let permuted = score_rows(matrix.values(), &group1, &group2, self.method);

            let mut values = pick(&permuted, rows);
            let mut replaced = 0usize;
            for v in values.iter_mut().filter(|v| !v.is_finite()) {
                *v = 0.0;
                replaced += 1;
            }
            if replaced > 0 {
                debug!("{replaced} non-finite permuted scores replaced by 0");
            }

            let scores = ScoreSet::from_parts(identifiers, &values)?;
            let statistic = self.kind.build(&scores, None, OraTail::default())?;
            for (test, stats) in tests.iter().zip(null.iter_mut()) {
                stats.push(statistic.compute_score(&categories[test.category]));
            }
        }

        Ok(null)
    }
}

fn pick(values: &[f64], rows: &[usize]) -> Vec<f64> {
    rows.iter().map(|&r| values[r]).collect()
}

fn assign_standard(tests: &mut [CategoryTest], null: &[Vec<f64>], permutations: usize) {
    for (test, stats) in tests.iter_mut().zip(null) {
        let observed = &test.result;
        let count = stats
            .iter()
            .filter(|&&s| at_least_as_extreme(s, observed.score, observed.enriched))
            .count();
        test.result.raw_pvalue = empirical_p_value(count, permutations);
    }
}

/// Sign-aware tails: only permutations on the observed side of zero are
/// compared, and the p-value is `(count + 1) / (same_side + 1)`.
fn assign_sign_normalized(tests: &mut [CategoryTest], null: &[Vec<f64>]) {
    for (test, stats) in tests.iter_mut().zip(null) {
        let (positive, negative): (Vec<f64>, Vec<f64>) = stats.iter().partition(|&&s| s >= 0.0);
        let mean_abs = |values: &[f64]| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64)
            }
        };

        let observed = test.result.score;
        let (same_side, mean) = if observed >= 0.0 {
            (&positive, mean_abs(&positive))
        } else {
            (&negative, mean_abs(&negative))
        };

        let count = same_side.iter().filter(|s| s.abs() >= observed.abs()).count();
        test.result.raw_pvalue = ((count + 1) as f64 / (same_side.len() + 1) as f64).min(1.0);
        test.result.normalized_score = match mean {
            Some(m) if m > 0.0 => Some(observed / m),
            _ => None,
        };
        test.result.enriched = observed > 0.0;
    }
}
