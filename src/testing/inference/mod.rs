use ndarray::{Array2, ArrayView1};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::testing::TTestType;
use crate::testing::inference::parametric::{GroupSums, signal_to_noise, t_statistic_from_sums};

pub mod discrete;

pub mod parametric;

pub mod nonparametric;

/// Turns the samples of one matrix row into a single per-identifier score.
///
/// Injected into column permutation, which rescores every row after each
/// reshuffle of the sample groups.
pub trait ScoringMethod: Send + Sync {
    fn name(&self) -> &'static str;

    fn score_row(&self, row: ArrayView1<'_, f64>, group1: &[usize], group2: &[usize]) -> f64;
}

/// The built-in two-group row scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowScoring {
    MeanDifference,
    SignalToNoise,
    TStatistic(TTestType),
}

impl ScoringMethod for RowScoring {
    fn name(&self) -> &'static str {
        match self {
            RowScoring::MeanDifference => "mean-difference",
            RowScoring::SignalToNoise => "signal-to-noise",
            RowScoring::TStatistic(TTestType::Student) => "student-t",
            RowScoring::TStatistic(TTestType::Welch) => "welch-t",
        }
    }

    fn score_row(&self, row: ArrayView1<'_, f64>, group1: &[usize], group2: &[usize]) -> f64 {
        let g1 = GroupSums::accumulate(|i| row[i], group1);
        let g2 = GroupSums::accumulate(|i| row[i], group2);
        match self {
            RowScoring::MeanDifference => g1.mean() - g2.mean(),
            RowScoring::SignalToNoise => signal_to_noise(&g1, &g2),
            RowScoring::TStatistic(test_type) => t_statistic_from_sums(&g1, &g2, *test_type),
        }
    }
}

/// Scores every row of `matrix` (identifiers × samples) in parallel.
pub fn score_rows(
    matrix: &Array2<f64>,
    group1: &[usize],
    group2: &[usize],
    method: &dyn ScoringMethod,
) -> Vec<f64> {
    (0..matrix.nrows())
        .into_par_iter()
        .map(|row| method.score_row(matrix.row(row), group1, group2))
        .collect()
}
