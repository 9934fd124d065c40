use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{EnrichmentError, Result};

pub mod aggregation;

/// Multiple testing correction methods to control for false positives
/// when performing many statistical tests simultaneously.
///
/// Every procedure sorts the p-values ascending, applies a per-rank transform
/// and then enforces monotonicity with either a step-up (cumulative minimum
/// from the largest p-value) or a step-down (cumulative maximum from the
/// smallest p-value) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionMethod {
    Bonferroni,
    Sidak,
    Holm,
    HolmSidak,
    Finner,
    BenjaminiHochberg,
    BenjaminiYekutieli,
    Hochberg,
    Simes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

impl CorrectionMethod {
    pub const ALL: [CorrectionMethod; 9] = [
        CorrectionMethod::Bonferroni,
        CorrectionMethod::Sidak,
        CorrectionMethod::Holm,
        CorrectionMethod::HolmSidak,
        CorrectionMethod::Finner,
        CorrectionMethod::BenjaminiHochberg,
        CorrectionMethod::BenjaminiYekutieli,
        CorrectionMethod::Hochberg,
        CorrectionMethod::Simes,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            CorrectionMethod::Bonferroni => "bonferroni",
            CorrectionMethod::Sidak => "sidak",
            CorrectionMethod::Holm => "holm",
            CorrectionMethod::HolmSidak => "holm-sidak",
            CorrectionMethod::Finner => "finner",
            CorrectionMethod::BenjaminiHochberg => "benjamini-hochberg",
            CorrectionMethod::BenjaminiYekutieli => "benjamini-yekutieli",
            CorrectionMethod::Hochberg => "hochberg",
            CorrectionMethod::Simes => "simes",
        }
    }

    fn step(&self) -> Step {
        match self {
            CorrectionMethod::Bonferroni
            | CorrectionMethod::Sidak
            | CorrectionMethod::Holm
            | CorrectionMethod::HolmSidak
            | CorrectionMethod::Finner => Step::Down,
            CorrectionMethod::BenjaminiHochberg
            | CorrectionMethod::BenjaminiYekutieli
            | CorrectionMethod::Hochberg
            | CorrectionMethod::Simes => Step::Up,
        }
    }

    /// Adjusted value of `p` at 1-based `rank` among `n` ascending p-values,
    /// before monotonicity is enforced.
    fn transform(&self, p: f64, rank: usize, n: usize, harmonic: f64) -> f64 {
        let n_f = n as f64;
        let rank_f = rank as f64;
        match self {
            CorrectionMethod::Bonferroni => p * n_f,
            CorrectionMethod::Sidak => 1.0 - (1.0 - p).powf(n_f),
            CorrectionMethod::Holm => p * (n - rank + 1) as f64,
            CorrectionMethod::HolmSidak => 1.0 - (1.0 - p).powf((n - rank + 1) as f64),
            CorrectionMethod::Finner => 1.0 - (1.0 - p).powf(n_f / rank_f),
            CorrectionMethod::BenjaminiHochberg | CorrectionMethod::Simes => p * n_f / rank_f,
            CorrectionMethod::BenjaminiYekutieli => p * n_f * harmonic / rank_f,
            CorrectionMethod::Hochberg => p * (n - rank + 1) as f64,
        }
    }
}

impl fmt::Display for CorrectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for CorrectionMethod {
    type Err = EnrichmentError;

    /// Case-insensitive; `_`, spaces and `-` are interchangeable and a few
    /// common abbreviations are accepted.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        let method = match normalized.as_str() {
            "bonferroni" => CorrectionMethod::Bonferroni,
            "sidak" | "šidák" => CorrectionMethod::Sidak,
            "holm" | "holm-bonferroni" => CorrectionMethod::Holm,
            "holm-sidak" | "holm-šidák" => CorrectionMethod::HolmSidak,
            "finner" => CorrectionMethod::Finner,
            "benjamini-hochberg" | "bh" | "fdr" => CorrectionMethod::BenjaminiHochberg,
            "benjamini-yekutieli" | "by" => CorrectionMethod::BenjaminiYekutieli,
            "hochberg" => CorrectionMethod::Hochberg,
            "simes" => CorrectionMethod::Simes,
            _ => {
                return Err(EnrichmentError::Config(format!(
                    "unknown multiple testing correction method '{s}'"
                )));
            }
        };
        Ok(method)
    }
}

/// Access to the p-value carried by an element of a collection.
///
/// `p_value` is what gets ranked; `set_adjusted_p_value` receives the
/// corrected value. For plain numbers both refer to the same slot, records may
/// keep raw and corrected values apart.
pub trait PValued {
    fn p_value(&self) -> f64;

    fn set_adjusted_p_value(&mut self, adjusted: f64);
}

impl PValued for f64 {
    fn p_value(&self) -> f64 {
        *self
    }

    fn set_adjusted_p_value(&mut self, adjusted: f64) {
        *self = adjusted;
    }
}

impl<T> PValued for (T, f64) {
    fn p_value(&self) -> f64 {
        self.1
    }

    fn set_adjusted_p_value(&mut self, adjusted: f64) {
        self.1 = adjusted;
    }
}

fn validate<P: PValued>(items: &[P]) -> Result<()> {
    if items.is_empty() {
        return Err(EnrichmentError::EmptyPValues);
    }
    for (index, item) in items.iter().enumerate() {
        let value = item.p_value();
        if !(0.0..=1.0).contains(&value) {
            return Err(EnrichmentError::InvalidPValue { index, value });
        }
    }
    Ok(())
}

/// Cumulative minimum walking from the largest p-value down.
pub fn step_up(sorted_adjusted: &mut [f64]) {
    let mut current_min = 1.0_f64;
    for value in sorted_adjusted.iter_mut().rev() {
        current_min = current_min.min(*value);
        *value = current_min;
    }
}

/// Cumulative maximum walking from the smallest p-value up.
pub fn step_down(sorted_adjusted: &mut [f64]) {
    let mut current_max = 0.0_f64;
    for value in sorted_adjusted.iter_mut() {
        current_max = current_max.max(*value);
        *value = current_max;
    }
}

/// Corrects the p-values of `items` in place, preserving their order.
///
/// # Example
/// ```
/// use category_enrichment::testing::correction::{adjust, CorrectionMethod};
///
/// let mut p_values = vec![0.01, 0.03, 0.05];
/// adjust(&mut p_values, CorrectionMethod::Bonferroni).unwrap();
/// assert!((p_values[0] - 0.03).abs() < 1e-12);
/// ```
pub fn adjust<P: PValued>(items: &mut [P], method: CorrectionMethod) -> Result<()> {
    validate(items)?;
    let n = items.len();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        items[a]
            .p_value()
            .partial_cmp(&items[b].p_value())
            .unwrap_or(Ordering::Equal)
    });

    let harmonic: f64 = (1..=n).map(|i| 1.0 / i as f64).sum();
    let mut adjusted: Vec<f64> = order
        .iter()
        .enumerate()
        .map(|(i, &idx)| method.transform(items[idx].p_value(), i + 1, n, harmonic).clamp(0.0, 1.0))
        .collect();

    match method.step() {
        Step::Up => step_up(&mut adjusted),
        Step::Down => step_down(&mut adjusted),
    }

    for (&idx, value) in order.iter().zip(adjusted) {
        items[idx].set_adjusted_p_value(value);
    }
    Ok(())
}

/// Returns corrected copies of `p_values` in input order.
pub fn adjusted_p_values(p_values: &[f64], method: CorrectionMethod) -> Result<Vec<f64>> {
    let mut adjusted = p_values.to_vec();
    adjust(&mut adjusted, method)?;
    Ok(adjusted)
}

/// Apply Bonferroni correction to p-values
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    adjusted_p_values(p_values, CorrectionMethod::Bonferroni)
}

/// Apply Benjamini-Hochberg (BH) procedure for controlling false discovery rate
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    adjusted_p_values(p_values, CorrectionMethod::BenjaminiHochberg)
}

/// Apply Benjamini-Yekutieli (BY) procedure, valid under arbitrary dependence
pub fn benjamini_yekutieli_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    adjusted_p_values(p_values, CorrectionMethod::BenjaminiYekutieli)
}

/// Apply Holm-Bonferroni (step-down) method for controlling family-wise error rate
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    adjusted_p_values(p_values, CorrectionMethod::Holm)
}

/// Apply Hochberg's step-up method for controlling family-wise error rate
pub fn hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    adjusted_p_values(p_values, CorrectionMethod::Hochberg)
}
