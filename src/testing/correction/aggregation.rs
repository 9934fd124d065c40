//! Combining p-values of independent analyses of the same category.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::error::{EnrichmentError, Result};

/// Smallest p-value fed into logarithms and quantile functions.
const P_FLOOR: f64 = 1e-300;

fn check(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(EnrichmentError::EmptyPValues);
    }
    for (index, &value) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&value) {
            return Err(EnrichmentError::InvalidPValue { index, value });
        }
    }
    Ok(())
}

/// Fisher's combined probability test.
///
/// `-2 Σ ln p` follows a chi-squared distribution with `2n` degrees of freedom.
pub fn fisher(p_values: &[f64]) -> Result<f64> {
    check(p_values)?;
    let statistic: f64 = -2.0 * p_values.iter().map(|&p| p.max(P_FLOOR).ln()).sum::<f64>();
    let chi = ChiSquared::new(2.0 * p_values.len() as f64)
        .map_err(|e| EnrichmentError::Numeric(e.to_string()))?;
    Ok(chi.sf(statistic).clamp(0.0, 1.0))
}

/// Stouffer's weighted z-method.
///
/// Each p-value is converted to `z = Φ⁻¹(1 - p)`; the combined score
/// `Σ w z / sqrt(Σ w²)` is converted back through the upper normal tail.
/// Pass `None` for equal weights.
pub fn stouffer(p_values: &[f64], weights: Option<&[f64]>) -> Result<f64> {
    check(p_values)?;
    let weights: Vec<f64> = match weights {
        Some(w) if w.len() != p_values.len() => {
            return Err(EnrichmentError::Numeric(format!(
                "{} weights for {} p-values",
                w.len(),
                p_values.len()
            )));
        }
        Some(w) => w.to_vec(),
        None => vec![1.0; p_values.len()],
    };

    let normal = Normal::new(0.0, 1.0).map_err(|e| EnrichmentError::Numeric(e.to_string()))?;
    let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Err(EnrichmentError::Numeric("all Stouffer weights are zero".into()));
    }

    let combined: f64 = p_values
        .iter()
        .zip(&weights)
        .map(|(&p, &w)| {
            let p = p.clamp(P_FLOOR, 1.0 - f64::EPSILON);
            w * normal.inverse_cdf(1.0 - p)
        })
        .sum::<f64>()
        / norm;

    Ok(normal.sf(combined).clamp(0.0, 1.0))
}
