//! Run configuration.
//!
//! Every field has a default, so a configuration file only needs the keys it
//! changes:
//!
//! ```
//! use category_enrichment::config::{EnrichmentConfig, SignificanceMethod};
//!
//! let config = EnrichmentConfig::from_json_str(
//!     r#"{ "statistic": "rank-sum", "correction": "BH", "threads": 2 }"#,
//! ).unwrap();
//! assert_eq!(config.significance, SignificanceMethod::Auto);
//! assert_eq!(config.threads, 2);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::enrichment::{OraTail, StatisticKind};
use crate::error::{EnrichmentError, Result};
use crate::io::OutputFormat;
use crate::testing::correction::CorrectionMethod;
use crate::testing::significance::Precision;

/// How raw p-values are obtained for each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignificanceMethod {
    /// Direct p-values where the statistic has them, the combinatorial engine
    /// for the unweighted running sum, row permutation otherwise.
    #[default]
    Auto,
    /// Exact combinatorial engine (running sum only).
    Exact,
    /// Floating point combinatorial engine (running sum only).
    Approximate,
    /// Row permutation for every statistic.
    RowPermutation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    pub statistic: StatisticKind,
    pub significance: SignificanceMethod,
    #[serde(deserialize_with = "correction_from_token")]
    pub correction: CorrectionMethod,
    pub ora_tail: OraTail,
    /// Smallest number of category members present in the universe.
    pub min_size: usize,
    pub max_size: usize,
    pub permutations: usize,
    pub seed: u64,
    /// Worker threads; the loader thread comes on top.
    pub threads: usize,
    /// Jobs buffered between the loader and the workers.
    pub queue_capacity: usize,
    pub output_format: OutputFormat,
    /// Largest `n * k` lattice solved with exact arithmetic.
    pub exact_cell_limit: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        EnrichmentConfig {
            statistic: StatisticKind::default(),
            significance: SignificanceMethod::default(),
            correction: CorrectionMethod::BenjaminiHochberg,
            ora_tail: OraTail::default(),
            min_size: 2,
            max_size: 1000,
            permutations: 1000,
            seed: 42,
            threads: 1,
            queue_capacity: 64,
            output_format: OutputFormat::default(),
            exact_cell_limit: 1_000,
        }
    }
}

fn correction_from_token<'de, D>(deserializer: D) -> std::result::Result<CorrectionMethod, D::Error>
where
    D: Deserializer<'de>,
{
    let token = String::deserialize(deserializer)?;
    token.parse().map_err(serde::de::Error::custom)
}

impl EnrichmentConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EnrichmentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations that cannot run. Called before any job starts.
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(EnrichmentError::Config("min_size must be at least 1".into()));
        }
        if self.min_size > self.max_size {
            return Err(EnrichmentError::Config(format!(
                "min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            )));
        }
        if self.threads == 0 {
            return Err(EnrichmentError::Config("at least one worker thread is required".into()));
        }
        if self.queue_capacity == 0 {
            return Err(EnrichmentError::Config("queue_capacity must be positive".into()));
        }
        if matches!(self.significance, SignificanceMethod::Exact | SignificanceMethod::Approximate)
            && self.statistic != StatisticKind::RunningSum
        {
            return Err(EnrichmentError::Config(format!(
                "{:?} significance is only defined for the unweighted running sum",
                self.significance
            )));
        }
        Ok(())
    }

    /// Arithmetic for the combinatorial engine.
    pub fn precision(&self) -> Precision {
        match self.significance {
            SignificanceMethod::Exact => Precision::Exact,
            SignificanceMethod::Approximate => Precision::Approximate,
            _ => Precision::Auto {
                exact_cell_limit: self.exact_cell_limit,
            },
        }
    }
}
