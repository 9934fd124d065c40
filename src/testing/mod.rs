//! Significance testing for enrichment statistics.
//!
//! - [`inference`]: direct tests (hypergeometric, rank-sum, t statistics) and row scoring
//! - [`significance`]: exact and approximate tail probabilities of the running-sum statistic
//! - [`permutation`]: empirical p-values from row (label) and column (sample) permutation
//! - [`correction`]: multiple testing correction and p-value aggregation

use std::collections::HashMap;

pub mod correction;
pub mod inference;
pub mod permutation;
pub mod significance;

pub mod utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TTestType {
    Student, // Equal variance
    Welch,   // Unequal variance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    TwoSided,
    Less,
    Greater,
}

impl Alternative {
    /// One-sided alternative pointing in the direction of `observed` relative
    /// to `expected`.
    pub fn towards(observed: f64, expected: f64) -> Self {
        if observed > expected {
            Alternative::Greater
        } else {
            Alternative::Less
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestResult {
    /// The test statistic value (e.g., t-statistic, z-score)
    pub statistic: f64,
    /// The p-value of the test
    pub p_value: f64,
    /// Additional test-specific information
    pub metadata: HashMap<String, f64>,
}

impl TestResult {
    /// Create a new test result with minimal information
    pub fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value,
            metadata: HashMap::new(),
        }
    }

    /// Add additional metadata
    pub fn with_metadata(mut self, key: &str, value: f64) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}
