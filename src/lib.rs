//! # category-enrichment
//!
//! Category enrichment analysis for ranked identifier lists: which predefined
//! categories (pathways, ontology terms, ...) are over-represented in a test
//! set or concentrated at either end of a score ranking.
//!
//! ## Core Features
//!
//! - **Statistics**: over-representation (hypergeometric), unweighted and weighted
//!   running sums, Wilcoxon rank sum
//! - **Significance**: exact and floating point tail probabilities of the running
//!   sum, row and column permutation tests
//! - **Multiple Testing Correction**: family-wise and false discovery rate
//!   procedures, Fisher and Stouffer aggregation
//! - **Scheduling**: many score files processed concurrently against shared
//!   category databases
//!
//! ## Module Organization
//!
//! - **[`data`]**: identifiers, score sets, categories and precomputed p-values
//! - **[`enrichment`]**: the enrichment statistics
//! - **[`testing`]**: significance engines, permutation, correction and the
//!   underlying hypothesis tests
//! - **[`scheduler`]**: loader/worker execution of jobs
//! - **[`io`]**: file readers and result writers
//! - **[`config`]**: run configuration

pub mod config;
pub mod data;
pub mod enrichment;
pub mod error;
pub mod io;
pub mod scheduler;
pub mod testing;

pub use error::{EnrichmentError, Result};
