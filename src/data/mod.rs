//! Data model shared by all enrichment computations.
//!
//! - [`Identifier`]: interned handle for an identifier string
//! - [`Score`] / [`ScoreSet`]: identifier-value pairs kept in an explicit order
//! - [`Category`] / [`CategoryDatabase`]: named identifier sets to be tested
//! - [`PValueMatrix`]: precomputed raw p-values per job and category

mod category;
mod identifier;
mod pvalues;
mod score;

pub use category::{Category, CategoryDatabase};
pub use identifier::Identifier;
pub use pvalues::PValueMatrix;
pub use score::{Score, ScoreOrder, ScoreSet};
