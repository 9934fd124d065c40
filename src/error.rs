use std::path::PathBuf;

/// Errors raised by the enrichment library.
///
/// Orchestration code (the scheduler) is the only place these are turned into
/// log lines or skipped units; everything below it propagates them.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("duplicate identifier '{0}' in score set")]
    DuplicateIdentifier(String),

    #[error("non-finite score for identifier '{0}'")]
    NonFinite(String),

    #[error("invalid p-value at index {index}: {value}")]
    InvalidPValue { index: usize, value: f64 },

    #[error("empty p-value array")]
    EmptyPValues,

    #[error("numeric error: {0}")]
    Numeric(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl EnrichmentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EnrichmentError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        EnrichmentError::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Configuration errors are fatal; every other kind can be skipped at the
    /// job, database or category level.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EnrichmentError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, EnrichmentError>;
