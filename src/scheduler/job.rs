use std::path::PathBuf;

/// One score file to analyse against every category database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output_dir: PathBuf,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Job {
            input: input.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Job name used for output files and precomputed p-value lookups.
    pub fn stem(&self) -> String {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scores".to_string())
    }
}
