//! Concurrent execution of enrichment jobs.
//!
//! One loader thread streams [`Job`]s from a job file into a bounded channel;
//! `threads` workers take jobs until the loader hangs up. Reference data is
//! loaded once and shared read-only through an [`Arc`].

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::{Receiver, bounded};
use log::{error, info, warn};

use crate::config::EnrichmentConfig;
use crate::data::{CategoryDatabase, PValueMatrix, ScoreSet};
use crate::error::EnrichmentError;
use crate::io::{job_lines, read_category_databases, read_pvalue_matrix, read_scores};

mod job;
mod pipeline;

pub use job::Job;
pub use pipeline::{JobReport, analyse_scores, process_job, significance};

/// Data every job reads but none modifies.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub databases: Vec<CategoryDatabase>,
    /// Universe for over-representation analysis.
    pub reference: Option<ScoreSet>,
    pub pvalues: Option<PValueMatrix>,
    /// Entries of the database list that could not be loaded.
    pub databases_skipped: usize,
}

impl ReferenceData {
    pub fn new(databases: Vec<CategoryDatabase>) -> Self {
        ReferenceData {
            databases,
            ..Default::default()
        }
    }

    pub fn with_reference(mut self, reference: ScoreSet) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_pvalues(mut self, pvalues: PValueMatrix) -> Self {
        self.pvalues = Some(pvalues);
        self
    }

    /// Reads the database list plus the optional reference set and p-value matrix.
    ///
    /// A database that cannot be read is skipped with a warning; only an
    /// unreadable list fails.
    pub fn load(databases: &Path, reference: Option<&Path>, pvalues: Option<&Path>) -> Result<Self> {
        let (loaded, failures) = read_category_databases(databases)
            .with_context(|| format!("failed to load category databases from {}", databases.display()))?;
        for failure in &failures {
            warn!("category database skipped: {failure}");
        }
        let mut data = ReferenceData::new(loaded);
        data.databases_skipped = failures.len();
        if let Some(path) = reference {
            let scores = read_scores(path)
                .with_context(|| format!("failed to load reference set from {}", path.display()))?;
            data = data.with_reference(scores);
        }
        if let Some(path) = pvalues {
            let matrix = read_pvalue_matrix(path)
                .with_context(|| format!("failed to load p-value matrix from {}", path.display()))?;
            data = data.with_pvalues(matrix);
        }
        info!(
            "loaded {} category databases ({} categories, {} skipped)",
            data.databases.len(),
            data.databases.iter().map(CategoryDatabase::len).sum::<usize>(),
            data.databases_skipped
        );
        Ok(data)
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub jobs_loaded: usize,
    pub jobs_completed: usize,
    pub jobs_failed: usize,
    pub databases_failed: usize,
}

#[derive(Debug, Default)]
struct Progress {
    summary: RunSummary,
}

impl Progress {
    fn record(&mut self, job: &Job, outcome: &Result<JobReport>) {
        match outcome {
            Ok(report) => {
                self.summary.jobs_completed += 1;
                self.summary.databases_failed += report.failed;
            }
            Err(_) => self.summary.jobs_failed += 1,
        }
        info!(
            "[{} done, {} failed] {}",
            self.summary.jobs_completed,
            self.summary.jobs_failed,
            job.input.display()
        );
    }
}

pub struct Scheduler {
    config: Arc<EnrichmentConfig>,
    reference: Arc<ReferenceData>,
}

impl Scheduler {
    /// Validates the configuration against the reference data.
    pub fn new(config: EnrichmentConfig, reference: Arc<ReferenceData>) -> Result<Self> {
        config.validate()?;
        if config.statistic.needs_reference() && reference.reference.is_none() {
            return Err(EnrichmentError::Config(
                "over-representation analysis requires a reference set".into(),
            )
            .into());
        }
        Ok(Scheduler {
            config: Arc::new(config),
            reference,
        })
    }

    /// Runs every job of `job_file` and blocks until all workers are done.
    pub fn run(&self, job_file: &Path) -> Result<RunSummary> {
        let (sender, receiver) = bounded::<Job>(self.config.queue_capacity);
        let progress = Arc::new(Mutex::new(Progress::default()));

        let path: PathBuf = job_file.to_path_buf();
        let loader = thread::spawn(move || -> Result<usize> {
            let mut loaded = 0;
            for job in job_lines(&path)? {
                let job = job?;
                if sender.send(job).is_err() {
                    break;
                }
                loaded += 1;
            }
            Ok(loaded)
        });

        let workers: Vec<_> = (0..self.config.threads)
            .map(|_| {
                let receiver = receiver.clone();
                let config = Arc::clone(&self.config);
                let reference = Arc::clone(&self.reference);
                let progress = Arc::clone(&progress);
                thread::spawn(move || work(&receiver, &config, &reference, &progress))
            })
            .collect();
        drop(receiver);

        let loaded = loader
            .join()
            .map_err(|_| anyhow!("job loader thread panicked"))?
            .with_context(|| format!("failed to read jobs from {}", job_file.display()));
        for worker in workers {
            worker.join().map_err(|_| anyhow!("worker thread panicked"))?;
        }

        let mut summary = progress.lock().unwrap_or_else(PoisonError::into_inner).summary;
        summary.jobs_loaded = loaded?;
        info!(
            "{} jobs: {} completed, {} failed",
            summary.jobs_loaded, summary.jobs_completed, summary.jobs_failed
        );
        Ok(summary)
    }
}

fn work(receiver: &Receiver<Job>, config: &EnrichmentConfig, reference: &ReferenceData, progress: &Mutex<Progress>) {
    for job in receiver.iter() {
        let outcome = process_job(config, reference, &job);
        if let Err(e) = &outcome {
            error!("job {} failed: {e:#}", job.input.display());
        }
        progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&job, &outcome);
    }
}
