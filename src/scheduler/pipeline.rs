use std::fs;

use anyhow::{Context, Result};
use log::{debug, error, warn};

use crate::config::{EnrichmentConfig, SignificanceMethod};
use crate::data::{CategoryDatabase, PValueMatrix, ScoreSet};
use crate::enrichment::{CategoryTest, EnrichmentResult, EnrichmentStatistic, evaluate_categories};
use crate::io::{output_path, read_scores, sort_for_output, write_results};
use crate::scheduler::{Job, ReferenceData};
use crate::testing::correction::adjust;
use crate::testing::permutation::RowPermutation;
use crate::testing::significance::{Tail, running_sum_p_value};

/// Databases written and databases that failed for one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobReport {
    pub written: usize,
    pub failed: usize,
}

/// Runs one job against every database and writes one result file per database.
///
/// Failing to read the scores fails the job; a failing database is logged and
/// the remaining databases still run.
pub fn process_job(config: &EnrichmentConfig, reference: &ReferenceData, job: &Job) -> Result<JobReport> {
    let mut scores =
        read_scores(&job.input).with_context(|| format!("failed to read scores from {}", job.input.display()))?;
    if !config.statistic.needs_reference() {
        let dropped = scores.retain_finite();
        if dropped > 0 {
            warn!("{}: {dropped} non-finite scores dropped", job.input.display());
        }
    }

    let statistic = config
        .statistic
        .build(&scores, reference.reference.as_ref(), config.ora_tail)
        .with_context(|| format!("failed to prepare {:?} for {}", config.statistic, job.input.display()))?;

    fs::create_dir_all(&job.output_dir)
        .with_context(|| format!("failed to create output directory {}", job.output_dir.display()))?;

    let stem = job.stem();
    let mut report = JobReport::default();
    for database in &reference.databases {
        match process_database(config, reference, statistic.as_ref(), database, job, &stem) {
            Ok(()) => report.written += 1,
            Err(e) => {
                error!("{stem}: database '{}' skipped: {e:#}", database.name);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

fn process_database(
    config: &EnrichmentConfig,
    reference: &ReferenceData,
    statistic: &dyn EnrichmentStatistic,
    database: &CategoryDatabase,
    job: &Job,
    stem: &str,
) -> Result<()> {
    let tests = evaluate_categories(statistic, &database.categories, config.min_size, config.max_size);
    debug!(
        "{stem}: {} of {} categories in '{}' tested",
        tests.len(),
        database.len(),
        database.name
    );

    let precomputed = reference.pvalues.as_ref().map(|m| (m, stem, database.name.as_str()));
    let mut results = significance(config, statistic, tests, precomputed)?;
    if !results.is_empty() {
        adjust(&mut results, config.correction)
            .with_context(|| format!("{} correction failed", config.correction))?;
    }
    sort_for_output(&mut results);

    let path = output_path(&job.output_dir, stem, &database.name, config.output_format);
    write_results(&path, &results, config.output_format)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Fills in raw p-values.
///
/// `precomputed` is the matrix with the job stem and database name to look
/// up. Precomputed values win. Otherwise direct statistics use their analytic
/// p-value, the unweighted running sum uses the combinatorial engine on the
/// tail its sign points to, and everything else is permuted.
pub fn significance(
    config: &EnrichmentConfig,
    statistic: &dyn EnrichmentStatistic,
    tests: Vec<CategoryTest>,
    precomputed: Option<(&PValueMatrix, &str, &str)>,
) -> Result<Vec<EnrichmentResult>> {
    let n = statistic.universe_size();
    let mut results = Vec::with_capacity(tests.len());
    let mut permuted = Vec::new();

    for mut test in tests {
        let known = precomputed.and_then(|(matrix, job, db)| matrix.lookup(job, db, &test.result.name));
        if let Some(p) = known {
            test.result.raw_pvalue = p;
            results.push(test.result);
            continue;
        }

        let (score, hits) = (test.result.score, test.hits());
        match config.significance {
            SignificanceMethod::RowPermutation => permuted.push(test),
            _ if statistic.row_wise_p_value_is_direct() => {
                test.result.raw_pvalue = statistic.direct_p_value(score, hits).unwrap_or(1.0);
                results.push(test.result);
            }
            _ if statistic.has_combinatorial_null() => {
                let tail = if score >= 0.0 { Tail::Right } else { Tail::Left };
                test.result.raw_pvalue = running_sum_p_value(n, hits, score, tail, config.precision());
                results.push(test.result);
            }
            _ => permuted.push(test),
        }
    }

    if !permuted.is_empty() {
        RowPermutation::new(config.permutations, config.seed)
            .run(statistic, &mut permuted)
            .context("row permutation failed")?;
        results.extend(permuted.into_iter().map(|t| t.result));
    }
    Ok(results)
}

/// Convenience for library callers that already hold scores in memory.
pub fn analyse_scores(
    config: &EnrichmentConfig,
    scores: &ScoreSet,
    reference: Option<&ScoreSet>,
    database: &CategoryDatabase,
) -> Result<Vec<EnrichmentResult>> {
    let statistic = config.statistic.build(scores, reference, config.ora_tail)?;
    let tests = evaluate_categories(statistic.as_ref(), &database.categories, config.min_size, config.max_size);
    let mut results = significance(config, statistic.as_ref(), tests, None)?;
    if !results.is_empty() {
        adjust(&mut results, config.correction)?;
    }
    sort_for_output(&mut results);
    Ok(results)
}
