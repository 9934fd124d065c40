//! File formats at the edge of the library.
//!
//! Readers return typed errors carrying the offending path and line; nothing
//! here logs. Skipping happens only where a format defines lines to be ignored
//! or, for database lists, per database.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;

use crate::data::{Category, CategoryDatabase, Identifier, PValueMatrix, Score, ScoreSet};
use crate::enrichment::EnrichmentResult;
use crate::error::{EnrichmentError, Result};
use crate::scheduler::Job;

/// Serialization of per-database result files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| EnrichmentError::io(path, e))
}

/// Numbered lines, 1-based.
fn lines(path: &Path) -> Result<impl Iterator<Item = Result<(usize, String)>> + '_> {
    let reader = open(path)?;
    Ok(reader
        .lines()
        .enumerate()
        .map(move |(i, line)| line.map(|l| (i + 1, l)).map_err(|e| EnrichmentError::io(path, e))))
}

/// Reads a database list: one `name path` pair per non-blank line.
///
/// Relative database paths are resolved against the directory of the list.
/// Only an unreadable list is an error; a malformed line or an unreadable
/// database is returned alongside the databases that did load.
pub fn read_category_databases(path: &Path) -> Result<(Vec<CategoryDatabase>, Vec<EnrichmentError>)> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut databases = Vec::new();
    let mut failures = Vec::new();
    for line in lines(path)? {
        let (number, line) = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [name, file] = fields[..] else {
            failures.push(EnrichmentError::format(
                path,
                number,
                format!("expected 2 fields (name, path), found {}", fields.len()),
            ));
            continue;
        };
        match read_gmt(&base.join(file), name) {
            Ok(database) => databases.push(database),
            Err(e) => failures.push(e),
        }
    }
    Ok((databases, failures))
}

/// Reads a GMT file: `name<TAB>reference<TAB>member...` per line.
pub fn read_gmt(path: &Path, database: &str) -> Result<CategoryDatabase> {
    let mut categories = Vec::new();
    for line in lines(path)? {
        let (number, line) = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let name = fields.next().map(str::trim).unwrap_or_default();
        let Some(reference) = fields.next() else {
            return Err(EnrichmentError::format(path, number, "missing reference field"));
        };
        if name.is_empty() {
            return Err(EnrichmentError::format(path, number, "empty category name"));
        }
        let members = fields
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(Identifier::intern);
        categories.push(Category::new(name, members).with_reference(reference.trim()));
    }
    log::debug!("read {} categories for '{database}' from {}", categories.len(), path.display());
    Ok(CategoryDatabase::new(database, categories))
}

/// Reads `identifier value` pairs. Blank lines and `#` comments are skipped.
pub fn read_scores(path: &Path) -> Result<ScoreSet> {
    let mut scores = Vec::new();
    for line in lines(path)? {
        let (number, line) = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [identifier, value] = fields[..] else {
            return Err(EnrichmentError::format(
                path,
                number,
                format!("expected identifier and value, found {} fields", fields.len()),
            ));
        };
        let value: f64 = value
            .parse()
            .map_err(|_| EnrichmentError::format(path, number, format!("invalid score '{value}'")))?;
        scores.push(Score::new(Identifier::intern(identifier), value));
    }
    ScoreSet::new(scores)
}

/// Parses one job line, `input;output_dir`. Lines with fewer fields are not jobs.
pub fn parse_job_line(line: &str) -> Option<Job> {
    let mut fields = line.split(';').map(str::trim);
    let input = fields.next().filter(|f| !f.is_empty())?;
    let output = fields.next().filter(|f| !f.is_empty())?;
    Some(Job::new(input, output))
}

/// Streams the jobs of a job file in file order.
pub fn job_lines(path: &Path) -> Result<impl Iterator<Item = Result<Job>> + '_> {
    Ok(lines(path)?.filter_map(|line| match line {
        Ok((_, line)) => parse_job_line(&line).map(Ok),
        Err(e) => Some(Err(e)),
    }))
}

/// Reads a tab-separated p-value matrix.
///
/// The header holds category names after one leading label column; every
/// other line is a job name followed by one value per category. Empty cells
/// and `NA` are missing values.
pub fn read_pvalue_matrix(path: &Path) -> Result<PValueMatrix> {
    let mut rows = lines(path)?;
    let categories: Vec<String> = match rows.next().transpose()? {
        Some((_, header)) => header.split('\t').skip(1).map(|c| c.trim().to_string()).collect(),
        None => return Err(EnrichmentError::format(path, 1, "missing header")),
    };

    let mut jobs = Vec::new();
    let mut values = Vec::new();
    for line in rows {
        let (number, line) = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        jobs.push(fields.next().unwrap_or_default().trim().to_string());
        let cells: Vec<&str> = fields.collect();
        if cells.len() != categories.len() {
            return Err(EnrichmentError::format(
                path,
                number,
                format!("expected {} values, found {}", categories.len(), cells.len()),
            ));
        }
        for cell in cells {
            let cell = cell.trim();
            let value = if cell.is_empty() || cell.eq_ignore_ascii_case("na") {
                f64::NAN
            } else {
                cell.parse()
                    .map_err(|_| EnrichmentError::format(path, number, format!("invalid p-value '{cell}'")))?
            };
            values.push(value);
        }
    }

    let values = Array2::from_shape_vec((jobs.len(), categories.len()), values)
        .map_err(|e| EnrichmentError::Numeric(e.to_string()))?;
    PValueMatrix::new(jobs, categories, values)
}

/// Name of a job's result file for one database: `<stem>.<db>.<ext>`.
pub fn output_path(output_dir: &Path, stem: &str, database: &str, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("{stem}.{database}.{}", format.extension()))
}

/// Score descending, ties by descending hit count.
pub fn sort_for_output(results: &mut [EnrichmentResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| b.hits.cmp(&a.hits)));
}

const TEXT_HEADER: [&str; 9] = [
    "name",
    "reference",
    "hits",
    "score",
    "expected_score",
    "raw_pvalue",
    "corrected_pvalue",
    "enriched",
    "normalized_score",
];

pub fn write_results(path: &Path, results: &[EnrichmentResult], format: OutputFormat) -> Result<()> {
    let file = File::create(path).map_err(|e| EnrichmentError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    match format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut writer, results)?,
        OutputFormat::Text => write_text(&mut writer, results).map_err(|e| EnrichmentError::io(path, e))?,
    }
    writer.flush().map_err(|e| EnrichmentError::io(path, e))
}

fn write_text<W: Write>(writer: &mut W, results: &[EnrichmentResult]) -> std::io::Result<()> {
    writeln!(writer, "{}", TEXT_HEADER.join("\t"))?;
    for r in results {
        let normalized = r.normalized_score.map(|v| v.to_string()).unwrap_or_default();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.name,
            r.reference,
            r.hits,
            r.score,
            r.expected_score,
            r.raw_pvalue,
            r.corrected_pvalue,
            r.enriched,
            normalized
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_scores() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "s.txt", "# header\nio-a 1.5\n\nio-b\t-2\n");
        let scores = read_scores(&path).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores.value_of(Identifier::intern("io-b")), Some(-2.0));
    }

    #[test]
    fn test_read_scores_errors() {
        let dir = TempDir::new().unwrap();
        let bad_value = write(&dir, "v.txt", "io-a 1\nio-b x\n");
        match read_scores(&bad_value) {
            Err(EnrichmentError::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
        let bad_fields = write(&dir, "f.txt", "io-a 1 2\n");
        assert!(matches!(read_scores(&bad_fields), Err(EnrichmentError::Format { .. })));
        let duplicate = write(&dir, "d.txt", "io-a 1\nio-a 2\n");
        assert!(matches!(read_scores(&duplicate), Err(EnrichmentError::DuplicateIdentifier(_))));
        assert!(matches!(
            read_scores(&dir.path().join("missing.txt")),
            Err(EnrichmentError::Io { .. })
        ));
    }

    #[test]
    fn test_read_databases_and_gmt() {
        let dir = TempDir::new().unwrap();
        write(&dir, "kegg.gmt", "path1\thttp://x/1\tio-g1\tio-g2\n\npath2\t\tio-g3\n");
        let list = write(&dir, "dbs.txt", "kegg kegg.gmt\n");
        let (dbs, failures) = read_category_databases(&list).unwrap();
        assert!(failures.is_empty());
        assert_eq!(dbs.len(), 1);
        assert_eq!(dbs[0].name, "kegg");
        assert_eq!(dbs[0].len(), 2);
        assert_eq!(dbs[0].categories[0].reference(), Some("http://x/1"));
        assert_eq!(dbs[0].categories[1].reference(), None);
        assert_eq!(dbs[0].categories[1].len(), 1);
    }

    #[test]
    fn test_broken_databases_do_not_drop_good_ones() {
        let dir = TempDir::new().unwrap();
        write(&dir, "good.gmt", "c1\t\tio-x1\tio-x2\n");
        write(&dir, "bad.gmt", "no-reference-field\n");
        let list = write(
            &dir,
            "dbs.txt",
            "good good.gmt\nbroken missing.gmt\nmalformed bad.gmt\nthree fields here\n",
        );
        let (dbs, failures) = read_category_databases(&list).unwrap();
        assert_eq!(dbs.len(), 1);
        assert_eq!(dbs[0].name, "good");
        assert_eq!(failures.len(), 3);
        assert!(matches!(failures[0], EnrichmentError::Io { .. }));
        assert!(matches!(failures[1], EnrichmentError::Format { line: 1, .. }));
        assert!(matches!(failures[2], EnrichmentError::Format { line: 4, .. }));

        assert!(read_category_databases(&dir.path().join("no-list.txt")).is_err());
    }

    #[test]
    fn test_job_lines() {
        assert!(parse_job_line("only-one-field").is_none());
        assert!(parse_job_line("").is_none());
        let job = parse_job_line("in/a.txt; out").unwrap();
        assert_eq!(job.input, PathBuf::from("in/a.txt"));
        assert_eq!(job.output_dir, PathBuf::from("out"));

        let dir = TempDir::new().unwrap();
        let path = write(&dir, "jobs.txt", "a.txt;out\nskip\nb.txt;out2\n");
        let jobs: Vec<Job> = job_lines(&path).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[1].input, PathBuf::from("b.txt"));
    }

    #[test]
    fn test_read_pvalue_matrix() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "p.tsv", "job\tc1\tc2\nrun1\t0.01\tNA\nrun2\t\t0.5\n");
        let m = read_pvalue_matrix(&path).unwrap();
        assert_eq!(m.lookup("run1", "db", "c1"), Some(0.01));
        assert_eq!(m.lookup("run1", "db", "c2"), None);
        assert_eq!(m.lookup("run2", "db", "c2"), Some(0.5));
    }

    #[test]
    fn test_output_sorting_and_writers() {
        let cat = |name: &str| Category::new(name, [Identifier::intern("io-w")]);
        let mut results = vec![
            EnrichmentResult::new(&cat("low"), 2, 1.0, 0.0),
            EnrichmentResult::new(&cat("tie-small"), 2, 5.0, 0.0),
            EnrichmentResult::new(&cat("tie-large"), 4, 5.0, 0.0),
        ];
        sort_for_output(&mut results);
        let order: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, ["tie-large", "tie-small", "low"]);

        let dir = TempDir::new().unwrap();
        let json = output_path(dir.path(), "run1", "kegg", OutputFormat::Json);
        assert!(json.ends_with("run1.kegg.json"));
        write_results(&json, &results, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(parsed[0]["name"], "tie-large");
        assert!(parsed[0].get("normalized_score").is_none());

        let text = output_path(dir.path(), "run1", "kegg", OutputFormat::Text);
        write_results(&text, &results, OutputFormat::Text).unwrap();
        let content = fs::read_to_string(&text).unwrap();
        let mut rows = content.lines();
        assert_eq!(rows.next().unwrap(), TEXT_HEADER.join("\t"));
        assert!(rows.next().unwrap().starts_with("tie-large\t\t4\t5"));
    }
}
