use std::collections::HashMap;

use ndarray::Array2;

use crate::error::{EnrichmentError, Result};

/// Raw p-values computed elsewhere, indexed by job and category name.
///
/// Rows are jobs (identified by the stem of their input file), columns are
/// categories. A column labelled `database/category` applies to that database
/// only; a bare `category` label applies to every database with a category of
/// that name. `NaN` cells mean "not available" and fall through to regular
/// significance computation.
#[derive(Debug, Clone)]
pub struct PValueMatrix {
    jobs: HashMap<String, usize>,
    categories: HashMap<String, usize>,
    values: Array2<f64>,
}

impl PValueMatrix {
    pub fn new(jobs: Vec<String>, categories: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (jobs.len(), categories.len()) {
            return Err(EnrichmentError::Numeric(format!(
                "p-value matrix is {:?} but has {} job and {} category names",
                values.dim(),
                jobs.len(),
                categories.len()
            )));
        }
        for (index, &value) in values.iter().enumerate() {
            if !value.is_nan() && !(0.0..=1.0).contains(&value) {
                return Err(EnrichmentError::InvalidPValue { index, value });
            }
        }
        Ok(PValueMatrix {
            jobs: index_names(jobs)?,
            categories: index_names(categories)?,
            values,
        })
    }

    pub fn njobs(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncategories(&self) -> usize {
        self.values.ncols()
    }

    /// The qualified `database/category` column wins over a bare `category`
    /// column.
    pub fn lookup(&self, job: &str, database: &str, category: &str) -> Option<f64> {
        let row = *self.jobs.get(job)?;
        let col = self
            .categories
            .get(&format!("{database}/{category}"))
            .or_else(|| self.categories.get(category))?;
        let value = self.values[[row, *col]];
        (!value.is_nan()).then_some(value)
    }
}

fn index_names(names: Vec<String>) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(names.len());
    for (i, name) in names.into_iter().enumerate() {
        if let Some(previous) = index.insert(name, i) {
            return Err(EnrichmentError::Numeric(format!(
                "duplicate p-value matrix label at positions {previous} and {i}"
            )));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup() {
        let m = PValueMatrix::new(
            names(&["job1", "job2"]),
            names(&["a", "b"]),
            array![[0.1, f64::NAN], [0.5, 1.0]],
        )
        .unwrap();
        assert_eq!(m.lookup("job1", "db", "a"), Some(0.1));
        assert_eq!(m.lookup("job1", "db", "b"), None);
        assert_eq!(m.lookup("job2", "db", "b"), Some(1.0));
        assert_eq!(m.lookup("job3", "db", "a"), None);
        assert_eq!((m.njobs(), m.ncategories()), (2, 2));
    }

    #[test]
    fn test_database_qualified_columns() {
        let m = PValueMatrix::new(
            names(&["job"]),
            names(&["kegg/shared", "shared", "reactome/only"]),
            array![[0.01, 0.3, 0.04]],
        )
        .unwrap();
        assert_eq!(m.lookup("job", "kegg", "shared"), Some(0.01));
        assert_eq!(m.lookup("job", "go", "shared"), Some(0.3));
        assert_eq!(m.lookup("job", "reactome", "only"), Some(0.04));
        assert_eq!(m.lookup("job", "kegg", "only"), None);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(PValueMatrix::new(names(&["j"]), names(&["a"]), array![[1.5]]).is_err());
        assert!(PValueMatrix::new(names(&["j"]), names(&["a", "b"]), array![[0.5]]).is_err());
        assert!(PValueMatrix::new(names(&["j", "j"]), names(&["a"]), array![[0.5], [0.2]]).is_err());
    }
}
