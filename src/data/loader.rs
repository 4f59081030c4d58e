//! CSV Data Loader Module
//! Reads a dataset variant from disk with Polars and checks its schema.

use crate::data::variant::is_numeric_dtype;
use crate::data::DatasetVariant;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File '{}' not found. Make sure it is in the expected directory.", .0.display())]
    MissingFile(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("'{}' is missing required columns: {}", .path.display(), .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("'{}': column '{}' must be numeric but was read as {}", .path.display(), .column, .dtype)]
    NonNumeric {
        path: PathBuf,
        column: String,
        dtype: DataType,
    },
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load the CSV for `variant` from `path`.
    ///
    /// A file that does not exist is reported as [`LoaderError::MissingFile`]
    /// so the caller can tell it apart from a malformed one.
    pub fn load_csv(path: &Path, variant: DatasetVariant) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()?
            .collect()?;

        Self::check_columns(&df, path, variant)?;

        tracing::info!(
            path = %path.display(),
            variant = %variant,
            rows = df.height(),
            columns = df.width(),
            "Loaded dataset"
        );
        Ok(df)
    }

    /// Ensure every column the analysis needs is present and the count
    /// columns parsed as numbers. A stray value such as `n/a` makes the
    /// whole column text, which would otherwise drop rows from the means.
    fn check_columns(
        df: &DataFrame,
        path: &Path,
        variant: DatasetVariant,
    ) -> Result<(), LoaderError> {
        let present = Self::get_columns(df);
        let missing: Vec<String> = variant
            .required_columns()
            .iter()
            .filter(|name| !present.iter().any(|p| p == *name))
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(LoaderError::MissingColumns {
                path: path.to_path_buf(),
                columns: missing,
            });
        }

        for name in variant.numeric_columns() {
            let dtype = df.column(name)?.dtype();
            if !is_numeric_dtype(dtype) {
                return Err(LoaderError::NonNumeric {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                    dtype: dtype.clone(),
                });
            }
        }
        Ok(())
    }

    /// Get list of column names from a DataFrame.
    pub fn get_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const DAY_CSV: &str = "\
instant,dteday,season,yr,mnth,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,1,0,1,0,6,0,2,0.344167,0.363625,0.805833,0.160446,331,654,985
2,2011-01-02,1,0,1,0,0,0,2,0.363478,0.353739,0.696087,0.248539,131,670,801
";

    #[test]
    fn test_load_day_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("day.csv");
        fs::write(&path, DAY_CSV).unwrap();

        let df = DataLoader::load_csv(&path, DatasetVariant::Day).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 16);
        // Dates stay as text until normalization
        assert_eq!(df.column("dteday").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hour.csv");

        let err = DataLoader::load_csv(&path, DatasetVariant::Hour).unwrap_err();
        assert!(matches!(err, LoaderError::MissingFile(p) if p == path));
    }

    #[test]
    fn test_missing_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("day.csv");
        fs::write(&path, "dteday,casual,registered,cnt\n2011-01-01,1,2,3\n").unwrap();

        let err = DataLoader::load_csv(&path, DatasetVariant::Day).unwrap_err();
        match err {
            LoaderError::MissingColumns { columns, .. } => {
                assert_eq!(columns, vec!["yr".to_string(), "mnth".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_text_in_count_column_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hour.csv");
        fs::write(&path, "hr,casual,registered,cnt\n0,3,13,16\n1,n/a,32,40\n").unwrap();

        let err = DataLoader::load_csv(&path, DatasetVariant::Hour).unwrap_err();
        match err {
            LoaderError::NonNumeric { column, dtype, .. } => {
                assert_eq!(column, "casual");
                assert_eq!(dtype, DataType::String);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_count_cell_is_null_not_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hour.csv");
        fs::write(&path, "hr,casual,registered,cnt\n0,3,13,16\n1,,32,32\n").unwrap();

        let df = DataLoader::load_csv(&path, DatasetVariant::Hour).unwrap();
        assert_eq!(df.column("casual").unwrap().null_count(), 1);
    }

    #[test]
    fn test_hourly_schema_is_smaller() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hour.csv");
        fs::write(&path, "hr,casual,registered,cnt\n0,3,13,16\n1,8,32,40\n").unwrap();

        let df = DataLoader::load_csv(&path, DatasetVariant::Hour).unwrap();
        assert_eq!(
            DataLoader::get_columns(&df),
            vec!["hr", "casual", "registered", "cnt"]
        );
    }
}
