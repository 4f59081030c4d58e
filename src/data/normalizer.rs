//! Data Normalizer Module
//! Turns a freshly loaded dataset into an analysis-ready one.

use crate::data::variant::DATE_COL;
use crate::data::DatasetVariant;
use polars::prelude::*;
use thiserror::Error;

/// Date layout used by both bike sharing files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Cannot parse '{value}' in column '{column}' as a date (expected YYYY-MM-DD)")]
    Parse { column: String, value: String },
    #[error("Column '{column}' has type {dtype}, expected text or date")]
    UnexpectedType { column: String, dtype: DataType },
}

/// Pure transforms applied between loading and aggregation.
pub struct DataNormalizer;

impl DataNormalizer {
    /// Normalize a dataset for `variant`.
    ///
    /// Daily data gets its `dteday` column parsed into a `Date` column;
    /// running it again on the output is a no-op. Hourly data is returned
    /// unchanged.
    pub fn normalize(df: &DataFrame, variant: DatasetVariant) -> Result<DataFrame, NormalizeError> {
        match variant {
            DatasetVariant::Day => Self::parse_date_column(df, DATE_COL),
            DatasetVariant::Hour => Ok(df.clone()),
        }
    }

    /// Parse a text column into dates. Every non-null value must parse.
    fn parse_date_column(df: &DataFrame, name: &str) -> Result<DataFrame, NormalizeError> {
        let column = df
            .column(name)
            .map_err(|_| NormalizeError::MissingColumn(name.to_string()))?;

        match column.dtype() {
            DataType::Date => return Ok(df.clone()),
            DataType::String => {}
            other => {
                return Err(NormalizeError::UnexpectedType {
                    column: name.to_string(),
                    dtype: other.clone(),
                })
            }
        }

        let raw = column.str()?;
        let parsed = raw.as_date(Some(DATE_FORMAT), false)?.into_series();

        // Non-strict parsing nulls out failures; find the first one
        for (idx, value) in raw.into_iter().enumerate() {
            if let Some(value) = value {
                if parsed.get(idx)?.is_null() {
                    return Err(NormalizeError::Parse {
                        column: name.to_string(),
                        value: value.to_string(),
                    });
                }
            }
        }

        let mut out = df.clone();
        out.with_column(parsed)?;

        tracing::debug!(column = name, rows = out.height(), "Parsed date column");
        Ok(out)
    }
}
