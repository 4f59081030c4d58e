//! Session-level error type
//!
//! Collects the failures a dashboard session can report to the user.

use crate::data::{LoaderError, NormalizeError};
use crate::stats::AggregateError;
use thiserror::Error;

/// Errors surfaced to the user by a session.
///
/// None of these are fatal; the session stays usable and the user can
/// retry by reselecting or reloading the dataset.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Loading the selected file failed (missing, malformed or wrong schema)
    #[error(transparent)]
    Load(#[from] LoaderError),

    /// Date parsing failed during normalization
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// Aggregation failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl DashboardError {
    /// Whether the selected input file does not exist.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, DashboardError::Load(LoaderError::MissingFile(_)))
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
