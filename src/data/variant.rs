//! Dataset Variant
//! The two granularities of the bike sharing dataset and their schemas.

use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DATE_COL: &str = "dteday";
pub const YEAR_COL: &str = "yr";
pub const MONTH_COL: &str = "mnth";
pub const CASUAL_COL: &str = "casual";
pub const REGISTERED_COL: &str = "registered";
pub const TOTAL_COL: &str = "cnt";

/// Which dataset is being analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    /// One record per day, grouped into years and months
    Day,
    /// One record per hour
    Hour,
}

impl Default for DatasetVariant {
    fn default() -> Self {
        DatasetVariant::Day
    }
}

impl DatasetVariant {
    pub const ALL: [DatasetVariant; 2] = [DatasetVariant::Day, DatasetVariant::Hour];

    /// Short tag used in messages ("day" / "hour").
    pub fn tag(self) -> &'static str {
        match self {
            DatasetVariant::Day => "day",
            DatasetVariant::Hour => "hour",
        }
    }

    /// Label shown in the dataset selector.
    pub fn label(self) -> &'static str {
        match self {
            DatasetVariant::Day => "Daily (day.csv)",
            DatasetVariant::Hour => "Hourly (hour.csv)",
        }
    }

    /// Columns the analysis reads. Anything else in the file is display-only.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            DatasetVariant::Day => &[
                DATE_COL,
                YEAR_COL,
                MONTH_COL,
                CASUAL_COL,
                REGISTERED_COL,
                TOTAL_COL,
            ],
            DatasetVariant::Hour => &[CASUAL_COL, REGISTERED_COL, TOTAL_COL],
        }
    }

    /// Required columns that must hold numbers (everything but the date).
    pub fn numeric_columns(self) -> impl Iterator<Item = &'static str> {
        self.required_columns()
            .iter()
            .copied()
            .filter(|name| *name != DATE_COL)
    }

    /// Whether the year x month matrix exists for this variant.
    pub fn has_monthly_matrix(self) -> bool {
        matches!(self, DatasetVariant::Day)
    }
}

/// Whether a column type can be averaged without coercing values.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
