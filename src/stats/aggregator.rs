//! Aggregator Module
//! Mean user counts and the year x month usage matrix.

use crate::data::variant::{
    is_numeric_dtype, CASUAL_COL, MONTH_COL, REGISTERED_COL, TOTAL_COL, YEAR_COL,
};
use crate::data::DatasetVariant;
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Column '{column}' must be numeric, found {dtype}")]
    NonNumeric { column: String, dtype: DataType },
}

/// Mean total count per (year, month) group.
///
/// Only groups that occur in the data have a cell; a missing month is
/// `None` from [`MonthlyMatrix::get`], never zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlyMatrix {
    cells: BTreeMap<(i32, u32), f64>,
}

impl MonthlyMatrix {
    pub fn insert(&mut self, year: i32, month: u32, mean: f64) {
        self.cells.insert((year, month), mean);
    }

    pub fn get(&self, year: i32, month: u32) -> Option<f64> {
        self.cells.get(&(year, month)).copied()
    }

    /// Years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.cells.keys().map(|(y, _)| *y).collect();
        years.dedup();
        years
    }

    /// (month, mean) points for one year, month ascending.
    pub fn year_series(&self, year: i32) -> Vec<(u32, f64)> {
        self.cells
            .range((year, 0)..=(year, u32::MAX))
            .map(|(&(_, m), &v)| (m, v))
            .collect()
    }

    /// All cells ordered by year, then month.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u32, f64)> + '_ {
        self.cells.iter().map(|(&(y, m), &v)| (y, m, v))
    }

    /// Largest cell value, if any.
    pub fn max_value(&self) -> Option<f64> {
        self.cells
            .values()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f64::max)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Summary statistics for one loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub variant: DatasetVariant,
    /// NaN when the dataset is empty
    pub mean_casual: f64,
    /// NaN when the dataset is empty
    pub mean_registered: f64,
    /// Present only for the daily variant
    pub monthly_matrix: Option<MonthlyMatrix>,
}

impl AggregateResult {
    pub fn has_data(&self) -> bool {
        !self.mean_casual.is_nan() && !self.mean_registered.is_nan()
    }

    /// Serializable view with NaN means mapped to `None`.
    pub fn to_summary(&self) -> AggregateSummary {
        let finite = |v: f64| if v.is_nan() { None } else { Some(v) };
        AggregateSummary {
            dataset: self.variant,
            mean_casual: finite(self.mean_casual),
            mean_registered: finite(self.mean_registered),
            monthly_usage: self.monthly_matrix.as_ref().map(|matrix| {
                matrix
                    .iter()
                    .map(|(year, month, mean_cnt)| MonthlyCell {
                        year,
                        month,
                        mean_cnt: finite(mean_cnt),
                    })
                    .collect()
            }),
        }
    }
}

/// JSON export shape of an [`AggregateResult`].
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummary {
    pub dataset: DatasetVariant,
    pub mean_casual: Option<f64>,
    pub mean_registered: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_usage: Option<Vec<MonthlyCell>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCell {
    pub year: i32,
    pub month: u32,
    pub mean_cnt: Option<f64>,
}

/// Computes dataset summaries.
pub struct Aggregator;

impl Aggregator {
    /// Aggregate a normalized dataset.
    pub fn aggregate(
        df: &DataFrame,
        variant: DatasetVariant,
    ) -> Result<AggregateResult, AggregateError> {
        let mean_casual = Self::column_mean(df, CASUAL_COL)?;
        let mean_registered = Self::column_mean(df, REGISTERED_COL)?;

        let monthly_matrix = match variant {
            DatasetVariant::Day => Some(Self::monthly_matrix(df)?),
            DatasetVariant::Hour => None,
        };

        tracing::info!(
            variant = %variant,
            rows = df.height(),
            mean_casual,
            mean_registered,
            months = monthly_matrix.as_ref().map(MonthlyMatrix::len),
            "Aggregated dataset"
        );

        Ok(AggregateResult {
            variant,
            mean_casual,
            mean_registered,
            monthly_matrix,
        })
    }

    /// Get the non-null values of a column as f64.
    pub fn get_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, AggregateError> {
        let values = Self::numeric_column(df, name)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().flatten().collect())
    }

    /// Look up a column that must hold numbers.
    ///
    /// Casting text to a number turns unparsable values into nulls, so a
    /// text column is refused here rather than silently averaged.
    fn numeric_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, AggregateError> {
        let column = df
            .column(name)
            .map_err(|_| AggregateError::MissingColumn(name.to_string()))?;
        if !is_numeric_dtype(column.dtype()) {
            return Err(AggregateError::NonNumeric {
                column: name.to_string(),
                dtype: column.dtype().clone(),
            });
        }
        Ok(column)
    }

    /// Arithmetic mean of a column. NaN for an empty column.
    fn column_mean(df: &DataFrame, name: &str) -> Result<f64, AggregateError> {
        let values = Self::get_values(df, name)?;
        Ok(values.iter().mean())
    }

    /// Group by (yr, mnth) and average cnt within each group.
    fn monthly_matrix(df: &DataFrame) -> Result<MonthlyMatrix, AggregateError> {
        for name in [YEAR_COL, MONTH_COL, TOTAL_COL] {
            Self::numeric_column(df, name)?;
        }

        let grouped = df
            .clone()
            .lazy()
            .group_by([col(YEAR_COL), col(MONTH_COL)])
            .agg([col(TOTAL_COL).cast(DataType::Float64).mean()])
            .collect()?;

        let years = grouped.column(YEAR_COL)?.cast(&DataType::Int32)?;
        let months = grouped.column(MONTH_COL)?.cast(&DataType::UInt32)?;
        let means = grouped.column(TOTAL_COL)?;

        let mut matrix = MonthlyMatrix::default();
        for ((year, month), mean) in years
            .i32()?
            .into_iter()
            .zip(months.u32()?)
            .zip(means.f64()?)
        {
            // Null keys belong to no cell; an all-null group has no mean
            if let (Some(year), Some(month), Some(mean)) = (year, month, mean) {
                matrix.insert(year, month, mean);
            }
        }

        Ok(matrix)
    }

    /// Count rows where `cnt != casual + registered`.
    ///
    /// The relation is expected to hold but is only reported, never enforced.
    pub fn count_inconsistent_totals(df: &DataFrame) -> Result<usize, AggregateError> {
        for name in [CASUAL_COL, REGISTERED_COL, TOTAL_COL] {
            Self::numeric_column(df, name)?;
        }

        let sum = col(CASUAL_COL).cast(DataType::Int64) + col(REGISTERED_COL).cast(DataType::Int64);
        let inconsistent = df
            .clone()
            .lazy()
            .filter(sum.neq(col(TOTAL_COL).cast(DataType::Int64)))
            .collect()?;

        Ok(inconsistent.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_frame() -> DataFrame {
        df!(
            "casual" => [10i64, 30],
            "registered" => [20i64, 40],
            "cnt" => [30i64, 70],
            "yr" => [0i64, 0],
            "mnth" => [1i64, 1]
        )
        .unwrap()
    }

    fn two_year_frame() -> DataFrame {
        df!(
            "casual" => [5i64, 15, 100, 7, 9, 60],
            "registered" => [50i64, 25, 400, 70, 1, 340],
            "cnt" => [55i64, 40, 500, 77, 10, 400],
            "yr" => [0i64, 0, 0, 1, 1, 1],
            "mnth" => [1i64, 1, 7, 1, 3, 3]
        )
        .unwrap()
    }

    #[test]
    fn test_two_row_scenario() {
        let result = Aggregator::aggregate(&scenario_frame(), DatasetVariant::Day).unwrap();
        assert_eq!(result.mean_casual, 20.0);
        assert_eq!(result.mean_registered, 30.0);

        let matrix = result.monthly_matrix.unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.get(0, 1), Some(50.0));
    }

    #[test]
    fn test_empty_dataset() {
        let df = df!(
            "casual" => Vec::<i64>::new(),
            "registered" => Vec::<i64>::new(),
            "cnt" => Vec::<i64>::new(),
            "yr" => Vec::<i64>::new(),
            "mnth" => Vec::<i64>::new()
        )
        .unwrap();

        let result = Aggregator::aggregate(&df, DatasetVariant::Day).unwrap();
        assert!(result.mean_casual.is_nan());
        assert!(result.mean_registered.is_nan());
        assert!(!result.has_data());
        assert!(result.monthly_matrix.unwrap().is_empty());
    }

    #[test]
    fn test_cells_match_group_means() {
        let result = Aggregator::aggregate(&two_year_frame(), DatasetVariant::Day).unwrap();
        let matrix = result.monthly_matrix.unwrap();

        assert_eq!(matrix.get(0, 1), Some(47.5));
        assert_eq!(matrix.get(0, 7), Some(500.0));
        assert_eq!(matrix.get(1, 1), Some(77.0));
        assert_eq!(matrix.get(1, 3), Some(205.0));
        assert_eq!(matrix.len(), 4);
    }

    #[test]
    fn test_missing_months_are_absent_not_zero() {
        let result = Aggregator::aggregate(&two_year_frame(), DatasetVariant::Day).unwrap();
        let matrix = result.monthly_matrix.unwrap();

        assert_eq!(matrix.get(0, 3), None);
        assert_eq!(matrix.get(1, 7), None);
        assert_eq!(matrix.get(2, 1), None);
        assert!(matrix.iter().all(|(_, _, v)| v != 0.0));
    }

    #[test]
    fn test_presentation_order() {
        let result = Aggregator::aggregate(&two_year_frame(), DatasetVariant::Day).unwrap();
        let matrix = result.monthly_matrix.unwrap();

        assert_eq!(matrix.years(), vec![0, 1]);
        assert_eq!(matrix.year_series(0), vec![(1, 47.5), (7, 500.0)]);
        let keys: Vec<(i32, u32)> = matrix.iter().map(|(y, m, _)| (y, m)).collect();
        assert_eq!(keys, vec![(0, 1), (0, 7), (1, 1), (1, 3)]);
        assert_eq!(matrix.max_value(), Some(500.0));
    }

    #[test]
    fn test_means_within_bounds() {
        let df = two_year_frame();
        let result = Aggregator::aggregate(&df, DatasetVariant::Day).unwrap();

        for (name, mean) in [
            ("casual", result.mean_casual),
            ("registered", result.mean_registered),
        ] {
            let values = Aggregator::get_values(&df, name).unwrap();
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert!(mean >= min && mean <= max, "{name} mean {mean} outside [{min}, {max}]");
        }
    }

    #[test]
    fn test_hourly_has_no_matrix() {
        let df = df!(
            "hr" => [0i64, 1, 2],
            "casual" => [3i64, 8, 4],
            "registered" => [13i64, 32, 26],
            "cnt" => [16i64, 40, 30]
        )
        .unwrap();

        let result = Aggregator::aggregate(&df, DatasetVariant::Hour).unwrap();
        assert_eq!(result.mean_casual, 5.0);
        assert!((result.mean_registered - 71.0 / 3.0).abs() < 1e-9);
        assert!(result.monthly_matrix.is_none());
    }

    #[test]
    fn test_missing_column() {
        let df = df!("casual" => [1i64]).unwrap();
        let err = Aggregator::aggregate(&df, DatasetVariant::Hour).unwrap_err();
        assert!(matches!(err, AggregateError::MissingColumn(c) if c == "registered"));
    }

    #[test]
    fn test_text_counts_are_rejected() {
        let df = df!(
            "casual" => ["10", "oops", "30"],
            "registered" => [20i64, 40, 60],
            "cnt" => [30i64, 80, 90]
        )
        .unwrap();

        let err = Aggregator::aggregate(&df, DatasetVariant::Hour).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::NonNumeric { ref column, ref dtype }
                if column == "casual" && *dtype == DataType::String
        ));
        assert!(Aggregator::count_inconsistent_totals(&df).is_err());
    }

    #[test]
    fn test_text_month_is_rejected() {
        let df = df!(
            "casual" => [1i64, 2],
            "registered" => [1i64, 2],
            "cnt" => [2i64, 4],
            "yr" => [0i64, 0],
            "mnth" => ["1", "Feb"]
        )
        .unwrap();

        let err = Aggregator::aggregate(&df, DatasetVariant::Day).unwrap_err();
        assert!(matches!(err, AggregateError::NonNumeric { ref column, .. } if column == "mnth"));
    }

    #[test]
    fn test_all_null_group_has_no_cell() {
        let df = df!(
            "casual" => [1i64, 2, 3],
            "registered" => [1i64, 2, 3],
            "cnt" => [Some(2i64), None, None],
            "yr" => [0i64, 0, 0],
            "mnth" => [1i64, 2, 2]
        )
        .unwrap();

        let matrix = Aggregator::aggregate(&df, DatasetVariant::Day)
            .unwrap()
            .monthly_matrix
            .unwrap();
        assert_eq!(matrix.get(0, 1), Some(2.0));
        assert_eq!(matrix.get(0, 2), None);
        assert!(matrix.iter().all(|(_, _, v)| !v.is_nan()));
    }

    #[test]
    fn test_inconsistent_totals() {
        let consistent = scenario_frame();
        assert_eq!(Aggregator::count_inconsistent_totals(&consistent).unwrap(), 0);

        let df = df!(
            "casual" => [1i64, 2, 3],
            "registered" => [1i64, 2, 3],
            "cnt" => [2i64, 5, 7]
        )
        .unwrap();
        assert_eq!(Aggregator::count_inconsistent_totals(&df).unwrap(), 2);
    }

    #[test]
    fn test_summary_maps_nan_to_none() {
        let result = AggregateResult {
            variant: DatasetVariant::Hour,
            mean_casual: f64::NAN,
            mean_registered: 2.5,
            monthly_matrix: None,
        };
        let json = serde_json::to_value(result.to_summary()).unwrap();
        assert_eq!(json["dataset"], "hour");
        assert!(json["mean_casual"].is_null());
        assert_eq!(json["mean_registered"], 2.5);
        assert!(json.get("monthly_usage").is_none());
    }

    #[test]
    fn test_summary_lists_cells() {
        let result = Aggregator::aggregate(&scenario_frame(), DatasetVariant::Day).unwrap();
        let json = serde_json::to_value(result.to_summary()).unwrap();
        let cells = json["monthly_usage"].as_array().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0]["year"], 0);
        assert_eq!(cells[0]["month"], 1);
        assert_eq!(cells[0]["mean_cnt"], 50.0);
    }
}
