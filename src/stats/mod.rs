//! Stats module - dataset aggregation

mod aggregator;

pub use aggregator::{AggregateError, AggregateResult, Aggregator, MonthlyMatrix};
