// Error taxonomy for refreshes and custom-series ingestion
use crate::domain::metric::Metric;
use crate::domain::range::DateRange;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The sample source refused access; nothing was cleared.
    #[error("sample source denied authorization")]
    AuthorizationDenied,

    /// A newer selection replaced this range before authorization returned.
    #[error("range {range} was replaced by a newer selection")]
    Superseded { range: DateRange },

    /// One metric's query failed; its series is left empty.
    #[error("query for {metric} failed: {source}")]
    SourceQueryFailed {
        metric: Metric,
        #[source]
        source: anyhow::Error,
    },
}

/// Rejection of a custom-series submission. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("series name must not be empty")]
    EmptyName,

    #[error("no data lines found")]
    NoRecords,

    #[error("line {line}: expected `YYYY-MM-DD,<value>`")]
    MissingSeparator { line: usize },

    #[error("line {line}: `{value}` is not a date in YYYY-MM-DD format")]
    InvalidDate { line: usize, value: String },

    #[error("line {line}: `{value}` is not a number")]
    InvalidValue { line: usize, value: String },
}
