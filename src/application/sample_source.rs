// Sample source trait for platform health data access
use crate::domain::metric::Metric;
use crate::domain::range::Window;
use crate::domain::sample::{DailySum, IntervalSample};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// Request for daily cumulative sums.
///
/// Buckets are laid out from `anchor` in steps of `interval`, independent of
/// `start`; the window only bounds which samples are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub anchor: DateTime<Utc>,
    pub interval: Duration,
}

impl CumulativeQuery {
    pub fn daily(window: &Window, anchor: DateTime<Utc>) -> Self {
        Self {
            start: window.start,
            end: window.end,
            anchor,
            interval: Duration::days(1),
        }
    }
}

/// Request for raw spans, capped at `limit` samples, most recent end first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
}

impl IntervalQuery {
    pub fn new(window: &Window, limit: usize) -> Self {
        Self {
            start: window.start,
            end: window.end,
            limit,
        }
    }
}

#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Ask for read access to every tracked metric
    async fn request_authorization(&self) -> anyhow::Result<bool>;

    /// Daily sums for a cumulative metric
    async fn query_cumulative(
        &self,
        metric: Metric,
        query: &CumulativeQuery,
    ) -> anyhow::Result<Vec<DailySum>>;

    /// Raw spans for an interval metric, unsorted from the caller's point of view
    async fn query_intervals(
        &self,
        metric: Metric,
        query: &IntervalQuery,
    ) -> anyhow::Result<Vec<IntervalSample>>;
}
