// Raw sample records as handed over by the sample source
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pre-aggregated bucket of a cumulative metric.
///
/// `sum` is `None` when the source has no quantity for the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailySum {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub sum: Option<f64>,
}

impl DailySum {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, sum: Option<f64>) -> Self {
        Self { start, end, sum }
    }
}

/// A span of an interval metric such as sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSample {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl IntervalSample {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0 / 3600.0
    }
}

/// Samples of one metric, tagged by how they must be bucketed.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBatch {
    Cumulative(Vec<DailySum>),
    Interval(Vec<IntervalSample>),
}

impl SampleBatch {
    pub fn len(&self) -> usize {
        match self {
            SampleBatch::Cumulative(sums) => sums.len(),
            SampleBatch::Interval(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_hours_are_fractional() {
        let start: DateTime<Utc> = "2024-01-01T23:00:00Z".parse().unwrap();
        let end: DateTime<Utc> = "2024-01-02T06:30:00Z".parse().unwrap();
        assert_eq!(IntervalSample::new(start, end).hours(), 7.5);
    }
}
