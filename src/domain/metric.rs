// Metric catalogue
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the sample source reports a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Pre-summed daily totals
    Cumulative,
    /// Raw start/end spans
    Interval,
}

/// Metrics read from the platform health store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Steps,
    Sleep,
    Exercise,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Steps, Metric::Sleep, Metric::Exercise];

    /// Key under which the metric's series lives in the store.
    pub fn series_name(self) -> &'static str {
        match self {
            Metric::Steps => "Steps Taken",
            Metric::Sleep => "Hours Asleep",
            Metric::Exercise => "Minutes Exercised",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Steps => "count",
            Metric::Sleep => "hr",
            Metric::Exercise => "min",
        }
    }

    pub fn kind(self) -> SampleKind {
        match self {
            Metric::Steps | Metric::Exercise => SampleKind::Cumulative,
            Metric::Sleep => SampleKind::Interval,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Steps => write!(f, "steps"),
            Metric::Sleep => write!(f, "sleep"),
            Metric::Exercise => write!(f, "exercise"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_kinds() {
        assert_eq!(Metric::Steps.kind(), SampleKind::Cumulative);
        assert_eq!(Metric::Exercise.kind(), SampleKind::Cumulative);
        assert_eq!(Metric::Sleep.kind(), SampleKind::Interval);
    }

    #[test]
    fn test_series_names_are_distinct() {
        let mut names: Vec<_> = Metric::ALL.iter().map(|m| m.series_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Metric::ALL.len());
    }
}
