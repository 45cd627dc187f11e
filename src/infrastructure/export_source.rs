// Export file source - Serves samples from a JSON health-data export
use crate::application::sample_source::{CumulativeQuery, IntervalQuery, SampleSource};
use crate::domain::calendar::{local_date, start_of_day};
use crate::domain::metric::Metric;
use crate::domain::sample::{DailySum, IntervalSample};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// A raw quantity reading, e.g. steps counted between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct QuantitySample {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthExport {
    #[serde(default = "default_authorized")]
    pub authorized: bool,
    #[serde(default)]
    pub steps: Vec<QuantitySample>,
    #[serde(default)]
    pub exercise: Vec<QuantitySample>,
    #[serde(default)]
    pub sleep: Vec<IntervalSample>,
}

fn default_authorized() -> bool {
    true
}

/// Strict-end matching: a sample counts when it ends inside `(start, end]`,
/// wherever it began.
fn ends_within(sample_end: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    sample_end > start && sample_end <= end
}

impl HealthExport {
    fn quantities(&self, metric: Metric) -> Result<&[QuantitySample]> {
        match metric {
            Metric::Steps => Ok(&self.steps),
            Metric::Exercise => Ok(&self.exercise),
            Metric::Sleep => anyhow::bail!("{} is not a cumulative metric", metric),
        }
    }

    fn intervals(&self, metric: Metric) -> Result<&[IntervalSample]> {
        match metric {
            Metric::Sleep => Ok(&self.sleep),
            Metric::Steps | Metric::Exercise => {
                anyhow::bail!("{} is not an interval metric", metric)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportFileSource {
    export: HealthExport,
    tz: Tz,
}

impl ExportFileSource {
    pub fn new(export: HealthExport, tz: Tz) -> Self {
        Self { export, tz }
    }

    pub async fn load(path: &Path, tz: Tz) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read health export {}", path.display()))?;
        let export: HealthExport = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse health export {}", path.display()))?;

        tracing::info!(
            "Loaded health export: {} step, {} exercise, {} sleep samples",
            export.steps.len(),
            export.exercise.len(),
            export.sleep.len()
        );

        Ok(Self::new(export, tz))
    }

    /// Sum quantities into calendar buckets laid out from the query anchor.
    ///
    /// Samples ending inside the window count, each in the bucket holding
    /// its start (clamped to the first bucket). Every bucket touching the
    /// window is reported, with `None` for buckets nothing fell into.
    fn daily_sums(
        &self,
        samples: &[QuantitySample],
        query: &CumulativeQuery,
    ) -> Result<Vec<DailySum>> {
        let step_days = query.interval.num_days();
        if step_days < 1 || query.interval != Duration::days(step_days) {
            anyhow::bail!(
                "bucket interval must be a whole number of days, got {}",
                query.interval
            );
        }

        let anchor_day = local_date(query.anchor, self.tz);
        let bucket_of = |instant: DateTime<Utc>| {
            (local_date(instant, self.tz) - anchor_day)
                .num_days()
                .div_euclid(step_days)
        };

        let first = bucket_of(query.start);
        let mut sums: BTreeMap<i64, f64> = BTreeMap::new();
        for sample in samples
            .iter()
            .filter(|s| ends_within(s.end, query.start, query.end))
        {
            let index = bucket_of(sample.start).max(first);
            *sums.entry(index).or_insert(0.0) += sample.value;
        }

        let bucket_start = |index: i64| -> Result<DateTime<Utc>> {
            let day = anchor_day
                .checked_add_signed(Duration::days(index * step_days))
                .context("bucket outside the supported calendar range")?;
            Ok(start_of_day(day, self.tz))
        };

        (first..=bucket_of(query.end))
            .map(|index| -> Result<DailySum> {
                Ok(DailySum::new(
                    bucket_start(index)?,
                    bucket_start(index + 1)?,
                    sums.get(&index).copied(),
                ))
            })
            .collect()
    }
}

#[async_trait]
impl SampleSource for ExportFileSource {
    async fn request_authorization(&self) -> Result<bool> {
        Ok(self.export.authorized)
    }

    async fn query_cumulative(
        &self,
        metric: Metric,
        query: &CumulativeQuery,
    ) -> Result<Vec<DailySum>> {
        let samples = self.export.quantities(metric)?;
        let sums = self.daily_sums(samples, query)?;
        tracing::debug!(
            "Bucketed {} {} samples into {} days",
            samples.len(),
            metric,
            sums.len()
        );
        Ok(sums)
    }

    async fn query_intervals(
        &self,
        metric: Metric,
        query: &IntervalQuery,
    ) -> Result<Vec<IntervalSample>> {
        let mut samples: Vec<IntervalSample> = self
            .export
            .intervals(metric)?
            .iter()
            .filter(|s| ends_within(s.end, query.start, query.end))
            .copied()
            .collect();

        samples.sort_by(|a, b| b.end.cmp(&a.end));
        samples.truncate(query.limit);
        Ok(samples)
    }
}
