// Bucketer - Turns raw samples into gap-free daily series
use crate::domain::calendar::{format_day, local_date, start_of_day};
use crate::domain::range::Window;
use crate::domain::sample::{DailySum, IntervalSample, SampleBatch};
use crate::domain::series::{DataPoint, Series};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::HashMap;

impl SampleBatch {
    /// Aggregate the batch into one point per day.
    ///
    /// Cumulative batches come back ascending with exactly `window.days`
    /// points. Interval batches come back descending with one point per day
    /// that has at least one span starting on it.
    pub fn bucket(&self, window: &Window, tz: Tz) -> Series {
        match self {
            SampleBatch::Cumulative(sums) => bucket_cumulative(sums, window, tz),
            SampleBatch::Interval(samples) => bucket_intervals(samples, tz),
        }
    }
}

/// One point per calendar day of the window, 0.0 where the source had no quantity.
pub fn bucket_cumulative(sums: &[DailySum], window: &Window, tz: Tz) -> Series {
    let mut by_day: HashMap<NaiveDate, f64> = HashMap::new();

    for bucket in sums {
        let value = match bucket.sum {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(v) => {
                tracing::warn!("Ignoring invalid bucket sum {} at {}", v, bucket.start);
                0.0
            }
            None => 0.0,
        };
        *by_day.entry(local_date(bucket.start, tz)).or_insert(0.0) += value;
    }

    window
        .calendar_days(tz)
        .into_iter()
        .map(|day| {
            let value = by_day.get(&day).copied().unwrap_or(0.0);
            DataPoint::new(value, start_of_day(day, tz))
        })
        .collect()
}

/// Sum span lengths in hours per start day.
///
/// A span that crosses midnight counts entirely towards the day it started on.
pub fn bucket_intervals(samples: &[IntervalSample], tz: Tz) -> Series {
    let mut by_day: HashMap<String, DataPoint> = HashMap::new();

    for sample in samples {
        if sample.end < sample.start {
            tracing::warn!(
                "Skipping interval sample ending before it starts: {} -> {}",
                sample.start,
                sample.end
            );
            continue;
        }

        let day = local_date(sample.start, tz);
        let hours = sample.hours();
        by_day
            .entry(format_day(day))
            .and_modify(|existing| {
                *existing = DataPoint::new(existing.value + hours, existing.date)
            })
            .or_insert_with(|| DataPoint::new(hours, start_of_day(day, tz)));
    }

    let mut series: Series = by_day.into_values().collect();
    series.sort_by(|a, b| b.date.cmp(&a.date));
    series
}
