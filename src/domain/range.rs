// Date range and window domain model
use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::calendar::local_date;

/// Trailing number of days shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Week,
    Month,
    #[default]
    Year,
}

impl DateRange {
    pub fn days(self) -> u32 {
        match self {
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::Year => 365,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRange::Week => write!(f, "week"),
            DateRange::Month => write!(f, "month"),
            DateRange::Year => write!(f, "year"),
        }
    }
}

/// The instants a refresh covers: `[now - days, now)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: u32,
}

impl Window {
    pub fn trailing(range: DateRange, now: DateTime<Utc>) -> Self {
        Self::of_days(range.days(), now)
    }

    pub fn of_days(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
            days,
        }
    }

    /// The `days` calendar days ending with the local day of `end`, ascending.
    pub fn calendar_days(&self, tz: Tz) -> Vec<NaiveDate> {
        let last = local_date(self.end, tz);
        (0..u64::from(self.days))
            .rev()
            .filter_map(|back| last.checked_sub_days(Days::new(back)))
            .collect()
    }
}
