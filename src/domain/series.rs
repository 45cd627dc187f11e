// Series domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One aggregated value on the chart, stamped with the start of its day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: f64,
    pub date: DateTime<Utc>,
}

impl DataPoint {
    pub fn new(value: f64, date: DateTime<Utc>) -> Self {
        Self { value, date }
    }
}

pub type Series = Vec<DataPoint>;

/// A series entered by hand rather than read from the sample source.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSeries {
    pub name: String,
    pub unit: String,
    pub points: Series,
}

impl CustomSeries {
    pub fn new(name: String, unit: String, points: Series) -> Self {
        Self { name, unit, points }
    }
}

/// Read-only copy of one store entry, as handed to the chart layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub name: String,
    pub unit: Option<String>,
    pub points: Series,
}
