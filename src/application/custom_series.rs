// Custom series parser - "YYYY-MM-DD,<value>" text to a named series
use crate::domain::calendar::{DAY_FORMAT, format_day, local_date, start_of_day};
use crate::domain::series::{CustomSeries, DataPoint, Series};
use crate::error::ParseError;
use chrono::NaiveDate;
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy)]
pub struct CustomSeriesParser {
    tz: Tz,
}

impl CustomSeriesParser {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse a whole submission. Any bad line rejects everything; points keep
    /// input order. Blank lines are skipped.
    pub fn parse(&self, name: &str, unit: &str, text: &str) -> Result<CustomSeries, ParseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::EmptyName);
        }

        let points = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| self.parse_line(idx + 1, line))
            .collect::<Result<Series, ParseError>>()?;

        if points.is_empty() {
            return Err(ParseError::NoRecords);
        }

        Ok(CustomSeries::new(name.to_string(), unit.trim().to_string(), points))
    }

    fn parse_line(&self, line: usize, text: &str) -> Result<DataPoint, ParseError> {
        let (date, value) = text
            .split_once(',')
            .ok_or(ParseError::MissingSeparator { line })?;
        let (date, value) = (date.trim(), value.trim());

        let day = NaiveDate::parse_from_str(date, DAY_FORMAT).map_err(|_| ParseError::InvalidDate {
            line,
            value: date.to_string(),
        })?;

        let value = value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::InvalidValue {
                line,
                value: value.to_string(),
            })?;

        Ok(DataPoint::new(value, start_of_day(day, self.tz)))
    }
}

/// Render a series in the same line format the parser accepts.
pub fn format_series(points: &[DataPoint], tz: Tz) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", format_day(local_date(p.date, tz)), p.value))
        .collect::<Vec<_>>()
        .join("\n")
}
