// Calendar helpers shared by bucketing, sources and the custom-series parser
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Format used for day keys and custom-series dates.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Calendar day of `instant` in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// First instant of `date` in `tz`.
///
/// Midnight can be skipped by a DST transition in a few zones; the day then
/// starts one hour later.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Monday 00:00 of the ISO-8601 week containing `now`.
pub fn iso_week_anchor(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let today = local_date(now, tz);
    let back = Days::new(u64::from(today.weekday().num_days_from_monday()));
    let monday = today.checked_sub_days(back).unwrap_or(today);
    start_of_day(monday, tz)
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_start_of_day_in_offset_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(start_of_day(date, Tz::UTC), utc("2024-01-15T00:00:00Z"));
        assert_eq!(
            start_of_day(date, chrono_tz::Europe::Zagreb),
            utc("2024-01-14T23:00:00Z")
        );
    }

    #[test]
    fn test_local_date_crosses_utc_midnight() {
        let instant = utc("2024-01-14T23:30:00Z");
        assert_eq!(local_date(instant, Tz::UTC), NaiveDate::from_ymd_opt(2024, 1, 14).unwrap());
        assert_eq!(
            local_date(instant, chrono_tz::Europe::Zagreb),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_iso_week_anchor_is_monday_midnight() {
        // 2024-01-18 is a Thursday
        let anchor = iso_week_anchor(utc("2024-01-18T15:42:00Z"), Tz::UTC);
        assert_eq!(anchor, utc("2024-01-15T00:00:00Z"));

        // a Monday anchors to itself
        let anchor = iso_week_anchor(utc("2024-01-15T00:00:00Z"), Tz::UTC);
        assert_eq!(anchor, utc("2024-01-15T00:00:00Z"));

        // Sunday still belongs to the week that started the previous Monday
        let anchor = iso_week_anchor(utc("2024-01-21T23:59:59Z"), Tz::UTC);
        assert_eq!(anchor, utc("2024-01-15T00:00:00Z"));
    }

    #[test]
    fn test_format_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_day(date), "2024-03-05");
    }
}
