use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Years that format as a plain four-digit `YYYY`, which is what the stored
/// snapshot format can read back.
const YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// A point on the schedule timeline, stored as a UTC instant.
///
/// Explicit start dates usually arrive as plain calendar dates (`2024-01-01`)
/// while resolved end dates carry a time component, so both are kept in the
/// same representation and compared as instants.
///
/// Values are held at millisecond precision within years 0000..=9999, so
/// [`ScheduleDate::to_iso_string`] always parses back to an equal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduleDate(DateTime<Utc>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError {
    input: String,
    reason: &'static str,
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid date '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for DateParseError {}

impl ScheduleDate {
    /// Drops sub-millisecond precision. `None` outside years 0000..=9999.
    pub fn from_datetime(value: DateTime<Utc>) -> Option<Self> {
        YEARS
            .contains(&value.year())
            .then(|| Self(value.trunc_subsecs(3)))
    }

    /// Midnight UTC of the given calendar day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).and_then(Self::from_naive_date)
    }

    pub fn from_naive_date(date: NaiveDate) -> Option<Self> {
        Self::from_datetime(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }

    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(3))
    }

    /// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) or
    /// a bare `YYYY-MM-DD` (read as UTC midnight).
    pub fn parse(input: &str) -> Result<Self, DateParseError> {
        let trimmed = input.trim();
        let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            dt.with_timezone(&Utc)
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        {
            naive.and_utc()
        } else if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            date.and_time(chrono::NaiveTime::MIN).and_utc()
        } else {
            return Err(DateParseError {
                input: input.to_string(),
                reason: "expected an ISO 8601 date",
            });
        };
        Self::from_datetime(parsed).ok_or_else(|| DateParseError {
            input: input.to_string(),
            reason: "year must be between 0000 and 9999",
        })
    }

    /// `None` when the result falls after year 9999.
    pub fn checked_add_days(self, days: u32) -> Option<Self> {
        self.0
            .checked_add_signed(Duration::days(i64::from(days)))
            .and_then(Self::from_datetime)
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn date_naive(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// `2024-01-04T00:00:00.000Z`
    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for ScheduleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl FromStr for ScheduleDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ScheduleDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for ScheduleDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dates_as_utc_midnight() {
        let date = ScheduleDate::parse("2024-01-01").unwrap();
        assert_eq!(date.to_iso_string(), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let date = ScheduleDate::parse("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(date.to_iso_string(), "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn parses_naive_datetime() {
        let date = ScheduleDate::parse("2024-03-05T10:30:00").unwrap();
        assert_eq!(date.to_iso_string(), "2024-03-05T10:30:00.000Z");
    }

    #[test]
    fn rejects_garbage() {
        assert!(ScheduleDate::parse("next tuesday").is_err());
        assert!(ScheduleDate::parse("").is_err());
    }

    #[test]
    fn rejects_years_that_do_not_format_as_four_digits() {
        assert!(ScheduleDate::parse("+12345-01-01").is_err());
        assert!(ScheduleDate::parse("-0001-06-01").is_err());
        assert!(ScheduleDate::from_ymd(12345, 1, 1).is_none());
        assert!(ScheduleDate::parse("9999-12-31").is_ok());
        assert!(ScheduleDate::parse("0000-01-01").is_ok());
    }

    #[test]
    fn keeps_millisecond_precision_only() {
        let date = ScheduleDate::parse("2024-01-01T00:00:00.000123456Z").unwrap();
        assert_eq!(date, ScheduleDate::parse("2024-01-01T00:00:00Z").unwrap());

        let date = ScheduleDate::parse("2024-01-01T10:20:30.456789Z").unwrap();
        assert_eq!(date.to_iso_string(), "2024-01-01T10:20:30.456Z");
        assert_eq!(ScheduleDate::parse(&date.to_iso_string()).unwrap(), date);

        let now = ScheduleDate::now();
        assert_eq!(ScheduleDate::parse(&now.to_iso_string()).unwrap(), now);
    }

    #[test]
    fn adding_days_stops_at_year_9999() {
        let date = ScheduleDate::from_ymd(9999, 12, 30).unwrap();
        assert!(date.checked_add_days(1).is_some());
        assert!(date.checked_add_days(2).is_none());
        assert!(date.checked_add_days(u32::MAX).is_none());
    }

    #[test]
    fn adding_days_crosses_month_boundaries() {
        let date = ScheduleDate::from_ymd(2024, 2, 27).unwrap();
        let later = date.checked_add_days(3).unwrap();
        assert_eq!(later.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn serializes_as_iso_string() {
        let date = ScheduleDate::from_ymd(2024, 1, 4).unwrap();
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, "\"2024-01-04T00:00:00.000Z\"");
        let back: ScheduleDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date);
    }
}
