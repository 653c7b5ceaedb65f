//! Time ranges over observation timestamps.
//!
//! A [`TimeRange`] has an optional inclusive `start` and an optional `stop`.
//! Textual ranges are partial ISO8601 strings (`YYYY`, `YYYY-MM`,
//! `YYYY-MM-DD`, `YYYY-MM-DDTHH`). A single textual range covers exactly one
//! unit at its finest granularity: `"2020-06"` becomes
//! `[2020-06-01T00, 2020-07-01T00)`.

use crate::error::{Result, UataqError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Range, RangeFrom, RangeFull, RangeTo};
use std::str::FromStr;
use std::sync::LazyLock;

static ISO8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>\d{4})-?(?P<month>\d{2})?-?(?P<day>\d{2})?[T\s]?(?P<hour>\d{1,2})?:?(?:\d{2})?",
    )
    .expect("ISO8601 pattern is valid")
});

/// A single time bound as supplied by a caller
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TimeObject {
    #[default]
    None,
    Naive(NaiveDateTime),
    /// Timezone-aware timestamp, stored as naive UTC
    Utc(DateTime<Utc>),
    Text(String),
}

impl From<NaiveDateTime> for TimeObject {
    fn from(value: NaiveDateTime) -> Self {
        TimeObject::Naive(value)
    }
}

impl From<NaiveDate> for TimeObject {
    fn from(value: NaiveDate) -> Self {
        TimeObject::Naive(value.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<DateTime<Utc>> for TimeObject {
    fn from(value: DateTime<Utc>) -> Self {
        TimeObject::Utc(value)
    }
}

impl From<&str> for TimeObject {
    fn from(value: &str) -> Self {
        TimeObject::Text(value.to_string())
    }
}

impl From<String> for TimeObject {
    fn from(value: String) -> Self {
        TimeObject::Text(value)
    }
}

impl<T: Into<TimeObject>> From<Option<T>> for TimeObject {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TimeObject::None)
    }
}

impl TimeObject {
    fn is_set(&self) -> bool {
        match self {
            TimeObject::None => false,
            TimeObject::Text(s) => !s.is_empty(),
            _ => true,
        }
    }
}

/// The full-range argument accepted by [`TimeRange::build`]
#[derive(Debug, Clone, PartialEq)]
pub enum TimeRangeInput {
    Text(String),
    Pair(TimeObject, TimeObject),
    Range(TimeRange),
}

impl TimeRangeInput {
    fn is_set(&self) -> bool {
        match self {
            TimeRangeInput::Text(s) => !s.is_empty(),
            TimeRangeInput::Pair(_, _) | TimeRangeInput::Range(_) => true,
        }
    }
}

/// Time range with inclusive start and (usually) exclusive stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
}

impl TimeRange {
    /// The unbounded range covering the entire observation period
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a range from either a full range or an explicit start/stop pair.
    ///
    /// Supplying both a full range and a start or stop is an error.
    pub fn build(
        time_range: Option<TimeRangeInput>,
        start: impl Into<TimeObject>,
        stop: impl Into<TimeObject>,
    ) -> Result<Self> {
        let start = start.into();
        let stop = stop.into();
        let time_range = time_range.filter(TimeRangeInput::is_set);

        if time_range.is_some() && (start.is_set() || stop.is_set()) {
            return Err(UataqError::invalid_time(
                "Cannot specify both time_range and start/stop",
            ));
        }

        match time_range {
            Some(TimeRangeInput::Range(range)) => Ok(range),
            Some(TimeRangeInput::Text(text)) => Self::parse(&text),
            Some(TimeRangeInput::Pair(start, stop)) => Self::from_bounds(start, stop),
            None => Self::from_bounds(start, stop),
        }
    }

    /// Parse a single textual range into exactly one unit of coverage
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self {
            start: Some(Self::parse_iso(text, false)?),
            stop: Some(Self::parse_iso(text, true)?),
        })
    }

    /// Build a range from separate bounds; string stops are parsed inclusively
    pub fn from_bounds(start: impl Into<TimeObject>, stop: impl Into<TimeObject>) -> Result<Self> {
        let mut range = Self::new();
        range.set_start(start)?;
        range.set_stop(stop)?;
        Ok(range)
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn stop(&self) -> Option<NaiveDateTime> {
        self.stop
    }

    pub fn bounds(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        (self.start, self.stop)
    }

    pub fn set_start(&mut self, start: impl Into<TimeObject>) -> Result<()> {
        self.start = Self::resolve(start.into(), false)?;
        Ok(())
    }

    pub fn set_stop(&mut self, stop: impl Into<TimeObject>) -> Result<()> {
        self.stop = Self::resolve(stop.into(), true)?;
        Ok(())
    }

    fn resolve(value: TimeObject, inclusive: bool) -> Result<Option<NaiveDateTime>> {
        match value {
            TimeObject::None => Ok(None),
            TimeObject::Naive(ts) => Ok(Some(ts)),
            TimeObject::Utc(ts) => Ok(Some(ts.naive_utc())),
            TimeObject::Text(s) if s.is_empty() => Ok(None),
            TimeObject::Text(s) => Self::parse_iso(&s, inclusive).map(Some),
        }
    }

    /// Length of the range in seconds; both bounds must be set
    pub fn total_seconds(&self) -> Result<f64> {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => {
                let delta = stop - start;
                Ok(match delta.num_microseconds() {
                    Some(us) => us as f64 / 1e6,
                    None => delta.num_milliseconds() as f64 / 1e3,
                })
            }
            _ => Err(UataqError::invalid_time(
                "Both start and stop times must be specified",
            )),
        }
    }

    /// Membership test treating a fully bounded range as closed `[start, stop]`.
    ///
    /// File selection and result clipping use their own boundary rules; see
    /// [`crate::filesystem::filter_datafiles`].
    pub fn contains(&self, item: &NaiveDateTime) -> bool {
        match (self.start, self.stop) {
            (None, None) => true,
            (None, Some(stop)) => *item <= stop,
            (Some(start), None) => start <= *item,
            (Some(start), Some(stop)) => start <= *item && *item <= stop,
        }
    }

    /// Parse a partial ISO8601 string.
    ///
    /// With `inclusive` the result is the start of the next unit at the
    /// finest granularity given, so `"2020"` yields `2021-01-01T00:00:00`.
    pub fn parse_iso(string: &str, inclusive: bool) -> Result<NaiveDateTime> {
        let caps = ISO8601
            .captures(string)
            .ok_or_else(|| UataqError::invalid_time(format!("Invalid time string format: {string}")))?;

        let component = |name: &str| -> Option<u32> {
            caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok())
        };

        let year = caps
            .name("year")
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .ok_or_else(|| UataqError::invalid_time(format!("Invalid time string format: {string}")))?;
        let month = component("month");
        let day = component("day");
        let hour = component("hour");

        let start = datetime(year, month.unwrap_or(1), day.unwrap_or(1), hour.unwrap_or(0))
            .ok_or_else(|| UataqError::invalid_time(format!("Invalid date in time string: {string}")))?;

        if !inclusive {
            return Ok(start);
        }

        let stop = match (month, day, hour) {
            (None, _, _) => datetime(year + 1, 1, 1, 0),
            (Some(12), None, _) => datetime(year + 1, 1, 1, 0),
            (Some(m), None, _) => datetime(year, m + 1, 1, 0),
            (Some(_), Some(_), None) => Some(start + Duration::days(1)),
            (Some(_), Some(_), Some(_)) => Some(start + Duration::hours(1)),
        };

        stop.ok_or_else(|| UataqError::invalid_time(format!("Invalid time string format: {string}")))
    }
}

fn datetime(year: i32, month: u32, day: u32, hour: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, 0, 0)
}

impl FromStr for TimeRange {
    type Err = UataqError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Range<NaiveDateTime>> for TimeRange {
    fn from(range: Range<NaiveDateTime>) -> Self {
        Self {
            start: Some(range.start),
            stop: Some(range.end),
        }
    }
}

impl From<RangeFrom<NaiveDateTime>> for TimeRange {
    fn from(range: RangeFrom<NaiveDateTime>) -> Self {
        Self {
            start: Some(range.start),
            stop: None,
        }
    }
}

impl From<RangeTo<NaiveDateTime>> for TimeRange {
    fn from(range: RangeTo<NaiveDateTime>) -> Self {
        Self {
            start: None,
            stop: Some(range.end),
        }
    }
}

impl From<RangeFull> for TimeRange {
    fn from(_: RangeFull) -> Self {
        Self::new()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.stop) {
            (None, None) => write!(f, "Entire Observation Period"),
            (None, Some(stop)) => write!(f, "Before {stop}"),
            (Some(start), None) => write!(f, "After {start}"),
            (Some(start), Some(stop)) => write!(f, "{start} to {stop}"),
        }
    }
}
