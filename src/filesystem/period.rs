//! Calendar periods encoded in data file names.
//!
//! A [`Period`] is one year, month, day or hour, identified by its start
//! instant and a [`FileFreq`]. [`DateSlicer`] selects the date substring
//! from a file name using Python-style slice indices.

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static PERIOD_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>\d{4})(?:[-/]?(?P<month>\d{2})(?:[-/]?(?P<day>\d{2})(?:[-T\s]?(?P<hour>\d{2})(?::?\d{2})?)?)?)?$",
    )
    .expect("period pattern is valid")
});

/// Granularity of the period a single file covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileFreq {
    Year,
    Month,
    Day,
    Hour,
}

impl FileFreq {
    /// Short alias in the style of calendar frequency codes
    pub fn code(&self) -> &'static str {
        match self {
            FileFreq::Year => "Y",
            FileFreq::Month => "M",
            FileFreq::Day => "D",
            FileFreq::Hour => "h",
        }
    }
}

impl fmt::Display for FileFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FileFreq {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Y" | "y" | "year" | "yearly" => Ok(FileFreq::Year),
            "M" | "month" | "monthly" => Ok(FileFreq::Month),
            "D" | "d" | "day" | "daily" => Ok(FileFreq::Day),
            "h" | "H" | "hour" | "hourly" => Ok(FileFreq::Hour),
            _ => Err(format!("unknown file frequency '{s}'")),
        }
    }
}

/// One calendar period at a fixed granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    start: NaiveDateTime,
    freq: FileFreq,
}

impl Period {
    /// Period at `freq` containing `instant`
    pub fn containing(instant: NaiveDateTime, freq: FileFreq) -> Self {
        let date = instant.date();
        let start = match freq {
            FileFreq::Year => date - Days::new(u64::from(date.ordinal0())),
            FileFreq::Month => date - Days::new(u64::from(date.day0())),
            FileFreq::Day | FileFreq::Hour => date,
        }
        .and_time(NaiveTime::MIN);
        let start = match freq {
            FileFreq::Hour => start + Duration::hours(i64::from(instant.hour())),
            _ => start,
        };
        Self { start, freq }
    }

    /// Parse a date string such as `2020`, `2020-06`, `2020-06-15` or `2020-06-15-10`.
    ///
    /// Missing components default to the start of the enclosing unit; finer
    /// components than `freq` are truncated.
    pub fn parse(date_str: &str, freq: FileFreq) -> Result<Self, String> {
        let caps = PERIOD_DATE
            .captures(date_str.trim())
            .ok_or_else(|| format!("'{date_str}' is not a recognised date"))?;

        let get = |name: &str| caps.name(name).map(|m| m.as_str().parse::<u32>().unwrap_or(0));
        let year = caps
            .name("year")
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .ok_or_else(|| format!("'{date_str}' has no year"))?;
        let month = get("month").unwrap_or(1);
        let day = get("day").unwrap_or(1);
        let hour = get("hour").unwrap_or(0);

        let instant = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .ok_or_else(|| format!("'{date_str}' is not a valid calendar date"))?;

        Ok(Self::containing(instant, freq))
    }

    pub fn freq(&self) -> FileFreq {
        self.freq
    }

    /// First instant of the period
    pub fn start_time(&self) -> NaiveDateTime {
        self.start
    }

    /// First instant after the period
    pub fn end_time(&self) -> NaiveDateTime {
        match self.freq {
            FileFreq::Year => self.start + Months::new(12),
            FileFreq::Month => self.start + Months::new(1),
            FileFreq::Day => self.start + Duration::days(1),
            FileFreq::Hour => self.start + Duration::hours(1),
        }
    }

    pub fn contains(&self, instant: &NaiveDateTime) -> bool {
        self.start <= *instant && *instant < self.end_time()
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.freq.cmp(&other.freq))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.freq {
            FileFreq::Year => write!(f, "{}", self.start.format("%Y")),
            FileFreq::Month => write!(f, "{}", self.start.format("%Y-%m")),
            FileFreq::Day => write!(f, "{}", self.start.format("%Y-%m-%d")),
            FileFreq::Hour => write!(f, "{}", self.start.format("%Y-%m-%d %H:00")),
        }
    }
}

/// Python-style slice over the characters of a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSlicer {
    pub start: Option<isize>,
    pub stop: Option<isize>,
}

impl DateSlicer {
    pub const fn new(start: Option<isize>, stop: Option<isize>) -> Self {
        Self { start, stop }
    }

    /// Slice `[start..stop]` with non-negative indices
    pub const fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop))
    }

    /// Apply the slice; negative indices count from the end and
    /// out-of-range indices clamp, so a short name yields a short string.
    pub fn apply<'a>(&self, name: &'a str) -> &'a str {
        let boundaries: Vec<usize> = name
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(name.len()))
            .collect();
        let len = boundaries.len() as isize - 1;

        let resolve = |index: Option<isize>, default: isize| -> usize {
            let i = match index {
                None => default,
                Some(i) if i < 0 => len + i,
                Some(i) => i,
            };
            i.clamp(0, len) as usize
        };

        let start = resolve(self.start, 0);
        let stop = resolve(self.stop, len);
        if start >= stop {
            return "";
        }
        &name[boundaries[start]..boundaries[stop]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_monthly_period() {
        let period = Period::parse("2020-06", FileFreq::Month).unwrap();
        assert_eq!(period.start_time(), dt(2020, 6, 1, 0));
        assert_eq!(period.end_time(), dt(2020, 7, 1, 0));
        assert_eq!(period.to_string(), "2020-06");

        let december = Period::parse("2020-12", FileFreq::Month).unwrap();
        assert_eq!(december.end_time(), dt(2021, 1, 1, 0));
    }

    #[test]
    fn test_parse_truncates_to_frequency() {
        let period = Period::parse("2020-06-15", FileFreq::Month).unwrap();
        assert_eq!(period.start_time(), dt(2020, 6, 1, 0));

        let yearly = Period::parse("2020", FileFreq::Year).unwrap();
        assert_eq!(yearly.end_time(), dt(2021, 1, 1, 0));
    }

    #[test]
    fn test_parse_hourly_and_daily() {
        let hourly = Period::parse("2020-06-15-10", FileFreq::Hour).unwrap();
        assert_eq!(hourly.start_time(), dt(2020, 6, 15, 10));
        assert_eq!(hourly.end_time(), dt(2020, 6, 15, 11));
        assert!(hourly.contains(&dt(2020, 6, 15, 10)));
        assert!(!hourly.contains(&dt(2020, 6, 15, 11)));

        let daily = Period::parse("20200615", FileFreq::Day).unwrap();
        assert_eq!(daily.end_time(), dt(2020, 6, 16, 0));
    }

    #[test]
    fn test_parse_rejects_invalid_dates() {
        assert!(Period::parse("abcd-01", FileFreq::Month).is_err());
        assert!(Period::parse("2020-13", FileFreq::Month).is_err());
        assert!(Period::parse("2020-02-30", FileFreq::Day).is_err());
        assert!(Period::parse("", FileFreq::Day).is_err());
    }

    #[test]
    fn test_period_ordering() {
        let jan = Period::parse("2020-01", FileFreq::Month).unwrap();
        let feb = Period::parse("2020-02", FileFreq::Month).unwrap();
        assert!(jan < feb);
    }

    #[test]
    fn test_containing_truncates_to_period_start() {
        let instant = NaiveDate::from_ymd_opt(2020, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();

        let year = Period::containing(instant, FileFreq::Year);
        assert_eq!(year.start_time(), dt(2020, 1, 1, 0));
        assert_eq!(year.end_time(), dt(2021, 1, 1, 0));

        let month = Period::containing(instant, FileFreq::Month);
        assert_eq!(month.start_time(), dt(2020, 12, 1, 0));
        assert_eq!(month.end_time(), dt(2021, 1, 1, 0));

        let day = Period::containing(instant, FileFreq::Day);
        assert_eq!(day.start_time(), dt(2020, 12, 31, 0));
        assert_eq!(day.end_time(), dt(2021, 1, 1, 0));

        let hour = Period::containing(instant, FileFreq::Hour);
        assert_eq!(hour.start_time(), dt(2020, 12, 31, 23));
        assert_eq!(hour.end_time(), dt(2021, 1, 1, 0));
        assert!(hour.contains(&instant));
    }

    #[test]
    fn test_month_end_time_in_leap_february() {
        let feb = Period::parse("2020-02", FileFreq::Month).unwrap();
        assert_eq!(feb.end_time(), dt(2020, 3, 1, 0));
        assert!(feb.contains(&dt(2020, 2, 29, 23)));
    }

    #[test]
    fn test_file_freq_display_round_trips() {
        for freq in [FileFreq::Year, FileFreq::Month, FileFreq::Day, FileFreq::Hour] {
            assert_eq!(freq.to_string(), freq.code());
            assert_eq!(freq.to_string().parse::<FileFreq>().unwrap(), freq);
        }
    }

    #[test]
    fn test_file_freq_from_str() {
        assert_eq!("month".parse::<FileFreq>().unwrap(), FileFreq::Month);
        assert_eq!("M".parse::<FileFreq>().unwrap(), FileFreq::Month);
        assert_eq!("h".parse::<FileFreq>().unwrap(), FileFreq::Hour);
        assert_eq!("daily".parse::<FileFreq>().unwrap(), FileFreq::Day);
        assert!("fortnight".parse::<FileFreq>().is_err());
    }

    #[test]
    fn test_date_slicer() {
        let name = "2020_06_15_met.dat";
        assert_eq!(DateSlicer::range(0, 10).apply(name), "2020_06_15");
        assert_eq!(DateSlicer::new(Some(-8), Some(-4)).apply("site_2020.dat"), "2020");
        assert_eq!(DateSlicer::new(Some(5), None).apply("site_2020"), "2020");
        assert_eq!(DateSlicer::range(0, 7).apply("abc"), "abc");
        assert_eq!(DateSlicer::range(5, 2).apply(name), "");
    }
}
