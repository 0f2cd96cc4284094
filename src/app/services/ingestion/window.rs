//! Time windows for periodic ingestion jobs

use crate::error::{IngestionError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

/// Relative window preceding the moment a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeDelta {
    /// From midnight until now
    Today,
    /// The previous full hour
    OneHour,
    /// Yesterday
    OneDay,
    /// The seven days before today
    OneWeek,
    /// The previous calendar month
    OneMonth,
}

impl TimeDelta {
    pub const ALL: [TimeDelta; 5] = [
        TimeDelta::Today,
        TimeDelta::OneHour,
        TimeDelta::OneDay,
        TimeDelta::OneWeek,
        TimeDelta::OneMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeDelta::Today => "today",
            TimeDelta::OneHour => "1h",
            TimeDelta::OneDay => "1d",
            TimeDelta::OneWeek => "1w",
            TimeDelta::OneMonth => "1m",
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> Result<TimeWindow> {
        TimeWindow::from_delta(*self, now)
    }

    /// Whether publishing this window supersedes finer resources, and which.
    ///
    /// `Some(false)` prunes daily resources, `Some(true)` daily and weekly ones.
    pub fn prune_scope(&self) -> Option<bool> {
        match self {
            TimeDelta::OneWeek => Some(false),
            TimeDelta::OneMonth => Some(true),
            _ => None,
        }
    }
}

impl fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeDelta {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TimeDelta::ALL
            .into_iter()
            .find(|delta| delta.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "invalid time delta '{}' (expected one of: today, 1h, 1d, 1w, 1m)",
                    s
                )
            })
    }
}

/// Half-open interval `[after, before)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(after: DateTime<Utc>, before: DateTime<Utc>) -> Result<Self> {
        if after >= before {
            return Err(IngestionError::configuration(format!(
                "Empty time window: after {} is not before {}",
                after, before
            )));
        }
        Ok(Self { after, before })
    }

    /// Window for a relative delta evaluated at `now`
    pub fn from_delta(delta: TimeDelta, now: DateTime<Utc>) -> Result<Self> {
        let midnight = start_of_day(now.date_naive());

        let (after, before) = match delta {
            TimeDelta::Today => (midnight, now),
            TimeDelta::OneHour => {
                let hour_start = midnight + Duration::hours(i64::from(now.hour()));
                (hour_start - Duration::hours(1), hour_start)
            }
            TimeDelta::OneDay => (midnight - Duration::days(1), midnight),
            TimeDelta::OneWeek => (midnight - Duration::days(7), midnight),
            TimeDelta::OneMonth => {
                let this_month = first_of_month(now.year(), now.month())?;
                let (year, month) = if now.month() == 1 {
                    (now.year() - 1, 12)
                } else {
                    (now.year(), now.month() - 1)
                };
                (start_of_day(first_of_month(year, month)?), start_of_day(this_month))
            }
        };

        Self::new(after, before)
    }

    /// Window from explicit bounds given on the command line
    pub fn from_bounds(after: &str, before: &str) -> Result<Self> {
        Self::new(parse_instant(after)?, parse_instant(before)?)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        IngestionError::configuration(format!("Date out of range: {}-{:02}", year, month))
    })
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (UTC midnight)
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        Ok(dt.with_timezone(&Utc))
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        Ok(naive.and_utc())
    } else if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(start_of_day(date))
    } else {
        Err(IngestionError::configuration(format!(
            "Invalid date/time '{}' (expected RFC 3339 or YYYY-MM-DD)",
            value
        )))
    }
}
