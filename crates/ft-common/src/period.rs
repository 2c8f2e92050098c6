//! The fixed period enumeration.
//!
//! The same four values serve two roles:
//! - lookback window ("only events since one month ago")
//! - bucket granularity ("group events by calendar month")
//!
//! Anything outside `{day, week, month, year}` is rejected with
//! [`Error::InvalidPeriod`] before any event is fetched.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Format of bucket labels, also accepted back by [`Period::parse_label`].
pub const BUCKET_LABEL_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// All allowed values, shortest first.
    pub const ALL: &'static [Period] = &[Period::Day, Period::Week, Period::Month, Period::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Comma-separated list of allowed values for error messages.
    pub fn allowed() -> String {
        Period::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Truncate a timestamp to the start of its bucket (UTC).
    ///
    /// Weeks start on Monday.
    pub fn truncate(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let start = match self {
            Period::Day => date,
            Period::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Period::Month => date - Duration::days(i64::from(date.day0())),
            Period::Year => date - Duration::days(i64::from(date.ordinal0())),
        };
        Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN))
    }

    /// Earliest timestamp inside a lookback window ending at `now`.
    ///
    /// Months and years are calendar-based. Returns `None` only when the
    /// subtraction leaves chrono's representable range.
    pub fn lookback_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Day => now.checked_sub_signed(Duration::days(1)),
            Period::Week => now.checked_sub_signed(Duration::days(7)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::Year => now.checked_sub_months(Months::new(12)),
        }
    }

    /// Stable string key for a bucket start, e.g. `2025-03-01`.
    pub fn label(bucket_start: DateTime<Utc>) -> String {
        bucket_start.format(BUCKET_LABEL_FORMAT).to_string()
    }

    /// Parse a bucket label back to its start timestamp (midnight UTC).
    pub fn parse_label(label: &str) -> Result<DateTime<Utc>, Error> {
        let date = NaiveDate::parse_from_str(label.trim(), BUCKET_LABEL_FORMAT).map_err(|_| {
            Error::InvalidBucket {
                value: label.to_string(),
            }
        })?;
        Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(Error::InvalidPeriod {
                value: s.to_string(),
            }),
        }
    }
}
