use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::SystemTime;

use crate::error::{Error, Result};

/// Exclusive upper bound for retention purges.
///
/// Built from a `YYYY-MM-DD` string and normalized to midnight UTC of that
/// date. A timestamp is "before" the cutoff only if strictly less than it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CutoffDate {
    date: NaiveDate,
    instant: DateTime<Utc>,
}

impl CutoffDate {
    /// Parse a `YYYY-MM-DD` calendar date.
    pub fn parse(value: &str) -> Result<Self> {
        if !is_iso_date_shape(value) {
            return Err(Error::invalid_request(format!(
                "beforeDate must be in YYYY-MM-DD format, got \"{}\"",
                value
            )));
        }
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
            Error::invalid_request(format!("beforeDate \"{}\" is not a valid date: {}", value, e))
        })?;
        Ok(Self::from_date(date))
    }

    /// Build a cutoff from an already validated date.
    pub fn from_date(date: NaiveDate) -> Self {
        let instant = date.and_time(NaiveTime::MIN).and_utc();
        Self { date, instant }
    }

    /// The calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Midnight UTC of the date.
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Whether a timestamp falls strictly before the cutoff.
    pub fn is_expired(&self, ts: &DateTime<Utc>) -> bool {
        *ts < self.instant
    }

    /// Whether a file modification time falls strictly before the cutoff.
    pub fn is_expired_system_time(&self, ts: SystemTime) -> bool {
        DateTime::<Utc>::from(ts) < self.instant
    }
}

impl fmt::Display for CutoffDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

impl Serialize for CutoffDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// chrono alone accepts single-digit months and days.
fn is_iso_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
