//! UTC instants and signed intervals.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use super::Decimal;
use crate::{Error, Result};

const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Wall-clock instant, always normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(DateTime<Utc>);

impl Time {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self(dt.with_timezone(&Utc))
    }

    pub fn from_unix(seconds: i64) -> Result<Self> {
        DateTime::from_timestamp(seconds, 0)
            .map(Self)
            .ok_or_else(|| Error::InvalidTime {
                input: seconds.to_string(),
                reason: "out of range".to_string(),
            })
    }

    pub fn from_unix_millis(millis: i64) -> Result<Self> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| Error::InvalidTime {
                input: millis.to_string(),
                reason: "out of range".to_string(),
            })
    }

    /// Parse an RFC 3339 timestamp; any offset is converted to UTC.
    pub fn parse(input: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(input)
            .map(Self::from_datetime)
            .map_err(|e| Error::InvalidTime {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn unix(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn checked_add(self, duration: Duration) -> Result<Time> {
        self.0
            .checked_add_signed(duration.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "time add" })
    }

    pub fn checked_sub(self, duration: Duration) -> Result<Time> {
        self.0
            .checked_sub_signed(duration.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "time sub" })
    }

    /// Elapsed time from `earlier` to `self` (negative if `earlier` is later).
    pub fn since(self, earlier: Time) -> Duration {
        Duration(self.0 - earlier.0)
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Time {
        Self(self.0 + rhs.0)
    }
}

impl Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, rhs: Duration) -> Time {
        Self(self.0 - rhs.0)
    }
}

impl Sub for Time {
    type Output = Duration;

    fn sub(self, rhs: Time) -> Duration {
        self.since(rhs)
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl FromStr for Time {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

/// Signed elapsed interval with millisecond precision on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub struct Duration(chrono::Duration);

impl Duration {
    pub fn zero() -> Self {
        Self(chrono::Duration::zero())
    }

    pub fn from_millis(millis: i64) -> Result<Self> {
        chrono::Duration::try_milliseconds(millis)
            .map(Self)
            .ok_or(Error::Overflow { operation: "duration" })
    }

    pub fn from_secs(seconds: i64) -> Result<Self> {
        chrono::Duration::try_seconds(seconds)
            .map(Self)
            .ok_or(Error::Overflow { operation: "duration" })
    }

    pub fn minutes(minutes: i64) -> Result<Self> {
        chrono::Duration::try_minutes(minutes)
            .map(Self)
            .ok_or(Error::Overflow { operation: "duration" })
    }

    pub fn hours(hours: i64) -> Result<Self> {
        chrono::Duration::try_hours(hours)
            .map(Self)
            .ok_or(Error::Overflow { operation: "duration" })
    }

    pub fn days(days: i64) -> Result<Self> {
        chrono::Duration::try_days(days)
            .map(Self)
            .ok_or(Error::Overflow { operation: "duration" })
    }

    pub fn as_chrono(&self) -> chrono::Duration {
        self.0
    }

    pub fn num_seconds(&self) -> i64 {
        self.0.num_seconds()
    }

    pub fn num_millis(&self) -> i64 {
        self.0.num_milliseconds()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < chrono::Duration::zero()
    }

    pub fn abs(&self) -> Duration {
        Self(self.0.abs())
    }

    pub fn checked_add(self, other: Duration) -> Result<Duration> {
        self.0
            .checked_add(&other.0)
            .map(Self)
            .ok_or(Error::Overflow { operation: "duration add" })
    }

    /// Length in 365-day years, exact to the millisecond.
    pub fn as_year_fraction(&self) -> Result<Decimal> {
        let millis = Decimal::from(self.num_millis());
        millis.checked_div(Decimal::from(SECONDS_PER_YEAR * 1000))
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<chrono::Duration> for Duration {
    fn from(d: chrono::Duration) -> Self {
        Self(d)
    }
}

impl From<Duration> for i64 {
    fn from(d: Duration) -> Self {
        d.num_millis()
    }
}

impl TryFrom<i64> for Duration {
    type Error = Error;

    fn try_from(millis: i64) -> Result<Self> {
        Self::from_millis(millis)
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, rhs: Duration) -> Duration {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, rhs: Duration) -> Duration {
        Self(self.0 - rhs.0)
    }
}

/// Compact form: `1d2h3m4s`, `250ms`, `-45s`, `0s`.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0s");
        }
        if self.is_negative() {
            f.write_str("-")?;
        }
        let total_millis = self.num_millis().unsigned_abs();
        let millis = total_millis % 1000;
        let total_secs = total_millis / 1000;
        let parts = [
            (total_secs / 86_400, "d"),
            ((total_secs % 86_400) / 3600, "h"),
            ((total_secs % 3600) / 60, "m"),
            (total_secs % 60, "s"),
            (millis, "ms"),
        ];
        for (value, unit) in parts {
            if value > 0 {
                write!(f, "{value}{unit}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Time {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_normalizes_to_utc() {
        let local = t("2024-03-01T12:00:00+02:00");
        assert_eq!(local, t("2024-03-01T10:00:00Z"));
        assert_eq!(local.to_string(), "2024-03-01T10:00:00Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Time::parse("yesterday"),
            Err(Error::InvalidTime { .. })
        ));
    }

    #[test]
    fn test_unix_round_trip() {
        let time = Time::from_unix(1_700_000_000).unwrap();
        assert_eq!(time.unix(), 1_700_000_000);
        assert_eq!(
            Time::from_unix_millis(1_700_000_000_500).unwrap().unix_millis(),
            1_700_000_000_500
        );
    }

    #[test]
    fn test_arithmetic() {
        let start = t("2024-01-01T00:00:00Z");
        let later = start + Duration::hours(25).unwrap();
        assert_eq!(later, t("2024-01-02T01:00:00Z"));
        assert_eq!(later - start, Duration::hours(25).unwrap());
        assert!(start.since(later).is_negative());
        assert_eq!(later - Duration::hours(25).unwrap(), start);
    }

    #[test]
    fn test_duration_display() {
        let d = Duration::days(1).unwrap()
            + Duration::hours(2).unwrap()
            + Duration::minutes(3).unwrap()
            + Duration::from_secs(4).unwrap();
        assert_eq!(d.to_string(), "1d2h3m4s");
        assert_eq!(Duration::from_millis(250).unwrap().to_string(), "250ms");
        assert_eq!(Duration::from_secs(-45).unwrap().to_string(), "-45s");
        assert_eq!(Duration::zero().to_string(), "0s");
    }

    #[test]
    fn test_year_fraction() {
        let year = Duration::days(365).unwrap().as_year_fraction().unwrap();
        assert_eq!(year, Decimal::ONE);
        let quarter = Duration::hours(365 * 6).unwrap().as_year_fraction().unwrap();
        assert_eq!(quarter, Decimal::new(25, 2));
    }

    #[test]
    fn test_duration_serde_as_millis() {
        let d = Duration::from_secs(90).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "90000");
        let back: Duration = serde_json::from_str("90000").unwrap();
        assert_eq!(back, d);
    }
}
