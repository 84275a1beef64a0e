//! Timestamp type and clock abstraction.
//!
//! Timestamps are Unix epoch seconds (UTC). Calendar conversions go through
//! `chrono` so period keys and date-range filters agree on day boundaries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        Self(Utc::now().timestamp().max(0) as u64)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Parse an RFC 3339 timestamp as emitted by chain REST APIs
    /// (`2024-05-10T14:22:33.123456789Z`).
    pub fn parse_rfc3339(s: &str) -> Result<Self, TypesError> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| TypesError::InvalidTimestamp(format!("{s}: {e}")))?;
        Ok(Self(parsed.timestamp().max(0) as u64))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// The UTC calendar date containing this timestamp.
    pub fn date(&self) -> NaiveDate {
        self.to_datetime()
            .map(|dt| dt.date_naive())
            .unwrap_or(NaiveDate::MIN)
    }

    /// Timestamp of 00:00:00 UTC on `date`.
    pub fn start_of(date: NaiveDate) -> Self {
        let secs = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        Self(secs.max(0) as u64)
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whole days from `now` until this timestamp, rounded down.
    pub fn days_after(&self, now: Timestamp) -> u64 {
        self.0.saturating_sub(now.0) / 86_400
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
