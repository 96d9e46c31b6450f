//! In-game calendar dates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in one in-game day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days in one in-game year
pub const DAYS_PER_YEAR: u32 = 365;

/// An in-game date: year (from 1) and day of year (1..=365)
///
/// Ordering compares the year first, then the day. The server reports
/// players that have never synced as `0/0`, so decoding does not enforce
/// the ranges; [`YDate::ZERO`] names that sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YDate {
    pub year: u32,
    pub day: u32,
}

impl YDate {
    /// The "never synced" date the server hands out before a player's first heartbeat
    pub const ZERO: Self = Self { year: 0, day: 0 };

    /// The first day of the campaign
    pub const EPOCH: Self = Self { year: 1, day: 1 };

    /// Creates a date from raw year and day values
    pub fn new(year: u32, day: u32) -> Self {
        Self { year, day }
    }

    /// Creates a date from absolute elapsed game time in seconds
    ///
    /// Negative or non-finite times clamp to [`YDate::EPOCH`].
    pub fn from_universal_time(seconds: f64) -> Self {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Self::EPOCH;
        }
        let days = (seconds / SECONDS_PER_DAY).floor();
        let days = if days >= u32::MAX as f64 {
            u32::MAX
        } else {
            days as u32
        };
        Self {
            year: 1 + days / DAYS_PER_YEAR,
            day: 1 + days % DAYS_PER_YEAR,
        }
    }

    /// Returns true if this is the server's "never synced" sentinel
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for YDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y{}d{:03}", self.year, self.day)
    }
}
