//! Core value types and errors.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};

pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const SECONDS_PER_DAY: u32 = 24 * SECONDS_PER_HOUR;
pub const HOURS_PER_DAY: usize = 24;

// ============================================================================
// Time of day
// ============================================================================

/// A wall-clock time, stored as seconds since midnight.
///
/// Always normalized to `[0, 24h)`. Arithmetic that may cross midnight is done
/// on plain `u64` seconds by callers and wrapped back with [`TimeOfDay::wrapped`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Substituted for departure times that are missing or cannot be parsed.
    pub const DEFAULT_DEPARTURE: TimeOfDay = TimeOfDay(6 * SECONDS_PER_HOUR);

    /// Substituted for arrival times that are missing from a record.
    pub const DEFAULT_ARRIVAL: TimeOfDay = TimeOfDay(18 * SECONDS_PER_HOUR);

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<Self> {
        if hour >= 24 || minute >= 60 || second >= 60 {
            return Err(RailError::Format(format!(
                "{hour:02}:{minute:02}:{second:02} is not a time of day"
            )));
        }
        Ok(Self(hour * SECONDS_PER_HOUR + minute * 60 + second))
    }

    /// Wrap an absolute (possibly multi-day) second count into `[0, 24h)`.
    pub fn wrapped(absolute_seconds: u64) -> Self {
        Self((absolute_seconds % SECONDS_PER_DAY as u64) as u32)
    }

    /// Parse a strict `HH:MM:SS` string.
    pub fn parse(s: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
            .map_err(|e| RailError::Format(format!("invalid time {s:?}: {e}")))?;
        Ok(Self(time.num_seconds_from_midnight()))
    }

    pub fn seconds(self) -> u32 {
        self.0
    }

    /// Clock hour, `0..24`.
    pub fn hour(self) -> usize {
        (self.0 / SECONDS_PER_HOUR) as usize
    }

    /// Start of the given clock hour (taken modulo 24).
    pub fn at_hour(hour: usize) -> Self {
        Self(((hour % HOURS_PER_DAY) as u32) * SECONDS_PER_HOUR)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / SECONDS_PER_HOUR;
        let m = (self.0 % SECONDS_PER_HOUR) / 60;
        let s = self.0 % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

impl FromStr for TimeOfDay {
    type Err = RailError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RailError {
    /// Malformed geometry or an unparsable field in a single record.
    #[error("Format error: {0}")]
    Format(String),

    /// No rail segment lies within the search radius of a point.
    #[error("No rail segment within {radius_km} km of ({lat:.5}, {lon:.5})")]
    NotFound { lat: f64, lon: f64, radius_km: f64 },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, RailError>;
