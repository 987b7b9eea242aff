//! Base trips, frequency tiers and their concrete daily runs.

use std::time::Duration;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::identifiers::TrainIdentifier;
use crate::models::types::{TimeOfDay, SECONDS_PER_DAY, SECONDS_PER_HOUR};

/// The timetable a train is built from: one departure and one arrival.
///
/// If `arrival <= departure` the trip runs past midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleBase {
    pub departure: TimeOfDay,
    pub arrival: TimeOfDay,
}

impl ScheduleBase {
    pub fn new(departure: TimeOfDay, arrival: TimeOfDay) -> Self {
        Self { departure, arrival }
    }

    /// Travel time in seconds, always in `(0, 24h]`.
    pub fn duration_seconds(&self) -> u32 {
        let dep = self.departure.seconds();
        let arr = self.arrival.seconds();
        if arr <= dep {
            arr + SECONDS_PER_DAY - dep
        } else {
            arr - dep
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_seconds() as u64)
    }

    pub fn spans_midnight(&self) -> bool {
        self.arrival <= self.departure
    }
}

/// How often a base trip repeats over the day.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum FrequencyTier {
    /// Every 4 hours.
    Maximum,
    /// Every 6 hours.
    High,
    /// Every 8 hours.
    Medium,
    /// Every 12 hours.
    Standard,
    /// Once a day.
    Daily,
}

impl FrequencyTier {
    /// Hour offsets from the base departure at which the trip repeats.
    pub fn hour_offsets(self) -> &'static [u32] {
        match self {
            Self::Maximum => &[0, 4, 8, 12, 16, 20],
            Self::High => &[0, 6, 12, 18],
            Self::Medium => &[0, 8, 16],
            Self::Standard => &[0, 12],
            Self::Daily => &[0],
        }
    }

    pub fn runs_per_day(self) -> usize {
        self.hour_offsets().len()
    }
}

/// One concrete run of a base trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleInstance {
    /// 1-based position of this run within its route.
    pub ordinal: u32,
    pub departure: TimeOfDay,
    pub arrival: TimeOfDay,
    /// Hours after the base departure (expanded runs) or `None` for backfilled runs.
    pub offset_hours: Option<u32>,
}

impl ScheduleInstance {
    /// A run departing `offset_hours` after the base departure.
    pub fn at_offset(base: &ScheduleBase, offset_hours: u32, ordinal: u32) -> Self {
        let departure_abs =
            base.departure.seconds() as u64 + offset_hours as u64 * SECONDS_PER_HOUR as u64;
        Self::from_absolute(departure_abs, base.duration_seconds(), ordinal, Some(offset_hours))
    }

    /// A run departing exactly at the start of `hour`, keeping the base travel time.
    pub fn at_hour(base: &ScheduleBase, hour: usize, ordinal: u32) -> Self {
        let departure_abs = TimeOfDay::at_hour(hour).seconds() as u64;
        Self::from_absolute(departure_abs, base.duration_seconds(), ordinal, None)
    }

    // Both times are derived from the unwrapped departure, then wrapped once.
    fn from_absolute(
        departure_abs: u64,
        duration_seconds: u32,
        ordinal: u32,
        offset_hours: Option<u32>,
    ) -> Self {
        let arrival_abs = departure_abs + duration_seconds as u64;
        Self {
            ordinal,
            departure: TimeOfDay::wrapped(departure_abs),
            arrival: TimeOfDay::wrapped(arrival_abs),
            offset_hours,
        }
    }

    pub fn is_backfill(&self) -> bool {
        self.offset_hours.is_none()
    }
}

/// Lifecycle of a route's schedule. Runs are only ever appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleState {
    Proposed,
    Expanded,
    Backfilled,
}

/// All runs of one train over the day.
#[derive(Clone, Debug)]
pub struct RouteSchedule {
    pub train: TrainIdentifier,
    pub base: ScheduleBase,
    pub tier: FrequencyTier,
    pub state: ScheduleState,
    pub instances: Vec<ScheduleInstance>,
}

impl RouteSchedule {
    pub fn proposed(train: TrainIdentifier, base: ScheduleBase, tier: FrequencyTier) -> Self {
        Self {
            train,
            base,
            tier,
            state: ScheduleState::Proposed,
            instances: Vec::new(),
        }
    }

    pub fn next_ordinal(&self) -> u32 {
        self.instances.len() as u32 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(dep: &str, arr: &str) -> ScheduleBase {
        ScheduleBase::new(TimeOfDay::parse(dep).unwrap(), TimeOfDay::parse(arr).unwrap())
    }

    #[test]
    fn test_duration_same_day() {
        let b = base("06:00:00", "18:00:00");
        assert_eq!(b.duration_seconds(), 12 * 3600);
        assert!(!b.spans_midnight());
    }

    #[test]
    fn test_duration_across_midnight() {
        let b = base("23:00:00", "02:30:00");
        assert_eq!(b.duration(), Duration::from_secs(3 * 3600 + 1800));
        assert!(b.spans_midnight());
    }

    #[test]
    fn test_equal_times_is_a_full_day() {
        let b = base("08:00:00", "08:00:00");
        assert_eq!(b.duration_seconds(), SECONDS_PER_DAY);
    }

    #[test]
    fn test_tier_offsets() {
        assert_eq!(FrequencyTier::Maximum.runs_per_day(), 6);
        assert_eq!(FrequencyTier::High.hour_offsets(), &[0, 6, 12, 18]);
        assert_eq!(FrequencyTier::Medium.hour_offsets(), &[0, 8, 16]);
        assert_eq!(FrequencyTier::Daily.runs_per_day(), 1);
    }

    #[test]
    fn test_tier_names() {
        assert_eq!(FrequencyTier::Standard.to_string(), "standard");
        assert_eq!("maximum".parse::<FrequencyTier>().unwrap(), FrequencyTier::Maximum);
        assert!("hourly".parse::<FrequencyTier>().is_err());
    }

    #[test]
    fn test_instance_offset_does_not_double_wrap() {
        // 22:00 + 8h departs 06:00 next day; arrival is departure + 20h.
        let b = base("22:00:00", "18:00:00");
        let run = ScheduleInstance::at_offset(&b, 8, 2);
        assert_eq!(run.departure.to_string(), "06:00:00");
        assert_eq!(run.arrival.to_string(), "02:00:00");
        assert_eq!(run.offset_hours, Some(8));
        assert!(!run.is_backfill());
    }

    #[test]
    fn test_instance_at_hour_keeps_duration() {
        let b = base("10:15:00", "13:45:00");
        let run = ScheduleInstance::at_hour(&b, 23, 4);
        assert_eq!(run.departure.to_string(), "23:00:00");
        assert_eq!(run.arrival.to_string(), "02:30:00");
        assert!(run.is_backfill());
        assert_eq!(run.ordinal, 4);
    }
}
