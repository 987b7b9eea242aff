//! Expand a base trip into its daily runs.

use std::time::Duration;

use crate::models::schedule::{
    FrequencyTier, RouteSchedule, ScheduleBase, ScheduleInstance, ScheduleState,
};

/// Travel time of a base trip; trips whose arrival is not after their
/// departure run past midnight and get 24 hours added.
pub fn compute_duration(base: &ScheduleBase) -> Duration {
    base.duration()
}

/// One run per hour offset of `tier`, numbered from 1.
///
/// Offsets are added to the unwrapped departure and the arrival is derived
/// from that unwrapped departure; both are wrapped into the clock only once.
pub fn expand(base: &ScheduleBase, tier: FrequencyTier) -> Vec<ScheduleInstance> {
    tier.hour_offsets()
        .iter()
        .enumerate()
        .map(|(i, &offset)| ScheduleInstance::at_offset(base, offset, i as u32 + 1))
        .collect()
}

impl RouteSchedule {
    /// Move a proposed schedule to `Expanded` by appending its tier's runs.
    ///
    /// Schedules that are already expanded are left alone.
    pub fn expand(&mut self) {
        if self.state != ScheduleState::Proposed {
            return;
        }
        let first = self.next_ordinal();
        self.instances.extend(
            expand(&self.base, self.tier)
                .into_iter()
                .map(|run| ScheduleInstance {
                    ordinal: run.ordinal + first - 1,
                    ..run
                }),
        );
        self.state = ScheduleState::Expanded;
    }
}
