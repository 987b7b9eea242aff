//! Daily repetition of base trips and hour-by-hour coverage.
//!
//! Each route moves `Proposed -> Expanded -> Backfilled`; runs are only ever
//! appended. Histograms of disjoint run sets add bucket-wise, so per-route
//! histograms can be computed on separate workers and summed at the end.

pub mod backfill;
pub mod expand;
pub mod histogram;

use std::collections::HashMap;

use crate::identifiers::TrainIdentifier;
use crate::models::schedule::{FrequencyTier, RouteSchedule, ScheduleBase};

pub use backfill::{backfill, BackfillReport, BackfillRun};
pub use expand::{compute_duration, expand};
pub use histogram::{active_hours, CoverageHistogram};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoverageConfig {
    /// Minimum active runs wanted in every clock hour.
    pub min_active: u32,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self { min_active: 15 }
    }
}

/// Coverage before and after gap filling.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoverageReport {
    pub before: CoverageHistogram,
    pub after: CoverageHistogram,
    pub gaps_before: Vec<usize>,
    pub backfill: BackfillReport,
}

impl CoverageReport {
    pub fn log_summary(&self, min_active: u32) {
        log::info!("=== Coverage ===");
        log::info!("Target: {} active trains per hour", min_active);
        log::info!(
            "Before backfill: min {}, max {}, mean {:.1}",
            self.before.min(),
            self.before.max(),
            self.before.mean()
        );
        if !self.gaps_before.is_empty() {
            log::info!("Gap hours before backfill: {:?}", self.gaps_before);
        }
        log::info!("Backfilled runs: {}", self.backfill.added.len());
        log::info!(
            "After backfill: min {}, max {}, mean {:.1}",
            self.after.min(),
            self.after.max(),
            self.after.mean()
        );
        for hour in 0..self.after.buckets().len() {
            log::debug!("  {:02}:00 | {:3} trains", hour, self.after.get(hour));
        }
        if !self.backfill.unresolved.is_empty() {
            log::warn!("Unresolved gap hours: {:?}", self.backfill.unresolved);
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CoverageScheduler {
    config: CoverageConfig,
}

impl CoverageScheduler {
    pub fn new(config: CoverageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// A schedule for `train` already expanded to `tier`.
    pub fn expand_route(
        &self,
        train: TrainIdentifier,
        base: ScheduleBase,
        tier: FrequencyTier,
    ) -> RouteSchedule {
        let mut schedule = RouteSchedule::proposed(train, base, tier);
        schedule.expand();
        schedule
    }

    /// Backfill the gaps of `baseline`, the summed histogram of `schedules`.
    pub fn close_gaps(
        &self,
        schedules: &mut [RouteSchedule],
        baseline: CoverageHistogram,
        priorities: &HashMap<TrainIdentifier, f64>,
    ) -> CoverageReport {
        let gaps_before = baseline.find_gaps(self.config.min_active);
        let mut after = baseline;
        let report = backfill(
            schedules,
            &mut after,
            &gaps_before,
            priorities,
            self.config.min_active,
        );

        CoverageReport {
            before: baseline,
            after,
            gaps_before,
            backfill: report,
        }
    }
}
