//! Greedy gap filling.
//!
//! Gap hours are visited in ascending order. While a gap is below the
//! threshold, the highest-priority route not yet used in this pass gets one
//! extra run departing exactly at the gap hour. Each route is used at most
//! once per pass, so a gap can outlast the candidates; such gaps are reported
//! as unresolved.

use std::collections::HashMap;

use crate::coverage::histogram::CoverageHistogram;
use crate::identifiers::TrainIdentifier;
use crate::models::schedule::{RouteSchedule, ScheduleInstance, ScheduleState};

/// One run added by backfilling.
#[derive(Clone, Debug, PartialEq)]
pub struct BackfillRun {
    pub train: TrainIdentifier,
    pub gap_hour: usize,
    pub run: ScheduleInstance,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackfillReport {
    pub added: Vec<BackfillRun>,
    /// Gap hours that now meet the threshold.
    pub resolved: Vec<usize>,
    /// Gap hours still below the threshold once candidates ran out.
    pub unresolved: Vec<usize>,
}

impl BackfillReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Fill `gaps` in `histogram` by appending runs to `schedules`.
///
/// Only routes with an entry in `priorities` are candidates; ties keep the
/// order of `schedules`. `histogram` is updated with every added run, so it
/// stays consistent with the schedules and no bucket ever decreases.
pub fn backfill(
    schedules: &mut [RouteSchedule],
    histogram: &mut CoverageHistogram,
    gaps: &[usize],
    priorities: &HashMap<TrainIdentifier, f64>,
    min_threshold: u32,
) -> BackfillReport {
    let mut candidates: Vec<(usize, f64)> = schedules
        .iter()
        .enumerate()
        .filter_map(|(i, s)| priorities.get(&s.train).map(|&p| (i, p)))
        .collect();
    // Stable: equal priorities keep their input order.
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    let mut candidates = candidates.into_iter().map(|(i, _)| i);

    let mut gaps = gaps.to_vec();
    gaps.sort_unstable();
    gaps.dedup();

    let mut report = BackfillReport::default();

    for gap in gaps {
        while histogram.get(gap) < min_threshold {
            let Some(i) = candidates.next() else {
                break;
            };
            let schedule = &mut schedules[i];
            let run = ScheduleInstance::at_hour(&schedule.base, gap, schedule.next_ordinal());

            histogram.add_run(&run);
            schedule.instances.push(run);
            schedule.state = ScheduleState::Backfilled;

            log::debug!(
                "Backfilled hour {:02} with train {} ({} -> {})",
                gap,
                schedule.train,
                run.departure,
                run.arrival
            );
            report.added.push(BackfillRun {
                train: schedule.train.clone(),
                gap_hour: gap,
                run,
            });
        }

        if histogram.get(gap) >= min_threshold {
            report.resolved.push(gap);
        } else {
            log::warn!(
                "Hour {:02} left at {} active trains (target {}): no routes left to backfill",
                gap,
                histogram.get(gap),
                min_threshold
            );
            report.unresolved.push(gap);
        }
    }

    report
}
