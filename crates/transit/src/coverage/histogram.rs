//! Hour-by-hour count of active runs.
//!
//! A run is active in every clock hour from its departure hour through its
//! arrival hour, inclusive. When the arrival hour is earlier than the
//! departure hour the span wraps: `[dep, 23]` plus `[0, arr]`. A run that
//! departs and arrives in the same clock hour is active in that hour only.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::models::schedule::ScheduleInstance;
use crate::models::types::HOURS_PER_DAY;

/// Clock hours during which `run` is active, in clock order starting at departure.
pub fn active_hours(run: &ScheduleInstance) -> impl Iterator<Item = usize> {
    let dep = run.departure.hour();
    let arr = run.arrival.hour();

    let (first, wrapped) = if arr >= dep {
        (dep..arr + 1, 0..0)
    } else {
        (dep..HOURS_PER_DAY, 0..arr + 1)
    };
    first.chain(wrapped)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CoverageHistogram {
    buckets: [u32; HOURS_PER_DAY],
}

impl CoverageHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buckets(buckets: [u32; HOURS_PER_DAY]) -> Self {
        Self { buckets }
    }

    /// Histogram of a set of runs.
    pub fn compute<'a>(runs: impl IntoIterator<Item = &'a ScheduleInstance>) -> Self {
        let mut histogram = Self::new();
        for run in runs {
            histogram.add_run(run);
        }
        histogram
    }

    pub fn add_run(&mut self, run: &ScheduleInstance) {
        for hour in active_hours(run) {
            self.buckets[hour] += 1;
        }
    }

    pub fn buckets(&self) -> &[u32; HOURS_PER_DAY] {
        &self.buckets
    }

    /// Count for `hour` (taken modulo 24).
    pub fn get(&self, hour: usize) -> u32 {
        self.buckets[hour % HOURS_PER_DAY]
    }

    /// Hours below `min_threshold`, ascending.
    pub fn find_gaps(&self, min_threshold: u32) -> Vec<usize> {
        (0..HOURS_PER_DAY)
            .filter(|&h| self.buckets[h] < min_threshold)
            .collect()
    }

    pub fn min(&self) -> u32 {
        self.buckets.iter().copied().min().unwrap_or(0)
    }

    pub fn max(&self) -> u32 {
        self.buckets.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|&b| b as u64).sum()
    }

    pub fn mean(&self) -> f64 {
        self.total() as f64 / HOURS_PER_DAY as f64
    }

    /// Whether every hour has at least `min_threshold` active runs.
    pub fn is_covered(&self, min_threshold: u32) -> bool {
        self.min() >= min_threshold
    }
}

impl AddAssign for CoverageHistogram {
    fn add_assign(&mut self, rhs: Self) {
        for (bucket, other) in self.buckets.iter_mut().zip(rhs.buckets) {
            *bucket += other;
        }
    }
}

impl Add for CoverageHistogram {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for CoverageHistogram {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
