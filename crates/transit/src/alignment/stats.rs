//! Per-route alignment counters.
//!
//! Stats from different routes add together, so workers can fold them in any
//! order.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AlignmentStats {
    pub total_points: usize,
    pub aligned_points: usize,
    /// Points added by densification.
    pub synthesized_points: usize,
    pub snap_km_sum: f64,
    pub max_snap_km: f64,
}

impl AlignmentStats {
    pub fn record_aligned(&mut self, snap_km: f64) {
        self.total_points += 1;
        self.aligned_points += 1;
        self.snap_km_sum += snap_km;
        self.max_snap_km = self.max_snap_km.max(snap_km);
    }

    pub fn record_unaligned(&mut self) {
        self.total_points += 1;
    }

    pub fn unaligned_points(&self) -> usize {
        self.total_points - self.aligned_points
    }

    /// Mean snap distance over aligned points, 0 when nothing snapped.
    pub fn mean_snap_km(&self) -> f64 {
        if self.aligned_points == 0 {
            0.0
        } else {
            self.snap_km_sum / self.aligned_points as f64
        }
    }

    /// Share of points that snapped, in `[0, 1]`.
    pub fn aligned_ratio(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            self.aligned_points as f64 / self.total_points as f64
        }
    }
}

impl AddAssign for AlignmentStats {
    fn add_assign(&mut self, rhs: Self) {
        self.total_points += rhs.total_points;
        self.aligned_points += rhs.aligned_points;
        self.synthesized_points += rhs.synthesized_points;
        self.snap_km_sum += rhs.snap_km_sum;
        self.max_snap_km = self.max_snap_km.max(rhs.max_snap_km);
    }
}

impl Add for AlignmentStats {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sum for AlignmentStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
