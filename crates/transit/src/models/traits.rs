//! Policy seams supplied by the caller.
//!
//! Route scoring and tier classification are naming conventions of a
//! particular timetable, so the core only sees them through this trait.

use crate::models::schedule::FrequencyTier;

/// Scores and classifies routes of type `R`.
///
/// Implementations must be pure: the same route always yields the same answers.
pub trait RoutePolicy<R: ?Sized>: Send + Sync {
    /// Higher is more important. Used to rank routes for selection and backfill.
    fn priority_score(&self, route: &R) -> f64;

    /// How often the route should repeat over the day.
    fn frequency_tier(&self, route: &R) -> FrequencyTier;
}

/// A policy built from two closures, mostly for tests and one-off tools.
pub struct FnPolicy<S, T> {
    score: S,
    tier: T,
}

impl<S, T> FnPolicy<S, T> {
    pub fn new(score: S, tier: T) -> Self {
        Self { score, tier }
    }
}

impl<R, S, T> RoutePolicy<R> for FnPolicy<S, T>
where
    R: ?Sized,
    S: Fn(&R) -> f64 + Send + Sync,
    T: Fn(&R) -> FrequencyTier + Send + Sync,
{
    fn priority_score(&self, route: &R) -> f64 {
        (self.score)(route)
    }

    fn frequency_tier(&self, route: &R) -> FrequencyTier {
        (self.tier)(route)
    }
}
