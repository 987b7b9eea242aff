//! Schedule models, value types and policy traits.

pub mod schedule;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use schedule::{FrequencyTier, RouteSchedule, ScheduleBase, ScheduleInstance, ScheduleState};
pub use traits::{FnPolicy, RoutePolicy};
pub use types::{RailError, Result, TimeOfDay, HOURS_PER_DAY, SECONDS_PER_DAY, SECONDS_PER_HOUR};
