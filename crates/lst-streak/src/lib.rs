//! lst-streak
//!
//! The aggregation core: day-boundary resolution and the streak engine.
//! Everything here is pure and synchronous; callers own all I/O.

pub mod day;
pub mod streak;

pub use day::DayBoundary;
pub use streak::{compute_streak, StreakInputs, StreakUpdate};
