//! Calendar-day resolution against the deployment's canonical time zone.
//!
//! The tracker counts "days" in one fixed UTC offset regardless of where the
//! process runs. Host-local time is never consulted.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Canonical deployment offset: UTC+05:30 (IST), expressed in minutes.
pub const CANONICAL_OFFSET_MINUTES: i32 = 330;

/// Resolves instants to calendar-day keys in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundary {
    offset: FixedOffset,
}

impl DayBoundary {
    /// Build from an eastward offset in minutes. Returns `None` when the
    /// offset is out of chrono's valid range (beyond +/- one day).
    pub fn from_east_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    /// UTC boundary, mostly useful in tests.
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar-day key for an instant: apply the fixed offset, truncate to
    /// the date. Total over all valid instants.
    pub fn day_key(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

/// The calendar day immediately preceding `day`. Offset-independent once a
/// day key exists. Saturates at `NaiveDate::MIN`.
pub fn previous_day(day: NaiveDate) -> NaiveDate {
    day.pred_opt().unwrap_or(day)
}
