use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile counts for one identity as reported by the upstream source.
///
/// `total_solved` is the cumulative lifetime counter; the per-tier counts
/// are informational and are persisted alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCounts {
    pub username: String,
    pub total_solved: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub avatar_url: Option<String>,
}

/// Persisted streak counters for one tracked identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// One daily snapshot row: the signed delta observed for that calendar day
/// and the cumulative counter at write time. At most one per (user, day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySnapshot {
    pub day: NaiveDate,
    pub solved_delta: i64,
    pub cumulative_snapshot: i64,
}

/// Result of one completed ingestion cycle, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub user_id: Uuid,
    pub counts: ProfileCounts,
    pub solved_today: bool,
    pub solved_delta: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
}

/// Per-user outcome inside a refresh-all fan-out. Failures carry the error
/// message; they never abort the sibling cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub username: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Aggregate result of a refresh-all fan-out. Partial failure is an expected
/// state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<RefreshOutcome>,
}
