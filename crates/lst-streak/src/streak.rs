//! Streak engine.
//!
//! Given the previously observed cumulative counter, a freshly fetched one,
//! and a bounded window of daily snapshots, decide whether today counts as a
//! productive day and roll the current/longest streak counters forward.
//!
//! The engine only consults the supplied window: a streak that extends past
//! the window's oldest day cannot be proven and is reported window-bounded.
//! That precision limit is part of the contract.

use chrono::NaiveDate;
use lst_schemas::DaySnapshot;

use crate::day::previous_day;

/// Inputs for one streak computation. `recent` must be ordered day-descending
/// with no duplicate days (the store contract guarantees both).
#[derive(Debug, Clone)]
pub struct StreakInputs<'a> {
    /// Cumulative counter as of the previous cycle (0 for a new identity).
    pub old_total: i64,
    /// Cumulative counter just fetched. May be below `old_total` when the
    /// upstream counter is corrected; that is never negative progress.
    pub new_total: i64,
    pub prior_current: i64,
    pub prior_longest: i64,
    pub recent: &'a [DaySnapshot],
    pub today: NaiveDate,
}

/// Result of one streak computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub solved_today: bool,
}

/// Roll streak state forward for one observation. Pure; identical inputs
/// always produce identical output.
pub fn compute_streak(inp: &StreakInputs<'_>) -> StreakUpdate {
    let solved_today = inp.new_total > inp.old_total;

    // First-ever observation for this identity.
    if inp.recent.is_empty() {
        let current = i64::from(solved_today);
        return StreakUpdate {
            current_streak: current,
            longest_streak: inp.prior_longest.max(current),
            solved_today,
        };
    }

    let current = if solved_today {
        walk_back(inp.recent, inp.today)
    } else {
        // The day is not over: an earlier cycle today may already have
        // recorded progress, in which case the streak stands unchanged.
        match snapshot_for(inp.recent, inp.today) {
            Some(s) if s.solved_delta > 0 => inp.prior_current,
            _ => 0,
        }
    };

    StreakUpdate {
        current_streak: current,
        longest_streak: inp.prior_longest.max(current),
        solved_today,
    }
}

/// Today counts as 1; extend backward one calendar day at a time while the
/// window holds a positive-delta snapshot for the expected day. The first
/// gap or zero-progress day ends the chain.
fn walk_back(recent: &[DaySnapshot], today: NaiveDate) -> i64 {
    let mut streak = 1_i64;
    let mut expected = previous_day(today);

    loop {
        match snapshot_for(recent, expected) {
            Some(s) if s.solved_delta > 0 => {
                streak += 1;
                expected = previous_day(expected);
            }
            _ => break,
        }
    }

    streak
}

fn snapshot_for(recent: &[DaySnapshot], day: NaiveDate) -> Option<&DaySnapshot> {
    recent.iter().find(|s| s.day == day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn snap(day: NaiveDate, delta: i64, cumulative: i64) -> DaySnapshot {
        DaySnapshot {
            day,
            solved_delta: delta,
            cumulative_snapshot: cumulative,
        }
    }

    /// Descending window of `n` consecutive days ending at `last`, all with
    /// positive deltas.
    fn consecutive_window(last: NaiveDate, n: usize) -> Vec<DaySnapshot> {
        let mut out = Vec::with_capacity(n);
        let mut day = last;
        for i in 0..n {
            out.push(snap(day, 1, 100 - i as i64));
            day = previous_day(day);
        }
        out
    }

    #[test]
    fn empty_history_progress_starts_streak_of_one() {
        let today = d(2025, 6, 10);
        let up = compute_streak(&StreakInputs {
            old_total: 120,
            new_total: 125,
            prior_current: 0,
            prior_longest: 3,
            recent: &[],
            today,
        });
        assert_eq!(up.current_streak, 1);
        assert_eq!(up.longest_streak, 3);
        assert!(up.solved_today);
    }

    #[test]
    fn empty_history_no_progress_stays_zero() {
        let today = d(2025, 6, 10);
        let up = compute_streak(&StreakInputs {
            old_total: 125,
            new_total: 125,
            prior_current: 0,
            prior_longest: 7,
            recent: &[],
            today,
        });
        assert_eq!(up.current_streak, 0);
        assert_eq!(up.longest_streak, 7);
        assert!(!up.solved_today);
    }

    #[test]
    fn five_prior_days_plus_today_gives_six() {
        let today = d(2025, 6, 10);
        let recent = consecutive_window(previous_day(today), 5);
        let up = compute_streak(&StreakInputs {
            old_total: 50,
            new_total: 52,
            prior_current: 5,
            prior_longest: 5,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 6);
        assert_eq!(up.longest_streak, 6);
    }

    #[test]
    fn gap_in_history_breaks_the_chain() {
        let today = d(2025, 6, 10);
        // Day -2 solved, day -1 missing: new progress today resolves to 1.
        let recent = vec![snap(d(2025, 6, 8), 3, 90)];
        let up = compute_streak(&StreakInputs {
            old_total: 90,
            new_total: 93,
            prior_current: 1,
            prior_longest: 4,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 1);
        assert_eq!(up.longest_streak, 4);
    }

    #[test]
    fn zero_delta_day_ends_the_walk() {
        let today = d(2025, 6, 10);
        let recent = vec![snap(d(2025, 6, 9), 0, 90), snap(d(2025, 6, 8), 2, 90)];
        let up = compute_streak(&StreakInputs {
            old_total: 90,
            new_total: 91,
            prior_current: 0,
            prior_longest: 2,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 1);
    }

    #[test]
    fn todays_own_snapshot_is_not_double_counted() {
        let today = d(2025, 6, 10);
        // An earlier cycle already wrote today's row; a later cycle with more
        // progress must not count today twice.
        let recent = vec![snap(today, 2, 92), snap(d(2025, 6, 9), 1, 90)];
        let up = compute_streak(&StreakInputs {
            old_total: 92,
            new_total: 94,
            prior_current: 2,
            prior_longest: 2,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 2);
    }

    #[test]
    fn no_progress_but_earlier_cycle_counted_today_preserves_streak() {
        let today = d(2025, 6, 10);
        let recent = vec![snap(today, 3, 95), snap(d(2025, 6, 9), 1, 92)];
        let up = compute_streak(&StreakInputs {
            old_total: 95,
            new_total: 95,
            prior_current: 2,
            prior_longest: 5,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 2);
        assert_eq!(up.longest_streak, 5);
        assert!(!up.solved_today);
    }

    #[test]
    fn no_progress_and_no_row_today_breaks_the_streak() {
        let today = d(2025, 6, 10);
        // Yesterday and the day before were productive, but today's row is
        // absent and the counter did not move.
        let recent = consecutive_window(previous_day(today), 2);
        let up = compute_streak(&StreakInputs {
            old_total: 125,
            new_total: 125,
            prior_current: 2,
            prior_longest: 2,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 0);
        assert_eq!(up.longest_streak, 2);
    }

    #[test]
    fn decreasing_counter_is_no_progress_not_negative_progress() {
        let today = d(2025, 6, 10);
        let recent = vec![snap(today, 4, 100), snap(d(2025, 6, 9), 1, 96)];
        let up = compute_streak(&StreakInputs {
            old_total: 100,
            new_total: 97,
            prior_current: 3,
            prior_longest: 6,
            recent: &recent,
            today,
        });
        assert!(!up.solved_today);
        // Today's earlier positive row still stands.
        assert_eq!(up.current_streak, 3);
        assert_eq!(up.longest_streak, 6);
    }

    #[test]
    fn longest_streak_is_monotonic() {
        let today = d(2025, 6, 10);
        let recent = consecutive_window(previous_day(today), 3);
        let up = compute_streak(&StreakInputs {
            old_total: 10,
            new_total: 11,
            prior_current: 3,
            prior_longest: 40,
            recent: &recent,
            today,
        });
        assert!(up.longest_streak >= 40);
        assert!(up.longest_streak >= up.current_streak);
    }

    #[test]
    fn identical_inputs_yield_identical_output() {
        let today = d(2025, 6, 10);
        let recent = consecutive_window(today, 4);
        let inputs = StreakInputs {
            old_total: 30,
            new_total: 33,
            prior_current: 4,
            prior_longest: 4,
            recent: &recent,
            today,
        };
        assert_eq!(compute_streak(&inputs), compute_streak(&inputs));
    }

    #[test]
    fn walk_is_bounded_by_the_supplied_window() {
        let today = d(2025, 6, 30);
        // 30 consecutive productive days in the window; anything older is
        // invisible, so the result is window + today.
        let recent = consecutive_window(previous_day(today), 30);
        let up = compute_streak(&StreakInputs {
            old_total: 200,
            new_total: 201,
            prior_current: 30,
            prior_longest: 45,
            recent: &recent,
            today,
        });
        assert_eq!(up.current_streak, 31);
        assert_eq!(up.longest_streak, 45);
    }
}
