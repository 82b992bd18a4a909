//! In-memory `StreakStore` for orchestrator and contract tests.
//!
//! Gated behind the `testkit` feature so production builds cannot link it.
//! Writes can be made to fail on demand (`fail_writes`) so callers can
//! exercise the persist-failure path without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use lst_schemas::{DaySnapshot, ProfileCounts};

use crate::{FetchLogEntry, StreakStore, UserRow, UserStateUpdate};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRow>,
    by_username: HashMap<String, Uuid>,
    days: HashMap<Uuid, HashMap<NaiveDate, DaySnapshot>>,
    log: Vec<FetchLogEntry>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every write method returns an error; reads keep working.
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    fn write_gate(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("simulated store write failure"));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- inspection helpers for tests --

    pub fn log_entries(&self) -> Vec<FetchLogEntry> {
        self.lock().log.clone()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn day_rows(&self, user_id: Uuid) -> Vec<DaySnapshot> {
        let inner = self.lock();
        let mut rows: Vec<DaySnapshot> = inner
            .days
            .get(&user_id)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.day.cmp(&a.day));
        rows
    }

    /// Seed a pre-existing user row directly (bypasses the write gate).
    pub fn seed_user(&self, row: UserRow) {
        let mut inner = self.lock();
        inner
            .by_username
            .insert(row.leetcode_username.clone(), row.id);
        inner.users.insert(row.id, row);
    }

    /// Seed a pre-existing day snapshot directly (bypasses the write gate).
    pub fn seed_day(&self, user_id: Uuid, snap: DaySnapshot) {
        self.lock()
            .days
            .entry(user_id)
            .or_default()
            .insert(snap.day, snap);
    }
}

#[async_trait::async_trait]
impl StreakStore for MemStore {
    async fn load_user(&self, username: &str) -> Result<Option<UserRow>> {
        let inner = self.lock();
        Ok(inner
            .by_username
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn create_user(
        &self,
        counts: &ProfileCounts,
        current_streak: i64,
        longest_streak: i64,
        fetched_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        self.write_gate()?;
        let id = Uuid::new_v4();
        let row = UserRow {
            id,
            leetcode_username: counts.username.clone(),
            display_name: Some(counts.username.clone()),
            avatar_url: counts.avatar_url.clone(),
            total_solved: counts.total_solved,
            easy_solved: counts.easy_solved,
            medium_solved: counts.medium_solved,
            hard_solved: counts.hard_solved,
            current_streak,
            longest_streak,
            last_fetched_at: Some(fetched_at),
        };
        self.seed_user(row);
        Ok(id)
    }

    async fn save_user_state(&self, user_id: Uuid, update: &UserStateUpdate) -> Result<()> {
        self.write_gate()?;
        let mut inner = self.lock();
        let row = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| anyhow!("save_user_state: unknown user {user_id}"))?;

        row.total_solved = update.total_solved;
        row.easy_solved = update.easy_solved;
        row.medium_solved = update.medium_solved;
        row.hard_solved = update.hard_solved;
        if update.avatar_url.is_some() {
            row.avatar_url = update.avatar_url.clone();
        }
        row.current_streak = update.current_streak;
        row.longest_streak = update.longest_streak;
        row.last_fetched_at = Some(update.last_fetched_at);
        Ok(())
    }

    async fn load_recent_days(&self, user_id: Uuid, window: i64) -> Result<Vec<DaySnapshot>> {
        let mut rows = self.day_rows(user_id);
        rows.truncate(usize::try_from(window).unwrap_or(0));
        Ok(rows)
    }

    async fn upsert_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        solved_delta: i64,
        cumulative_snapshot: i64,
    ) -> Result<()> {
        self.write_gate()?;
        self.seed_day(
            user_id,
            DaySnapshot {
                day,
                solved_delta,
                cumulative_snapshot,
            },
        );
        Ok(())
    }

    async fn append_fetch_log(
        &self,
        user_id: Option<Uuid>,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<()> {
        self.write_gate()?;
        self.lock().log.push(FetchLogEntry {
            user_id,
            fetch_time: Utc::now(),
            success,
            error_message: error_message.map(str::to_string),
        });
        Ok(())
    }

    async fn list_usernames(&self) -> Result<Vec<String>> {
        let inner = self.lock();
        let mut names: Vec<String> = inner.by_username.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
