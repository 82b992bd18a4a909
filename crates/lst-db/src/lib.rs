//! lst-db
//!
//! Snapshot-store accessor: the `StreakStore` contract plus the Postgres
//! implementation. The contract is what the ingestion orchestrator programs
//! against; `MemStore` (feature `testkit`) satisfies it without a database.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use lst_schemas::{DaySnapshot, ProfileCounts};

#[cfg(feature = "testkit")]
pub mod mem;

pub const ENV_DB_URL: &str = "LST_DATABASE_URL";

/// Default bounded-history window consulted for streak recomputation.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Connect to Postgres using LST_DATABASE_URL.
pub async fn connect_from_env() -> Result<PgPool> {
    let url =
        std::env::var(ENV_DB_URL).with_context(|| format!("missing env var {ENV_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

/// Simple status query (connectivity + schema presence).
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;
    let ok = one == 1;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema='public' and table_name='users'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok,
        has_users_table: exists,
    })
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_users_table: bool,
}

// ---------------------------------------------------------------------------
// Row / update types
// ---------------------------------------------------------------------------

/// One tracked identity as persisted, with its streak counters.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub leetcode_username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub total_solved: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// Full post-ingestion state write for an existing user.
#[derive(Debug, Clone)]
pub struct UserStateUpdate {
    pub total_solved: i64,
    pub easy_solved: i64,
    pub medium_solved: i64,
    pub hard_solved: i64,
    pub avatar_url: Option<String>,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_fetched_at: DateTime<Utc>,
}

/// One append-only audit row.
#[derive(Debug, Clone)]
pub struct FetchLogEntry {
    pub user_id: Option<Uuid>,
    pub fetch_time: DateTime<Utc>,
    pub success: bool,
    pub error_message: Option<String>,
}

// ---------------------------------------------------------------------------
// StreakStore contract
// ---------------------------------------------------------------------------

/// Store contract the ingestion orchestrator depends on.
///
/// Guarantees required of every implementation:
/// - `load_recent_days` returns at most `window` rows, day-descending, one
///   row per distinct day.
/// - `upsert_day` is insert-or-replace keyed `(user_id, day)`; concurrent
///   writers for the same key resolve last-writer-wins.
/// - `append_fetch_log` is append-only; entries are never mutated.
#[async_trait::async_trait]
pub trait StreakStore: Send + Sync {
    async fn load_user(&self, username: &str) -> Result<Option<UserRow>>;

    /// Create the row for a first-ever successful ingestion. `display_name`
    /// defaults to the username.
    async fn create_user(
        &self,
        counts: &ProfileCounts,
        current_streak: i64,
        longest_streak: i64,
        fetched_at: DateTime<Utc>,
    ) -> Result<Uuid>;

    async fn save_user_state(&self, user_id: Uuid, update: &UserStateUpdate) -> Result<()>;

    async fn load_recent_days(&self, user_id: Uuid, window: i64) -> Result<Vec<DaySnapshot>>;

    async fn upsert_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        solved_delta: i64,
        cumulative_snapshot: i64,
    ) -> Result<()>;

    async fn append_fetch_log(
        &self,
        user_id: Option<Uuid>,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// All tracked usernames in stable (ascending) order, for the
    /// refresh-all fan-out.
    async fn list_usernames(&self) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl StreakStore for PgStore {
    async fn load_user(&self, username: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query(
            r#"
            select
              id,
              leetcode_username,
              display_name,
              avatar_url,
              total_solved,
              easy_solved,
              medium_solved,
              hard_solved,
              current_streak,
              longest_streak,
              last_fetched_at
            from users
            where leetcode_username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("load_user query failed")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(UserRow {
            id: row.try_get("id")?,
            leetcode_username: row.try_get("leetcode_username")?,
            display_name: row.try_get("display_name")?,
            avatar_url: row.try_get("avatar_url")?,
            total_solved: row.try_get("total_solved")?,
            easy_solved: row.try_get("easy_solved")?,
            medium_solved: row.try_get("medium_solved")?,
            hard_solved: row.try_get("hard_solved")?,
            current_streak: row.try_get("current_streak")?,
            longest_streak: row.try_get("longest_streak")?,
            last_fetched_at: row.try_get("last_fetched_at")?,
        }))
    }

    async fn create_user(
        &self,
        counts: &ProfileCounts,
        current_streak: i64,
        longest_streak: i64,
        fetched_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            insert into users (
              leetcode_username, display_name, avatar_url,
              total_solved, easy_solved, medium_solved, hard_solved,
              current_streak, longest_streak, last_fetched_at
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
            )
            returning id
            "#,
        )
        .bind(&counts.username)
        .bind(&counts.username)
        .bind(&counts.avatar_url)
        .bind(counts.total_solved)
        .bind(counts.easy_solved)
        .bind(counts.medium_solved)
        .bind(counts.hard_solved)
        .bind(current_streak)
        .bind(longest_streak)
        .bind(fetched_at)
        .fetch_one(&self.pool)
        .await
        .context("create_user failed")?;

        Ok(id)
    }

    async fn save_user_state(&self, user_id: Uuid, update: &UserStateUpdate) -> Result<()> {
        sqlx::query(
            r#"
            update users
            set total_solved = $2,
                easy_solved = $3,
                medium_solved = $4,
                hard_solved = $5,
                avatar_url = coalesce($6, avatar_url),
                current_streak = $7,
                longest_streak = $8,
                last_fetched_at = $9,
                updated_at = now()
            where id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.total_solved)
        .bind(update.easy_solved)
        .bind(update.medium_solved)
        .bind(update.hard_solved)
        .bind(&update.avatar_url)
        .bind(update.current_streak)
        .bind(update.longest_streak)
        .bind(update.last_fetched_at)
        .execute(&self.pool)
        .await
        .context("save_user_state failed")?;

        Ok(())
    }

    async fn load_recent_days(&self, user_id: Uuid, window: i64) -> Result<Vec<DaySnapshot>> {
        let rows = sqlx::query(
            r#"
            select date, problems_solved, total_solved_snapshot
            from daily_stats
            where user_id = $1
            order by date desc
            limit $2
            "#,
        )
        .bind(user_id)
        .bind(window)
        .fetch_all(&self.pool)
        .await
        .context("load_recent_days query failed")?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(DaySnapshot {
                day: r.try_get("date")?,
                solved_delta: r.try_get("problems_solved")?,
                cumulative_snapshot: r.try_get("total_solved_snapshot")?,
            });
        }
        Ok(out)
    }

    async fn upsert_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        solved_delta: i64,
        cumulative_snapshot: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            insert into daily_stats (user_id, date, problems_solved, total_solved_snapshot)
            values ($1, $2, $3, $4)
            on conflict (user_id, date) do update set
              problems_solved = excluded.problems_solved,
              total_solved_snapshot = excluded.total_solved_snapshot
            "#,
        )
        .bind(user_id)
        .bind(day)
        .bind(solved_delta)
        .bind(cumulative_snapshot)
        .execute(&self.pool)
        .await
        .context("upsert_day failed")?;

        Ok(())
    }

    async fn append_fetch_log(
        &self,
        user_id: Option<Uuid>,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            insert into fetch_log (user_id, fetch_time, success, error_message)
            values ($1, now(), $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(success)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .context("append_fetch_log failed")?;

        Ok(())
    }

    async fn list_usernames(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            select leetcode_username
            from users
            order by leetcode_username asc
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list_usernames query failed")?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(r.try_get("leetcode_username")?);
        }
        Ok(out)
    }
}
