//! lst-ingest
//!
//! Ingestion orchestrator: drives one fetch cycle per user through
//! `Fetching -> Computing -> Persisting -> Logged`, serializes cycles per
//! user, and fans out refresh-all over every tracked identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use lst_db::{StreakStore, UserStateUpdate};
use lst_leetcode::{FetchError, ProfileSource};
use lst_schemas::{IngestReport, RefreshOutcome, RefreshSummary};
use lst_streak::{compute_streak, DayBoundary, StreakInputs};

/// Upper bound on concurrently running cycles inside a refresh-all fan-out.
/// Cycles for the *same* user are always serialized regardless.
pub const REFRESH_CONCURRENCY: usize = 8;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Failure kinds of one ingestion cycle. `Fetch` and `Persist` are distinct
/// so callers can pick a retry policy: a persist failure means the fetch
/// already succeeded and only the store step needs repeating.
#[derive(Debug)]
pub enum IngestError {
    /// Missing or blank identity parameter; rejected before any I/O.
    Validation(String),
    /// External source unreachable, undecodable, or identity unmatched.
    /// Streak state is untouched.
    Fetch(FetchError),
    /// A store interaction failed after a successful fetch.
    Persist(anyhow::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Validation(msg) => write!(f, "validation error: {msg}"),
            IngestError::Fetch(e) => write!(f, "{e}"),
            IngestError::Persist(e) => write!(f, "persist error: {e:#}"),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Validation(_) => None,
            IngestError::Fetch(e) => Some(e),
            IngestError::Persist(e) => Some(e.as_ref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

/// Explicit construction-time configuration: day boundary and history window.
/// The store and source handles arrive as values too; there is no ambient or
/// process-global state.
#[derive(Debug, Clone, Copy)]
pub struct IngestorConfig {
    pub day_boundary: DayBoundary,
    pub window_days: i64,
}

impl IngestorConfig {
    pub fn new(day_boundary: DayBoundary) -> Self {
        Self {
            day_boundary,
            window_days: lst_db::DEFAULT_WINDOW_DAYS,
        }
    }
}

pub struct Ingestor<S, P> {
    store: S,
    source: P,
    cfg: IngestorConfig,
    /// Per-username single-flight locks; one cycle per user at a time.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: StreakStore, P: ProfileSource> Ingestor<S, P> {
    pub fn new(store: S, source: P, cfg: IngestorConfig) -> Self {
        Self {
            store,
            source,
            cfg,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one full ingestion cycle for `username`.
    pub async fn ingest_user(&self, username: &str) -> Result<IngestReport, IngestError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(IngestError::Validation(
                "username must be a non-empty string".to_string(),
            ));
        }

        let lock = self.user_lock(username).await;
        let _serialized = lock.lock().await;
        self.run_cycle(username).await
    }

    /// One cycle for every tracked username, at most [`REFRESH_CONCURRENCY`]
    /// in flight. Individual failures land in their outcome row and never
    /// cancel sibling cycles.
    pub async fn refresh_all(&self) -> Result<RefreshSummary, IngestError> {
        let usernames = self
            .store
            .list_usernames()
            .await
            .map_err(IngestError::Persist)?;
        let total = usernames.len();

        let mut outcomes: Vec<RefreshOutcome> = stream::iter(usernames)
            .map(|username| async move {
                match self.ingest_user(&username).await {
                    Ok(_) => RefreshOutcome {
                        username,
                        success: true,
                        error: None,
                    },
                    Err(e) => {
                        warn!(%username, "refresh-all cycle failed: {e}");
                        RefreshOutcome {
                            username,
                            success: false,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .buffer_unordered(REFRESH_CONCURRENCY)
            .collect()
            .await;

        // Completion order is nondeterministic; report in stable order.
        outcomes.sort_by(|a, b| a.username.cmp(&b.username));

        let succeeded = outcomes.iter().filter(|o| o.success).count();
        Ok(RefreshSummary {
            total,
            succeeded,
            failed: total - succeeded,
            outcomes,
        })
    }

    async fn user_lock(&self, username: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(username.to_string())
            .or_insert_with(Default::default)
            .clone()
    }

    /// The cycle proper: Fetching -> Computing -> Persisting -> Logged.
    async fn run_cycle(&self, username: &str) -> Result<IngestReport, IngestError> {
        // Fetching. Failure here never touches streak state.
        let counts = match self.source.fetch_profile(username).await {
            Ok(c) => c,
            Err(e) => {
                self.log_failure(None, &format!("fetch failed for {username}: {e}"))
                    .await;
                return Err(IngestError::Fetch(e));
            }
        };

        // Computing. The fetch succeeded; store failures from here on are
        // persist-side and reported as such.
        let existing = match self.store.load_user(username).await {
            Ok(v) => v,
            Err(e) => return self.fail_persist(None, e).await,
        };

        let now = Utc::now();
        let today = self.cfg.day_boundary.day_key(now);

        let (old_total, prior_current, prior_longest, recent) = match &existing {
            Some(user) => {
                let recent = match self
                    .store
                    .load_recent_days(user.id, self.cfg.window_days)
                    .await
                {
                    Ok(r) => r,
                    Err(e) => return self.fail_persist(Some(user.id), e).await,
                };
                (
                    user.total_solved,
                    user.current_streak,
                    user.longest_streak,
                    recent,
                )
            }
            None => (0, 0, 0, Vec::new()),
        };

        let update = compute_streak(&StreakInputs {
            old_total,
            new_total: counts.total_solved,
            prior_current,
            prior_longest,
            recent: &recent,
            today,
        });
        let solved_delta = counts.total_solved - old_total;

        // Persisting.
        let user_id = match &existing {
            Some(user) => {
                let state = UserStateUpdate {
                    total_solved: counts.total_solved,
                    easy_solved: counts.easy_solved,
                    medium_solved: counts.medium_solved,
                    hard_solved: counts.hard_solved,
                    avatar_url: counts.avatar_url.clone(),
                    current_streak: update.current_streak,
                    longest_streak: update.longest_streak,
                    last_fetched_at: now,
                };
                if let Err(e) = self.store.save_user_state(user.id, &state).await {
                    return self.fail_persist(Some(user.id), e).await;
                }
                user.id
            }
            None => {
                match self
                    .store
                    .create_user(&counts, update.current_streak, update.longest_streak, now)
                    .await
                {
                    Ok(id) => id,
                    Err(e) => return self.fail_persist(None, e).await,
                }
            }
        };

        if let Err(e) = self
            .store
            .upsert_day(user_id, today, solved_delta, counts.total_solved)
            .await
        {
            return self.fail_persist(Some(user_id), e).await;
        }

        // Logged.
        if let Err(e) = self.store.append_fetch_log(Some(user_id), true, None).await {
            return Err(IngestError::Persist(e.context("success audit entry failed")));
        }

        info!(
            username,
            source = self.source.source_name(),
            current_streak = update.current_streak,
            longest_streak = update.longest_streak,
            solved_delta,
            "ingest cycle complete"
        );

        Ok(IngestReport {
            user_id,
            solved_today: update.solved_today,
            solved_delta,
            current_streak: update.current_streak,
            longest_streak: update.longest_streak,
            counts,
        })
    }

    async fn fail_persist(
        &self,
        user_id: Option<Uuid>,
        err: anyhow::Error,
    ) -> Result<IngestReport, IngestError> {
        self.log_failure(user_id, &format!("persist failed: {err:#}"))
            .await;
        Err(IngestError::Persist(err))
    }

    /// Best-effort failure audit entry; a failing log write must not mask
    /// the original error.
    async fn log_failure(&self, user_id: Option<Uuid>, msg: &str) {
        if let Err(log_err) = self.store.append_fetch_log(user_id, false, Some(msg)).await {
            warn!("audit entry for failed cycle could not be written: {log_err:#}");
        }
    }
}
