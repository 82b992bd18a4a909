//! Shared runtime state for lst-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The ingestor owns its
//! own per-user locking; nothing here is mutable at the daemon level.

use sqlx::PgPool;

use lst_db::PgStore;
use lst_ingest::Ingestor;
use lst_leetcode::LeetCodeClient;

/// Static build metadata included in health / status responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Handle shared across all Axum handlers (always behind an `Arc`).
pub struct AppState {
    pub build: BuildInfo,
    /// Kept for status probes; the ingestor holds its own store handle.
    pub pool: PgPool,
    pub ingestor: Ingestor<PgStore, LeetCodeClient>,
}

impl AppState {
    pub fn new(pool: PgPool, ingestor: Ingestor<PgStore, LeetCodeClient>) -> Self {
        Self {
            build: BuildInfo {
                service: "lst-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            pool,
            ingestor,
        }
    }
}

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}
