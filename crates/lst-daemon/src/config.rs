//! Env-var configuration for the daemon.
//!
//! All knobs resolve to an explicit `DaemonConfig` value at startup; nothing
//! reads the environment after boot.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};

use lst_streak::day::{DayBoundary, CANONICAL_OFFSET_MINUTES};

pub const ENV_DAEMON_ADDR: &str = "LST_DAEMON_ADDR";
pub const ENV_DAY_OFFSET_MINUTES: &str = "LST_DAY_OFFSET_MINUTES";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "LST_FETCH_TIMEOUT_SECS";
pub const ENV_LEETCODE_BASE_URL: &str = "LST_LEETCODE_BASE_URL";

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 8787);
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub bind_addr: SocketAddr,
    /// Eastward offset (minutes) defining the canonical calendar day.
    pub day_offset_minutes: i32,
    /// Per-request timeout on the outbound profile fetch.
    pub fetch_timeout: Duration,
    pub leetcode_base_url: String,
}

impl DaemonConfig {
    /// Resolve config from the environment. Unset vars fall back to
    /// defaults; set-but-invalid vars are an error, not a silent fallback.
    pub fn from_env() -> Result<Self> {
        let bind_addr = match std::env::var(ENV_DAEMON_ADDR) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {ENV_DAEMON_ADDR}: {raw}"))?,
            Err(_) => SocketAddr::from(DEFAULT_BIND),
        };

        let day_offset_minutes = match std::env::var(ENV_DAY_OFFSET_MINUTES) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {ENV_DAY_OFFSET_MINUTES}: {raw}"))?,
            Err(_) => CANONICAL_OFFSET_MINUTES,
        };

        let fetch_timeout_secs: u64 = match std::env::var(ENV_FETCH_TIMEOUT_SECS) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid {ENV_FETCH_TIMEOUT_SECS}: {raw}"))?,
            Err(_) => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let leetcode_base_url = std::env::var(ENV_LEETCODE_BASE_URL)
            .unwrap_or_else(|_| lst_leetcode::DEFAULT_BASE_URL.to_string());

        Ok(Self {
            bind_addr,
            day_offset_minutes,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            leetcode_base_url,
        })
    }

    pub fn day_boundary(&self) -> Result<DayBoundary> {
        DayBoundary::from_east_minutes(self.day_offset_minutes).with_context(|| {
            format!(
                "{ENV_DAY_OFFSET_MINUTES} out of range: {}",
                self.day_offset_minutes
            )
        })
    }
}
