//! lst-leetcode
//!
//! Outbound profile-source boundary: the `ProfileSource` trait and the
//! concrete LeetCode GraphQL client. This crate does not touch the DB;
//! callers (the ingestion orchestrator) hand the fetched counts onward.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use lst_schemas::ProfileCounts;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://leetcode.com";

/// GraphQL document for the profile lookup. Upstream distinguishes "no such
/// user" by returning a null `matchedUser`, not by an HTTP error.
const PROFILE_QUERY: &str = r#"
query getUserProfile($username: String!) {
  matchedUser(username: $username) {
    username
    profile {
      userAvatar
    }
    submitStats {
      acSubmissionNum {
        difficulty
        count
      }
    }
  }
}
"#;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`ProfileSource`] implementation may return.
#[derive(Debug)]
pub enum FetchError {
    /// Network or transport failure (DNS, timeout, connection refused).
    Transport(String),
    /// The upstream API answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The identity does not exist upstream. A distinct outcome, not an error
    /// of the transport.
    NotFound(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "transport error: {msg}"),
            FetchError::Api { status, message } => {
                write!(f, "upstream api error status={status}: {message}")
            }
            FetchError::Decode(msg) => write!(f, "decode error: {msg}"),
            FetchError::NotFound(username) => write!(f, "no such user upstream: {username}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

// ---------------------------------------------------------------------------
// ProfileSource trait
// ---------------------------------------------------------------------------

/// Upstream profile-statistics source contract.
///
/// Implementations must be `Send + Sync` so the orchestrator can drive many
/// per-user cycles concurrently over one shared source.
#[async_trait::async_trait]
pub trait ProfileSource: Send + Sync {
    /// Human-readable name identifying this source (e.g. `"leetcode"`).
    fn source_name(&self) -> &'static str;

    /// Fetch cumulative counts for one identity.
    async fn fetch_profile(&self, username: &str) -> Result<ProfileCounts, FetchError>;
}

// ---------------------------------------------------------------------------
// LeetCode GraphQL client
// ---------------------------------------------------------------------------

/// LeetCode-backed profile source.
///
/// `base_url` is injectable so tests can point the client at a local mock
/// server; production uses [`DEFAULT_BASE_URL`].
#[derive(Debug, Clone)]
pub struct LeetCodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl LeetCodeClient {
    /// Build a client with a per-request timeout. The timeout is what keeps a
    /// stuck upstream from blocking unrelated users' cycles.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::new_with_base_url(DEFAULT_BASE_URL.to_string(), timeout)
    }

    pub fn new_with_base_url(base_url: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client failed")?;
        Ok(Self { http, base_url })
    }

    fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl ProfileSource for LeetCodeClient {
    fn source_name(&self) -> &'static str {
        "leetcode"
    }

    async fn fetch_profile(&self, username: &str) -> Result<ProfileCounts, FetchError> {
        let body = serde_json::json!({
            "query": PROFILE_QUERY,
            "variables": { "username": username },
        });

        let resp = self
            .http
            .post(self.graphql_url())
            .header("Content-Type", "application/json")
            // Upstream rejects requests without a site referer.
            .header("Referer", "https://leetcode.com")
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let decoded: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let matched = decoded
            .data
            .and_then(|d| d.matched_user)
            .ok_or_else(|| FetchError::NotFound(username.to_string()))?;

        Ok(matched.into_counts())
    }
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(rename = "matchedUser")]
    matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
struct MatchedUser {
    username: String,
    profile: Option<Profile>,
    #[serde(rename = "submitStats")]
    submit_stats: Option<SubmitStats>,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(rename = "userAvatar")]
    user_avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitStats {
    #[serde(rename = "acSubmissionNum")]
    ac_submission_num: Vec<TierCount>,
}

#[derive(Debug, Deserialize)]
struct TierCount {
    difficulty: String,
    count: i64,
}

impl MatchedUser {
    fn into_counts(self) -> ProfileCounts {
        let tiers = self
            .submit_stats
            .map(|s| s.ac_submission_num)
            .unwrap_or_default();

        let count_for = |difficulty: &str| -> i64 {
            tiers
                .iter()
                .find(|t| t.difficulty == difficulty)
                .map(|t| t.count)
                .unwrap_or(0)
        };

        ProfileCounts {
            total_solved: count_for("All"),
            easy_solved: count_for("Easy"),
            medium_solved: count_for("Medium"),
            hard_solved: count_for("Hard"),
            avatar_url: self.profile.and_then(|p| p.user_avatar),
            username: self.username,
        }
    }
}

// -----------------
// Tests (local mock server, no real network)
// -----------------
