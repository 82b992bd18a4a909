//! Axum router and all HTTP handlers for lst-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use lst_ingest::IngestError;
use lst_leetcode::FetchError;

use crate::{
    api_types::{ErrorResponse, FetchParams, FetchResponse, HealthResponse, StatusResponse},
    state::{uptime_secs, AppState},
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/status", get(status_handler))
        .route("/v1/fetch", get(fetch_user))
        .route("/v1/refresh/all", post(refresh_all))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/status
// ---------------------------------------------------------------------------

pub(crate) async fn status_handler(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let (db_ok, has_users_table, db_error) = match lst_db::status(&st.pool).await {
        Ok(s) => (s.ok, s.has_users_table, None),
        Err(e) => (false, false, Some(format!("{e:#}"))),
    };

    (
        StatusCode::OK,
        Json(StatusResponse {
            ok: true,
            daemon_uptime_secs: uptime_secs(),
            db_ok,
            has_users_table,
            db_error,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/fetch?username=<name>
// ---------------------------------------------------------------------------

/// Run one ingestion cycle for the given identity.
///
/// 400 when the parameter is missing or blank (checked before any I/O);
/// 404 when the upstream fetch fails or the identity is unmatched;
/// 500 when the fetch succeeded but persistence failed.
pub(crate) async fn fetch_user(
    State(st): State<Arc<AppState>>,
    Query(params): Query<FetchParams>,
) -> Response {
    let username = params.username.unwrap_or_default();
    if username.trim().is_empty() {
        return error_body(
            StatusCode::BAD_REQUEST,
            "username parameter is required".to_string(),
        );
    }

    match st.ingestor.ingest_user(&username).await {
        Ok(report) => {
            info!(%username, "fetch ok");
            (
                StatusCode::OK,
                Json(FetchResponse {
                    success: true,
                    data: report,
                }),
            )
                .into_response()
        }
        Err(e) => ingest_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// POST /v1/refresh/all
// ---------------------------------------------------------------------------

pub(crate) async fn refresh_all(State(st): State<Arc<AppState>>) -> Response {
    match st.ingestor.refresh_all().await {
        Ok(summary) => {
            info!(
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "refresh/all complete"
            );
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(e) => ingest_error_response(e),
    }
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn ingest_error_response(e: IngestError) -> Response {
    let status = match &e {
        IngestError::Validation(_) => StatusCode::BAD_REQUEST,
        // Unmatched identity and unreachable/undecodable upstream both
        // surface as "could not fetch this profile".
        IngestError::Fetch(FetchError::NotFound(_)) => StatusCode::NOT_FOUND,
        IngestError::Fetch(_) => StatusCode::NOT_FOUND,
        IngestError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, e.to_string())
}

fn error_body(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}
