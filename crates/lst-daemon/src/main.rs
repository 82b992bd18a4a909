//! lst-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, resolves config,
//! connects and migrates the DB, builds the shared state, wires middleware,
//! and starts the HTTP server. All route handlers live in `routes.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use lst_daemon::{config::DaemonConfig, routes, state};
use lst_db::PgStore;
use lst_ingest::{Ingestor, IngestorConfig};
use lst_leetcode::LeetCodeClient;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cfg = DaemonConfig::from_env()?;
    let day_boundary = cfg.day_boundary()?;

    let pool = lst_db::connect_from_env().await?;
    lst_db::migrate(&pool).await?;

    let client = LeetCodeClient::new_with_base_url(cfg.leetcode_base_url.clone(), cfg.fetch_timeout)
        .context("build profile client failed")?;
    let ingestor = Ingestor::new(
        PgStore::new(pool.clone()),
        client,
        IngestorConfig::new(day_boundary),
    );

    let shared = Arc::new(state::AppState::new(pool, ingestor));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    info!("lst-daemon listening on http://{}", cfg.bind_addr);

    axum::serve(tokio::net::TcpListener::bind(cfg.bind_addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
