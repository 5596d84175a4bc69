//! txnhook-daemon entry point.
//!
//! This file is intentionally thin: it loads configuration, connects to
//! Postgres, builds the shared state, wires middleware, and starts the HTTP
//! server. All route handlers live in `routes.rs`; all shared state types
//! live in `state.rs`.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::Method;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use txnhook_config::Settings;
use txnhook_core::Repository;
use txnhook_daemon::{routes, state::AppState};

/// Grace period for draining in-flight background processors once shutdown
/// is signalled. Unfinished tasks are left PROCESSING with
/// `processing_started_at` cleared by `mark_interrupted`, so they are not
/// lost — they become retry-eligible on the next delivery.
const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if absent —
    // production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    let settings = Arc::new(Settings::from_env().context("failed to load settings")?);
    init_tracing(&settings.log_level);

    let pool = txnhook_db::connect(
        &settings.database_url,
        settings.db_max_connections,
        settings.db_pool_recycle,
    )
    .await
    .context("failed to connect to database")?;

    if settings.db_auto_create {
        txnhook_db::migrate(&pool).await.context("failed to run migrations")?;
    }
    txnhook_db::check_connection(&pool).await.context("database connectivity check failed")?;

    let repository = Repository::new(pool, settings.db_operation_timeout);
    let shared = Arc::new(AppState::new(Arc::clone(&settings), repository));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_permissive());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!("txnhook-daemon listening on http://{}", settings.bind_addr);

    let shutdown_state = Arc::clone(&shared);
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal(shutdown_state))
        .await
        .context("server crashed")?;

    info!("draining background processors before exit");
    shared.registry.drain(SHUTDOWN_DRAIN_GRACE).await;

    Ok(())
}

/// Waits for Ctrl-C (or, on Unix, SIGTERM), then fires the process-wide
/// shutdown signal so in-flight Background Processor tasks stop racing the
/// delay and instead record `mark_interrupted` on their next suspension
/// point.
async fn wait_for_shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signalled; draining in-flight processors");
    state.shutdown.signal();
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .init();
}

/// CORS: webhook producers are arbitrary external services, not browser
/// clients on a known origin set, so allow any origin for this POST/GET
/// surface rather than hardcoding a localhost allowlist.
fn cors_permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}

