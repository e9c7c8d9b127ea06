//! ldk-daemon entry point.
//!
//! Thin on purpose: tracing, settings, store, shared state, middleware,
//! background ticks and the HTTP server. Route handlers live in
//! `routes.rs`; shared state and the ticks live in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use ldk_config::LoadOutcome;
use ldk_daemon::{routes, state};
use ldk_runtime::Desk;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

const ENV_DAEMON_ADDR: &str = "LDK_DAEMON_ADDR";
const REMINDER_TICK: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let settings_path = ldk_config::settings_path_from_env();
    let loaded = ldk_config::load_or_init(&settings_path)?;
    if let LoadOutcome::Recovered { backup } = &loaded.outcome {
        warn!(backup = %backup.display(), "settings were reset to defaults");
    }
    info!(settings_hash = %loaded.settings_hash, "settings active");

    let pool = ldk_db::connect_from_env().await?;
    ldk_db::migrate(&pool).await?;

    let shared = Arc::new(state::AppState::new(
        Desk::with_system_clock(pool),
        loaded.settings,
        Some(settings_path),
    ));

    let heartbeat = state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    let reminders = state::spawn_reminder_tick(Arc::clone(&shared), REMINDER_TICK);

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8898)));
    info!("ldk-daemon listening on http://{}", addr);

    let served = axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed");

    reminders.abort();
    heartbeat.abort();
    shared.desk.pool().close().await;
    info!("ldk-daemon stopped");

    served
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var(ENV_DAEMON_ADDR).ok()?.parse().ok()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
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
        "http://localhost:1420",
        "http://127.0.0.1:1420",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}
