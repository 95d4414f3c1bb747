//! MediRoute Server — Medical Transport Coordination Platform
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::{EnvFilter, fmt};

use mediroute_core::config::AppConfig;
use mediroute_core::error::AppError;
use mediroute_tracking::TrackingEngine;
use mediroute_tracking::session::authenticator::SessionAuthenticator;

#[tokio::main]
async fn main() {
    let env = std::env::var("MEDIROUTE_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting MediRoute v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection ──────────────────────────────
    let db = Arc::new(mediroute_database::connection::DatabasePool::connect(&config.database).await?);

    // ── Step 2: Auth ─────────────────────────────────────────────
    let jwt_decoder = Arc::new(mediroute_auth::jwt::decoder::JwtDecoder::new(&config.auth));
    let authenticator = SessionAuthenticator::new(jwt_decoder, &config.auth);

    // ── Step 3: Tracking engine ──────────────────────────────────
    tracing::info!("Initializing tracking engine...");
    let store = Arc::new(
        mediroute_database::repositories::tracking::TrackingRepository::new(db.pool().clone()),
    );
    let engine = Arc::new(TrackingEngine::new(config.tracking.clone(), store));
    engine.start().await;

    // ── Step 4: Build and start HTTP server ──────────────────────
    let app_state = mediroute_api::state::AppState {
        config: Arc::new(config.clone()),
        db: Arc::clone(&db),
        engine: Arc::clone(&engine),
        authenticator,
        started_at: Utc::now(),
    };

    let app = mediroute_api::router::build_router(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("MediRoute server listening on {addr}");

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let shutdown_engine = Arc::clone(&engine);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        shutdown_engine.shutdown();
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    db.close().await;
    tracing::info!("MediRoute server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
