//! Application state shared across all handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use mediroute_core::config::AppConfig;
use mediroute_database::connection::DatabasePool;
use mediroute_tracking::TrackingEngine;
use mediroute_tracking::session::authenticator::SessionAuthenticator;

/// Application state passed to every Axum handler via `State<AppState>`.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool wrapper.
    pub db: Arc<DatabasePool>,
    /// The tracking engine.
    pub engine: Arc<TrackingEngine>,
    /// Connection authenticator.
    pub authenticator: SessionAuthenticator,
    /// Process start time, for uptime reporting.
    pub started_at: DateTime<Utc>,
}
