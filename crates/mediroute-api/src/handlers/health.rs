//! Health check handlers.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use mediroute_database::DatabaseHealth;
use mediroute_tracking::metrics::MetricsSnapshot;

use crate::state::AppState;

/// Basic health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: i64,
}

/// Detailed health response with engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Service status.
    pub status: String,
    /// Database reachability and pool utilization.
    pub database: DatabaseHealth,
    /// Connected tracking sessions.
    pub connected_sessions: usize,
    /// Units with a known position.
    pub tracked_units: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// GET /api/health/detailed
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let database = state.db.health().await;
    let status = if database.reachable { "ok" } else { "degraded" };

    Json(DetailedHealthResponse {
        status: status.to_string(),
        database,
        connected_sessions: state.engine.manager().session_count(),
        tracked_units: state.engine.hub().tracked_unit_count(),
        metrics: state.engine.metrics().snapshot(),
    })
}
