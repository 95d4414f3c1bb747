//! Real-time fleet tracking configuration.

use serde::{Deserialize, Serialize};

/// Tracking hub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Heartbeat emission interval in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Consecutive missed heartbeats before a session is evicted.
    #[serde(default = "default_miss_threshold")]
    pub miss_threshold: u32,
    /// Outbound message buffer size per session.
    #[serde(default = "default_session_buffer")]
    pub session_buffer_size: usize,
    /// Maximum topic subscriptions per session.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_session: usize,
    /// Multiplier applied to a geofence radius to derive the outer
    /// "approaching" threshold distance.
    #[serde(default = "default_approach_factor")]
    pub approach_factor: f64,
    /// Interval between facility region cache refreshes in seconds.
    #[serde(default = "default_region_refresh")]
    pub region_refresh_interval_seconds: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            miss_threshold: default_miss_threshold(),
            session_buffer_size: default_session_buffer(),
            max_subscriptions_per_session: default_max_subscriptions(),
            approach_factor: default_approach_factor(),
            region_refresh_interval_seconds: default_region_refresh(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_miss_threshold() -> u32 {
    3
}

fn default_session_buffer() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    100
}

fn default_approach_factor() -> f64 {
    1.5
}

fn default_region_refresh() -> u64 {
    300
}
