//! Tracking engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug)]
pub struct TrackingMetrics {
    /// Total messages received from clients.
    messages_received: AtomicU64,
    /// Total messages delivered to clients.
    messages_sent: AtomicU64,
    /// Total sessions opened.
    sessions_opened: AtomicU64,
    /// Total sessions closed (disconnect or eviction).
    sessions_closed: AtomicU64,
    /// Total geofence transition events emitted.
    geofence_events: AtomicU64,
    /// Total deliveries dropped (full buffer or dead subscriber).
    deliveries_dropped: AtomicU64,
    /// Total sessions evicted by the liveness monitor.
    sessions_evicted: AtomicU64,
}

impl TrackingMetrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            sessions_opened: AtomicU64::new(0),
            sessions_closed: AtomicU64::new(0),
            geofence_events: AtomicU64::new(0),
            deliveries_dropped: AtomicU64::new(0),
            sessions_evicted: AtomicU64::new(0),
        }
    }

    /// Record an inbound message.
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record successful deliveries.
    pub fn messages_sent(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a session registration.
    pub fn session_opened(&self) {
        self.sessions_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session teardown.
    pub fn session_closed(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record emitted geofence events.
    pub fn geofence_events(&self, count: u64) {
        self.geofence_events.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a dropped delivery.
    pub fn delivery_dropped(&self) {
        self.deliveries_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a liveness eviction.
    pub fn session_evicted(&self) {
        self.sessions_evicted.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            sessions_opened: self.sessions_opened.load(Ordering::Relaxed),
            sessions_closed: self.sessions_closed.load(Ordering::Relaxed),
            geofence_events: self.geofence_events.load(Ordering::Relaxed),
            deliveries_dropped: self.deliveries_dropped.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
        }
    }
}

impl Default for TrackingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total messages received from clients.
    pub messages_received: u64,
    /// Total messages delivered to clients.
    pub messages_sent: u64,
    /// Total sessions opened.
    pub sessions_opened: u64,
    /// Total sessions closed.
    pub sessions_closed: u64,
    /// Total geofence events emitted.
    pub geofence_events: u64,
    /// Total deliveries dropped.
    pub deliveries_dropped: u64,
    /// Total liveness evictions.
    pub sessions_evicted: u64,
}
