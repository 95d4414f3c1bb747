//! Heartbeat emission and stale-session eviction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use mediroute_core::config::tracking::TrackingConfig;

use crate::message::types::OutboundMessage;
use crate::metrics::TrackingMetrics;
use crate::session::manager::SessionManager;
use crate::topic::registry::TopicRegistry;

/// Periodic liveness sweeper.
///
/// Every interval it emits a heartbeat frame to all sessions, counting a
/// miss per emitted heartbeat; a pong clears the counter, so the count only
/// grows for heartbeats that were delivered and went unanswered.
/// Sessions reaching the miss threshold are evicted through the session
/// manager, so eviction and a racing client disconnect share the same
/// idempotent teardown path.
#[derive(Debug)]
pub struct LivenessMonitor {
    /// Session manager, used for eviction.
    manager: Arc<SessionManager>,
    /// Topic registry, for the active-topic count in heartbeat frames.
    registry: Arc<TopicRegistry>,
    /// Metrics.
    metrics: Arc<TrackingMetrics>,
    /// Heartbeat interval.
    interval: Duration,
    /// Consecutive misses before eviction.
    miss_threshold: u32,
}

impl LivenessMonitor {
    /// Creates a new monitor.
    pub fn new(
        config: &TrackingConfig,
        manager: Arc<SessionManager>,
        registry: Arc<TopicRegistry>,
        metrics: Arc<TrackingMetrics>,
    ) -> Self {
        Self {
            manager,
            registry,
            metrics,
            interval: Duration::from_secs(config.heartbeat_interval_seconds),
            miss_threshold: config.miss_threshold,
        }
    }

    /// Runs the sweep loop until shutdown is signalled.
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        // First tick fires immediately; skip it so sessions get a full
        // interval before their first miss can be counted.
        ticker.tick().await;

        info!(
            interval_seconds = self.interval.as_secs(),
            miss_threshold = self.miss_threshold,
            "Liveness monitor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    info!("Liveness monitor stopping");
                    break;
                }
            }
        }
    }

    /// Performs one heartbeat sweep. Returns the number of evicted sessions.
    pub fn sweep(&self) -> usize {
        let sessions = self.manager.pool().all_sessions();
        let heartbeat = OutboundMessage::Heartbeat {
            timestamp: Utc::now().timestamp(),
            connected_sessions: sessions.len(),
            active_topics: self.registry.topic_count(),
        };

        let mut evicted = 0;
        for handle in sessions {
            if !handle.is_alive() {
                self.manager.unregister(handle.id);
                continue;
            }

            // A delivery failure since the last sweep counts as a miss on
            // top of the regular pong check.
            if handle.take_suspect() {
                handle.record_miss();
            }

            // Eviction requires miss_threshold delivered heartbeats that
            // each went a full interval without a pong.
            if handle.miss_count() >= self.miss_threshold {
                warn!(
                    session_id = %handle.id,
                    subject_id = %handle.subject_id,
                    misses = handle.miss_count(),
                    last_pong = handle.last_pong_timestamp(),
                    "Evicting unresponsive session"
                );
                self.manager.unregister(handle.id);
                self.metrics.session_evicted();
                evicted += 1;
                continue;
            }

            handle.send(heartbeat.clone());
            handle.record_miss();
        }

        debug!(
            connected = self.manager.session_count(),
            evicted, "Liveness sweep complete"
        );
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::types::OutboundMessage;
    use crate::session::authenticator::AuthenticatedSession;
    use crate::session::pool::SessionPool;
    use crate::topic::topic::Topic;
    use mediroute_core::types::{SubjectId, SubjectRole};

    fn setup() -> (Arc<SessionManager>, Arc<TopicRegistry>, LivenessMonitor) {
        let config = TrackingConfig {
            miss_threshold: 3,
            ..TrackingConfig::default()
        };
        let registry = Arc::new(TopicRegistry::new());
        let metrics = Arc::new(TrackingMetrics::new());
        let manager = Arc::new(SessionManager::new(
            config.clone(),
            Arc::new(SessionPool::new()),
            registry.clone(),
            metrics.clone(),
        ));
        let monitor = LivenessMonitor::new(&config, manager.clone(), registry.clone(), metrics);
        (manager, registry, monitor)
    }

    fn verified() -> AuthenticatedSession {
        AuthenticatedSession::Verified {
            subject_id: SubjectId::new(),
            role: SubjectRole::UnitDevice,
        }
    }

    #[tokio::test]
    async fn test_silent_session_evicted_at_threshold() {
        let (manager, registry, monitor) = setup();
        let (handle, mut rx) = manager.register(&verified());
        registry.subscribe(Topic::Global, handle.id);

        assert_eq!(monitor.sweep(), 0);
        assert_eq!(monitor.sweep(), 0);
        assert_eq!(monitor.sweep(), 0);
        // Three delivered heartbeats went unanswered; the next sweep evicts.
        assert_eq!(monitor.sweep(), 1);

        assert_eq!(manager.session_count(), 0);
        assert_eq!(registry.topic_count(), 0);

        // Every counted miss corresponds to a heartbeat that was delivered.
        let mut heartbeats = 0;
        while let Ok(msg) = rx.try_recv() {
            if matches!(msg, OutboundMessage::Heartbeat { .. }) {
                heartbeats += 1;
            }
        }
        assert_eq!(heartbeats, 3);
    }

    #[tokio::test]
    async fn test_pong_resets_miss_counter() {
        let (manager, _registry, monitor) = setup();
        let (handle, _rx) = manager.register(&verified());

        monitor.sweep();
        monitor.sweep();
        handle.record_pong();
        monitor.sweep();
        monitor.sweep();

        assert_eq!(manager.session_count(), 1);
    }

    #[tokio::test]
    async fn test_eviction_races_with_disconnect() {
        let (manager, _registry, monitor) = setup();
        let (handle, rx) = manager.register(&verified());

        // Connection task tears the session down first.
        drop(rx);
        manager.unregister(handle.id);

        monitor.sweep();
        monitor.sweep();
        monitor.sweep();
        assert_eq!(manager.session_count(), 0);
    }
}
