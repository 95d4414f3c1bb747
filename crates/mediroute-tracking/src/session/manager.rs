//! Session manager — handles session lifecycle (register, evict, teardown).

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use mediroute_core::config::tracking::TrackingConfig;
use mediroute_core::types::SessionId;

use crate::message::types::OutboundMessage;
use crate::metrics::TrackingMetrics;
use crate::session::authenticator::AuthenticatedSession;
use crate::session::handle::SessionHandle;
use crate::session::pool::SessionPool;
use crate::topic::registry::TopicRegistry;

/// Manages all live sessions.
#[derive(Debug)]
pub struct SessionManager {
    /// Session pool.
    pool: Arc<SessionPool>,
    /// Topic registry.
    registry: Arc<TopicRegistry>,
    /// Metrics.
    metrics: Arc<TrackingMetrics>,
    /// Configuration.
    config: TrackingConfig,
}

impl SessionManager {
    /// Creates a new session manager.
    pub fn new(
        config: TrackingConfig,
        pool: Arc<SessionPool>,
        registry: Arc<TopicRegistry>,
        metrics: Arc<TrackingMetrics>,
    ) -> Self {
        Self {
            pool,
            registry,
            metrics,
            config,
        }
    }

    /// Registers a new authenticated session.
    ///
    /// Returns the session handle and the receiver its connection task
    /// drains for outbound messages. No session state exists before this
    /// point; authentication failures never reach here.
    pub fn register(
        &self,
        auth: &AuthenticatedSession,
    ) -> (Arc<SessionHandle>, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(self.config.session_buffer_size);

        let handle = Arc::new(SessionHandle::new(
            auth.subject_id(),
            auth.role(),
            auth.is_demo(),
            tx,
        ));
        self.pool.add(handle.clone());
        self.metrics.session_opened();

        info!(
            session_id = %handle.id,
            subject_id = %handle.subject_id,
            role = %handle.role,
            "Session registered"
        );

        (handle, rx)
    }

    /// Unregisters a session and cleans up its subscriptions.
    ///
    /// Idempotent and safe to race with a concurrent eviction: only the
    /// caller that actually removes the session runs the cleanup.
    pub fn unregister(&self, session_id: SessionId) {
        if let Some(handle) = self.pool.remove(session_id) {
            handle.mark_dead();
            self.registry.unsubscribe_all(session_id);
            self.metrics.session_closed();

            info!(
                session_id = %session_id,
                subject_id = %handle.subject_id,
                "Session unregistered"
            );
        }
    }

    /// Closes all sessions (shutdown).
    pub fn close_all(&self) {
        let all = self.pool.all_sessions();
        for handle in &all {
            handle.mark_dead();
            self.pool.remove(handle.id);
            self.registry.unsubscribe_all(handle.id);
        }
        info!(count = all.len(), "All sessions closed");
    }

    /// Returns the configured max subscriptions per session.
    pub fn max_subscriptions(&self) -> usize {
        self.config.max_subscriptions_per_session
    }

    /// Returns the total live session count.
    pub fn session_count(&self) -> usize {
        self.pool.session_count()
    }

    /// Returns a reference to the session pool.
    pub fn pool(&self) -> &Arc<SessionPool> {
        &self.pool
    }
}
