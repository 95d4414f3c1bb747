//! Broadcast dispatcher — fans messages out to topic subscribers.

use std::sync::Arc;

use tracing::{debug, warn};

use mediroute_core::types::SessionId;

use crate::message::types::OutboundMessage;
use crate::metrics::TrackingMetrics;
use crate::session::pool::SessionPool;
use crate::topic::registry::TopicRegistry;
use crate::topic::topic::Topic;

/// Fans a message out to every session subscribed to a topic.
///
/// Each delivery is an independent non-blocking attempt into the session's
/// bounded queue, so a slow or unreachable subscriber never blocks the rest
/// of the fan-out. Per-subscriber FIFO holds because each session's queue is
/// drained by a single writer task.
#[derive(Debug)]
pub struct BroadcastDispatcher {
    /// Topic registry.
    registry: Arc<TopicRegistry>,
    /// Session pool.
    pool: Arc<SessionPool>,
    /// Metrics.
    metrics: Arc<TrackingMetrics>,
}

impl BroadcastDispatcher {
    /// Creates a new dispatcher.
    pub fn new(
        registry: Arc<TopicRegistry>,
        pool: Arc<SessionPool>,
        metrics: Arc<TrackingMetrics>,
    ) -> Self {
        Self {
            registry,
            pool,
            metrics,
        }
    }

    /// Publishes a message to every subscriber of a topic.
    ///
    /// Publishing to a topic with zero subscribers is a safe no-op.
    /// Returns the number of successful deliveries. A failed delivery is
    /// logged and the subscriber flagged for liveness re-check; it is never
    /// surfaced to the publisher.
    pub fn publish(&self, topic: &Topic, message: &OutboundMessage) -> usize {
        let subscriber_ids = self.registry.subscribers_of(topic);
        if subscriber_ids.is_empty() {
            return 0;
        }

        let mut delivered = 0usize;
        for session_id in subscriber_ids {
            let Some(handle) = self.pool.get(session_id) else {
                continue;
            };
            if handle.send(message.clone()) {
                delivered += 1;
            } else {
                self.metrics.delivery_dropped();
                warn!(
                    session_id = %session_id,
                    topic = %topic,
                    "Delivery failed, subscriber flagged for liveness re-check"
                );
            }
        }

        self.metrics.messages_sent(delivered as u64);
        debug!(topic = %topic, delivered, "Broadcast dispatched");
        delivered
    }

    /// Sends a message to one specific session.
    pub fn publish_to_session(&self, session_id: SessionId, message: OutboundMessage) -> bool {
        let Some(handle) = self.pool.get(session_id) else {
            return false;
        };
        let sent = handle.send(message);
        if sent {
            self.metrics.messages_sent(1);
        } else {
            self.metrics.delivery_dropped();
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::handle::SessionHandle;
    use mediroute_core::types::{SubjectId, SubjectRole};
    use tokio::sync::mpsc;

    fn setup() -> (
        Arc<TopicRegistry>,
        Arc<SessionPool>,
        BroadcastDispatcher,
    ) {
        let registry = Arc::new(TopicRegistry::new());
        let pool = Arc::new(SessionPool::new());
        let dispatcher = BroadcastDispatcher::new(
            registry.clone(),
            pool.clone(),
            Arc::new(TrackingMetrics::new()),
        );
        (registry, pool, dispatcher)
    }

    fn add_session(pool: &SessionPool) -> (SessionId, mpsc::Receiver<OutboundMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = Arc::new(SessionHandle::new(
            SubjectId::new(),
            SubjectRole::Coordinator,
            false,
            tx,
        ));
        let id = handle.id;
        pool.add(handle);
        (id, rx)
    }

    fn heartbeat(n: i64) -> OutboundMessage {
        OutboundMessage::Heartbeat {
            timestamp: n,
            connected_sessions: 0,
            active_topics: 0,
        }
    }

    #[tokio::test]
    async fn test_zero_subscribers_is_noop() {
        let (_registry, _pool, dispatcher) = setup();
        assert_eq!(dispatcher.publish(&Topic::unit("U1"), &heartbeat(0)), 0);
    }

    #[tokio::test]
    async fn test_delivers_to_all_subscribers() {
        let (registry, pool, dispatcher) = setup();
        let (a, mut rx_a) = add_session(&pool);
        let (b, mut rx_b) = add_session(&pool);
        registry.subscribe(Topic::Global, a);
        registry.subscribe(Topic::Global, b);

        assert_eq!(dispatcher.publish(&Topic::Global, &heartbeat(1)), 2);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_slow_subscriber_does_not_block_others() {
        let (registry, pool, dispatcher) = setup();

        // Slow subscriber with a tiny, already-full buffer.
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let slow = Arc::new(SessionHandle::new(
            SubjectId::new(),
            SubjectRole::Coordinator,
            false,
            slow_tx,
        ));
        let slow_id = slow.id;
        slow.send(heartbeat(0));
        pool.add(slow);

        let (fast_id, mut fast_rx) = add_session(&pool);
        registry.subscribe(Topic::Global, slow_id);
        registry.subscribe(Topic::Global, fast_id);

        // Only the fast subscriber receives; the slow one is flagged.
        assert_eq!(dispatcher.publish(&Topic::Global, &heartbeat(1)), 1);
        assert!(fast_rx.recv().await.is_some());
        assert!(pool.get(slow_id).unwrap().take_suspect());
    }

    #[tokio::test]
    async fn test_per_subscriber_fifo() {
        let (registry, pool, dispatcher) = setup();
        let (id, mut rx) = add_session(&pool);
        registry.subscribe(Topic::unit("U1"), id);

        dispatcher.publish(&Topic::unit("U1"), &heartbeat(1));
        dispatcher.publish(&Topic::unit("U1"), &heartbeat(2));

        match (rx.recv().await.unwrap(), rx.recv().await.unwrap()) {
            (
                OutboundMessage::Heartbeat { timestamp: t1, .. },
                OutboundMessage::Heartbeat { timestamp: t2, .. },
            ) => {
                assert_eq!((t1, t2), (1, 2));
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }
}
