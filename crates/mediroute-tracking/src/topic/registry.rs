//! Topic registry — the single source of truth for topic membership.

use std::collections::HashSet;

use dashmap::DashMap;

use mediroute_core::types::SessionId;

use super::subscription::SubscriptionTracker;
use super::topic::Topic;

/// Registry of all active topics and their subscribers.
///
/// Maintains a forward index (topic → sessions) and a reverse index
/// (session → topics) that are kept in agreement by funneling every
/// mutation through the methods here. A topic with zero subscribers is
/// pruned rather than retained as an empty set.
#[derive(Debug)]
pub struct TopicRegistry {
    /// Topic → set of subscribed session IDs.
    topics: DashMap<Topic, HashSet<SessionId>>,
    /// Reverse index.
    subscriptions: SubscriptionTracker,
}

impl TopicRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            topics: DashMap::new(),
            subscriptions: SubscriptionTracker::new(),
        }
    }

    /// Subscribes a session to a topic. Idempotent.
    pub fn subscribe(&self, topic: Topic, session_id: SessionId) {
        self.topics
            .entry(topic.clone())
            .or_default()
            .insert(session_id);

        self.subscriptions.add(session_id, topic);
    }

    /// Unsubscribes a session from a topic.
    pub fn unsubscribe(&self, topic: &Topic, session_id: SessionId) {
        if let Some(mut subscribers) = self.topics.get_mut(topic) {
            subscribers.remove(&session_id);
        }
        // Pruning must stay atomic with the emptiness check, or a subscribe
        // that lands in between gets wiped out with the topic.
        self.topics
            .remove_if(topic, |_, subscribers| subscribers.is_empty());
        self.subscriptions.remove(session_id, topic);
    }

    /// Unsubscribes a session from every topic it ever joined.
    ///
    /// Called exactly once on disconnect; safe to call for a session with
    /// no subscriptions.
    pub fn unsubscribe_all(&self, session_id: SessionId) {
        let topics = self.subscriptions.remove_all(session_id);
        for topic in &topics {
            if let Some(mut subscribers) = self.topics.get_mut(topic) {
                subscribers.remove(&session_id);
            }
            self.topics
                .remove_if(topic, |_, subscribers| subscribers.is_empty());
        }
    }

    /// Returns all subscriber session IDs for a topic.
    pub fn subscribers_of(&self, topic: &Topic) -> Vec<SessionId> {
        self.topics
            .get(topic)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the topics a session is subscribed to.
    pub fn topics_of(&self, session_id: SessionId) -> HashSet<Topic> {
        self.subscriptions.topics_of(session_id)
    }

    /// Returns the subscription count for a session.
    pub fn subscription_count(&self, session_id: SessionId) -> usize {
        self.subscriptions.count(session_id)
    }

    /// Returns subscriber count for a topic.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .get(topic)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Returns total number of active topics.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Checks the forward and reverse indexes agree for a session.
    #[cfg(test)]
    pub fn indexes_agree(&self, session_id: SessionId) -> bool {
        let claimed = self.subscriptions.topics_of(session_id);
        let forward_holds = claimed.iter().all(|topic| {
            self.topics
                .get(topic)
                .map(|s| s.contains(&session_id))
                .unwrap_or(false)
        });
        let reverse_holds = self.topics.iter().all(|entry| {
            !entry.value().contains(&session_id) || claimed.contains(entry.key())
        });
        forward_holds && reverse_holds
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_idempotent() {
        let registry = TopicRegistry::new();
        let session = SessionId::new();
        let topic = Topic::unit("U1");

        registry.subscribe(topic.clone(), session);
        registry.subscribe(topic.clone(), session);

        assert_eq!(registry.subscribers_of(&topic), vec![session]);
        assert_eq!(registry.subscription_count(session), 1);
    }

    #[test]
    fn test_empty_topic_pruned() {
        let registry = TopicRegistry::new();
        let session = SessionId::new();
        let topic = Topic::facility("F1");

        registry.subscribe(topic.clone(), session);
        assert_eq!(registry.topic_count(), 1);

        registry.unsubscribe(&topic, session);
        assert_eq!(registry.topic_count(), 0);
        assert!(registry.subscribers_of(&topic).is_empty());
    }

    #[test]
    fn test_unsubscribe_all_clears_both_indexes() {
        let registry = TopicRegistry::new();
        let session = SessionId::new();
        let other = SessionId::new();

        registry.subscribe(Topic::unit("U1"), session);
        registry.subscribe(Topic::facility("F1"), session);
        registry.subscribe(Topic::Global, session);
        registry.subscribe(Topic::Global, other);

        registry.unsubscribe_all(session);

        assert_eq!(registry.subscription_count(session), 0);
        assert!(registry.indexes_agree(session));
        assert!(registry.indexes_agree(other));
        // Global survives because the other session still holds it.
        assert_eq!(registry.subscribers_of(&Topic::Global), vec![other]);
        assert_eq!(registry.topic_count(), 1);
    }

    #[test]
    fn test_unsubscribe_all_without_subscriptions_is_safe() {
        let registry = TopicRegistry::new();
        registry.unsubscribe_all(SessionId::new());
        assert_eq!(registry.topic_count(), 0);
    }

    #[test]
    fn test_pruning_never_drops_concurrent_subscriber() {
        use std::sync::Arc;

        let registry = Arc::new(TopicRegistry::new());
        let topic = Topic::unit("U1");
        let churner = SessionId::new();

        let churn = {
            let registry = Arc::clone(&registry);
            let topic = topic.clone();
            std::thread::spawn(move || {
                for _ in 0..20_000 {
                    registry.subscribe(topic.clone(), churner);
                    registry.unsubscribe(&topic, churner);
                }
            })
        };

        for _ in 0..20_000 {
            let stable = SessionId::new();
            registry.subscribe(topic.clone(), stable);
            assert!(
                registry.subscribers_of(&topic).contains(&stable),
                "subscriber lost to concurrent topic pruning"
            );
            assert!(registry.indexes_agree(stable));
            registry.unsubscribe(&topic, stable);
        }

        churn.join().unwrap();
    }

    #[test]
    fn test_indexes_agree_under_interleaving() {
        let registry = TopicRegistry::new();
        let a = SessionId::new();
        let b = SessionId::new();

        registry.subscribe(Topic::unit("U1"), a);
        registry.subscribe(Topic::unit("U1"), b);
        registry.subscribe(Topic::facility("F1"), a);
        registry.unsubscribe(&Topic::unit("U1"), a);
        registry.subscribe(Topic::Global, a);
        registry.unsubscribe_all(b);

        assert!(registry.indexes_agree(a));
        assert!(registry.indexes_agree(b));
        assert_eq!(registry.subscriber_count(&Topic::unit("U1")), 0);
        assert_eq!(registry.subscription_count(a), 2);
    }
}
