//! Subscription tracking — which sessions are subscribed to which topics.

use std::collections::HashSet;

use dashmap::DashMap;

use mediroute_core::types::SessionId;

use super::topic::Topic;

/// Tracks session-to-topic subscription mappings (reverse index).
#[derive(Debug)]
pub struct SubscriptionTracker {
    /// Session ID → set of topics.
    session_to_topics: DashMap<SessionId, HashSet<Topic>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self {
            session_to_topics: DashMap::new(),
        }
    }

    /// Records a subscription.
    pub fn add(&self, session_id: SessionId, topic: Topic) {
        self.session_to_topics
            .entry(session_id)
            .or_default()
            .insert(topic);
    }

    /// Removes a subscription.
    pub fn remove(&self, session_id: SessionId, topic: &Topic) {
        if let Some(mut topics) = self.session_to_topics.get_mut(&session_id) {
            topics.remove(topic);
        }
        self.session_to_topics
            .remove_if(&session_id, |_, topics| topics.is_empty());
    }

    /// Gets all topics a session is subscribed to.
    pub fn topics_of(&self, session_id: SessionId) -> HashSet<Topic> {
        self.session_to_topics
            .get(&session_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the number of subscriptions for a session.
    pub fn count(&self, session_id: SessionId) -> usize {
        self.session_to_topics
            .get(&session_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a session, returning the topics it held.
    pub fn remove_all(&self, session_id: SessionId) -> HashSet<Topic> {
        self.session_to_topics
            .remove(&session_id)
            .map(|(_, topics)| topics)
            .unwrap_or_default()
    }
}

impl Default for SubscriptionTracker {
    fn default() -> Self {
        Self::new()
    }
}
