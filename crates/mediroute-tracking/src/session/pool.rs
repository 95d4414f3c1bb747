//! Session pool — tracks all live sessions indexed by session and subject.

use std::sync::Arc;

use dashmap::DashMap;

use mediroute_core::types::{SessionId, SubjectId};

use super::handle::SessionHandle;

/// Thread-safe pool of all live sessions.
#[derive(Debug)]
pub struct SessionPool {
    /// Session ID → handle for direct lookup.
    by_id: DashMap<SessionId, Arc<SessionHandle>>,
    /// Subject ID → sessions (one subject can hold several connections).
    by_subject: DashMap<SubjectId, Vec<Arc<SessionHandle>>>,
}

impl SessionPool {
    /// Creates a new empty pool.
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_subject: DashMap::new(),
        }
    }

    /// Adds a session to the pool.
    pub fn add(&self, handle: Arc<SessionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_subject
            .entry(handle.subject_id)
            .or_default()
            .push(handle);
    }

    /// Removes a session from the pool.
    pub fn remove(&self, session_id: SessionId) -> Option<Arc<SessionHandle>> {
        if let Some((_, handle)) = self.by_id.remove(&session_id) {
            if let Some(mut sessions) = self.by_subject.get_mut(&handle.subject_id) {
                sessions.retain(|s| s.id != session_id);
            }
            self.by_subject
                .remove_if(&handle.subject_id, |_, sessions| sessions.is_empty());
            Some(handle)
        } else {
            None
        }
    }

    /// Gets a specific session by ID.
    pub fn get(&self, session_id: SessionId) -> Option<Arc<SessionHandle>> {
        self.by_id
            .get(&session_id)
            .map(|entry| entry.value().clone())
    }

    /// Gets all sessions for a subject.
    pub fn subject_sessions(&self, subject_id: SubjectId) -> Vec<Arc<SessionHandle>> {
        self.by_subject
            .get(&subject_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns total number of live sessions.
    pub fn session_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns all session handles.
    pub fn all_sessions(&self) -> Vec<Arc<SessionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for SessionPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediroute_core::types::SubjectRole;
    use tokio::sync::mpsc;

    fn make_handle(subject: SubjectId) -> Arc<SessionHandle> {
        let (tx, _rx) = mpsc::channel(4);
        Arc::new(SessionHandle::new(subject, SubjectRole::UnitDevice, false, tx))
    }

    #[test]
    fn test_add_remove_roundtrip() {
        let pool = SessionPool::new();
        let subject = SubjectId::new();
        let handle = make_handle(subject);
        let id = handle.id;

        pool.add(handle);
        assert_eq!(pool.session_count(), 1);
        assert_eq!(pool.subject_sessions(subject).len(), 1);

        assert!(pool.remove(id).is_some());
        assert_eq!(pool.session_count(), 0);
        assert!(pool.subject_sessions(subject).is_empty());

        // Second removal is a no-op.
        assert!(pool.remove(id).is_none());
    }

    #[test]
    fn test_multiple_sessions_per_subject() {
        let pool = SessionPool::new();
        let subject = SubjectId::new();
        let first = make_handle(subject);
        let second = make_handle(subject);
        let first_id = first.id;

        pool.add(first);
        pool.add(second);
        assert_eq!(pool.subject_sessions(subject).len(), 2);

        pool.remove(first_id);
        assert_eq!(pool.subject_sessions(subject).len(), 1);
    }
}
