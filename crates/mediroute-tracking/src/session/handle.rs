//! Individual session connection handle.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use mediroute_core::types::{SessionId, SubjectId, SubjectRole};

use crate::message::types::OutboundMessage;

/// A handle to a single live connection.
///
/// Holds the bounded sender for pushing messages to the client plus
/// metadata about the authenticated subject. The session owns its
/// connection exclusively; delivery is a non-blocking `try_send` so one
/// slow client can never stall a fan-out.
#[derive(Debug)]
pub struct SessionHandle {
    /// Unique session ID, generated at connect time.
    pub id: SessionId,
    /// Authenticated subject that owns this session.
    pub subject_id: SubjectId,
    /// Subject role (cached for quick checks).
    pub role: SubjectRole,
    /// Whether the session was admitted via the demo sentinel.
    pub is_demo: bool,
    /// Sender for outbound messages.
    sender: mpsc::Sender<OutboundMessage>,
    /// When the session was established.
    pub created_at: DateTime<Utc>,
    /// Last pong received, as seconds since epoch.
    last_pong: std::sync::atomic::AtomicI64,
    /// Consecutive heartbeats without a pong.
    missed_heartbeats: AtomicU32,
    /// Whether the connection is still alive.
    alive: AtomicBool,
    /// Flagged for liveness re-check after a delivery failure.
    suspect: AtomicBool,
}

impl SessionHandle {
    /// Creates a new session handle.
    pub fn new(
        subject_id: SubjectId,
        role: SubjectRole,
        is_demo: bool,
        sender: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            subject_id,
            role,
            is_demo,
            sender,
            created_at: now,
            last_pong: std::sync::atomic::AtomicI64::new(now.timestamp()),
            missed_heartbeats: AtomicU32::new(0),
            alive: AtomicBool::new(true),
            suspect: AtomicBool::new(false),
        }
    }

    /// Attempts to deliver a message without blocking.
    ///
    /// Returns `false` and flags the session suspect when the buffer is
    /// full; marks the session dead when the receiver is gone.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(msg) {
            Ok(_) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.id, "Session send buffer full, dropping message");
                self.mark_suspect();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the session is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the session as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Flag the session for liveness re-check.
    pub fn mark_suspect(&self) {
        self.suspect.store(true, Ordering::SeqCst);
    }

    /// Clear and return the suspect flag.
    pub fn take_suspect(&self) -> bool {
        self.suspect.swap(false, Ordering::SeqCst)
    }

    /// Record a pong response, resetting the miss counter.
    pub fn record_pong(&self) {
        self.last_pong
            .store(Utc::now().timestamp(), Ordering::SeqCst);
        self.missed_heartbeats.store(0, Ordering::SeqCst);
    }

    /// Record a heartbeat emission without a preceding pong.
    ///
    /// Returns the new consecutive miss count.
    pub fn record_miss(&self) -> u32 {
        self.missed_heartbeats.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current consecutive miss count.
    pub fn miss_count(&self) -> u32 {
        self.missed_heartbeats.load(Ordering::SeqCst)
    }

    /// Reset the consecutive miss count.
    pub fn reset_misses(&self) {
        self.missed_heartbeats.store(0, Ordering::SeqCst);
    }

    /// Last pong timestamp in seconds since epoch.
    pub fn last_pong_timestamp(&self) -> i64 {
        self.last_pong.load(Ordering::SeqCst)
    }
}
