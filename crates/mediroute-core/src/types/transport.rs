//! Transport (trip) status update types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UnitId;

/// A status change for a transport, forwarded to global subscribers.
///
/// Transport records themselves are owned by the CRUD side of the platform;
/// the hub only relays status transitions and persists them best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportUpdate {
    /// Transport identifier.
    pub id: String,
    /// New status (e.g. "dispatched", "en-route", "completed").
    pub status: String,
    /// Unit assigned to the transport, if any.
    pub assigned_unit_id: Option<UnitId>,
    /// Caller-supplied timestamp of the change.
    pub timestamp: DateTime<Utc>,
}
