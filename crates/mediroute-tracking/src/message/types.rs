//! Inbound and outbound message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mediroute_core::types::{
    FacilityId, GeofenceEvent, LocationUpdate, TransportUpdate, UnitId, UnitStatus,
};

/// Messages sent by a client (unit device or dashboard) to the hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Subscribe to per-unit location topics.
    SubscribeUnits {
        /// Unit IDs to subscribe to.
        unit_ids: Vec<UnitId>,
    },
    /// Subscribe to per-facility geofence topics.
    SubscribeFacilities {
        /// Facility IDs to subscribe to.
        facility_ids: Vec<FacilityId>,
    },
    /// Subscribe to the global topic.
    SubscribeGlobal,
    /// A GPS telemetry observation from a unit device.
    LocationUpdate {
        /// Reporting unit.
        unit_id: UnitId,
        /// Latitude in decimal degrees.
        latitude: f64,
        /// Longitude in decimal degrees.
        longitude: f64,
        /// Ground speed in km/h.
        speed: Option<f64>,
        /// Heading in degrees clockwise from north.
        heading: Option<f64>,
        /// Device battery level in percent.
        battery_level: Option<f64>,
        /// Cellular signal strength in percent.
        signal_strength: Option<f64>,
        /// Observation timestamp.
        timestamp: DateTime<Utc>,
    },
    /// A transport status change.
    TransportUpdate {
        /// Transport identifier.
        id: String,
        /// New status.
        status: String,
        /// Unit assigned to the transport, if any.
        assigned_unit_id: Option<UnitId>,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },
    /// An externally-detected geofence event from a trusted producer.
    GeofenceEvent {
        /// The unit that transitioned.
        unit_id: UnitId,
        /// The facility whose region was crossed.
        facility_id: FacilityId,
        /// Event kind wire string (ENTERED, EXITED, APPROACHING).
        event_type: String,
        /// Unit latitude at the time of the event.
        latitude: f64,
        /// Unit longitude at the time of the event.
        longitude: f64,
        /// When the event was detected.
        timestamp: DateTime<Utc>,
    },
    /// Pong response to a server heartbeat.
    Pong {
        /// Echoed heartbeat timestamp.
        timestamp: i64,
    },
}

/// Acknowledgement status for best-effort persisted messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// The update was persisted.
    Stored,
    /// Persistence failed; the update was still broadcast live.
    Dropped,
}

/// Messages sent by the hub to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Subscription confirmed.
    Subscribed {
        /// Topic strings the session is now subscribed to.
        topics: Vec<String>,
    },
    /// Last-known statuses, sent once on `subscribe_units`.
    UnitsStatus {
        /// One entry per requested unit with a known position.
        units: Vec<UnitStatus>,
    },
    /// A location update broadcast.
    LocationUpdate(LocationUpdate),
    /// Location update accepted.
    LocationConfirmed {
        /// Reporting unit.
        unit_id: UnitId,
        /// Server receipt timestamp.
        timestamp: DateTime<Utc>,
        /// Whether persistence succeeded.
        status: AckStatus,
    },
    /// Location update rejected.
    LocationError {
        /// Reporting unit (may be empty if the payload lacked one).
        unit_id: UnitId,
        /// Rejection reason.
        reason: String,
    },
    /// A geofence transition broadcast.
    GeofenceEvent(GeofenceEvent),
    /// A transport status broadcast.
    TransportUpdate(TransportUpdate),
    /// Transport update accepted.
    TransportConfirmed {
        /// Transport identifier.
        id: String,
        /// Server receipt timestamp.
        timestamp: DateTime<Utc>,
        /// Whether persistence succeeded.
        status: AckStatus,
    },
    /// Transport update rejected.
    TransportError {
        /// Transport identifier.
        id: String,
        /// Rejection reason.
        reason: String,
    },
    /// Periodic server heartbeat.
    Heartbeat {
        /// Server timestamp (seconds since epoch).
        timestamp: i64,
        /// Number of currently connected sessions.
        connected_sessions: usize,
        /// Number of currently active topics.
        active_topics: usize,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_tagged_parsing() {
        let raw = r#"{"type":"subscribe_units","unit_ids":["U1","U2"]}"#;
        let msg: InboundMessage = serde_json::from_str(raw).unwrap();
        match msg {
            InboundMessage::SubscribeUnits { unit_ids } => {
                assert_eq!(unit_ids, vec!["U1", "U2"]);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_location_update_broadcast_shape() {
        let update = LocationUpdate {
            unit_id: "U1".to_string(),
            latitude: 48.2,
            longitude: 16.3,
            speed: Some(42.0),
            heading: None,
            battery_level: Some(80.0),
            signal_strength: None,
            timestamp: Utc::now(),
            received_at: Utc::now(),
        };
        let json = serde_json::to_value(OutboundMessage::LocationUpdate(update)).unwrap();
        assert_eq!(json["type"], "location_update");
        assert_eq!(json["unit_id"], "U1");
        assert_eq!(json["latitude"], 48.2);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let raw = r#"{"type":"shutdown_everything"}"#;
        assert!(serde_json::from_str::<InboundMessage>(raw).is_err());
    }
}
