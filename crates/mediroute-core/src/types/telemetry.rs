//! Vehicle GPS telemetry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UnitId;

/// A single point observation for one unit.
///
/// Consumed by the tracking hub, persisted via the store collaborator, and
/// retained in memory only as the unit's last known position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Reporting unit.
    pub unit_id: UnitId,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Ground speed in km/h.
    pub speed: Option<f64>,
    /// Heading in degrees clockwise from north.
    pub heading: Option<f64>,
    /// Device battery level in percent.
    pub battery_level: Option<f64>,
    /// Cellular signal strength in percent.
    pub signal_strength: Option<f64>,
    /// Caller-supplied observation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Server receipt timestamp, set by the hub.
    pub received_at: DateTime<Utc>,
}

/// Last-known status of a unit, sent as part of the `units_status` snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Unit identifier.
    pub unit_id: UnitId,
    /// Last reported latitude.
    pub latitude: f64,
    /// Last reported longitude.
    pub longitude: f64,
    /// Last reported speed in km/h.
    pub speed: Option<f64>,
    /// Last reported heading.
    pub heading: Option<f64>,
    /// Last reported battery level in percent.
    pub battery_level: Option<f64>,
    /// When the last observation was reported.
    pub timestamp: DateTime<Utc>,
}

impl From<&LocationUpdate> for UnitStatus {
    fn from(update: &LocationUpdate) -> Self {
        Self {
            unit_id: update.unit_id.clone(),
            latitude: update.latitude,
            longitude: update.longitude,
            speed: update.speed,
            heading: update.heading,
            battery_level: update.battery_level,
            timestamp: update.timestamp,
        }
    }
}
