//! Geofence region and transition event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::{FacilityId, UnitId};
use crate::error::AppError;

/// A circular geofence around a facility.
///
/// Radius is in meters. The outer "approaching" threshold is derived as
/// `radius_meters * approach_factor` (see `TrackingConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceRegion {
    /// The facility this region belongs to.
    pub facility_id: FacilityId,
    /// Center latitude in decimal degrees.
    pub center_latitude: f64,
    /// Center longitude in decimal degrees.
    pub center_longitude: f64,
    /// Region radius in meters.
    pub radius_meters: f64,
}

/// Kind of geofence transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeofenceEventKind {
    /// The unit crossed into the region.
    Entered,
    /// The unit crossed out of the region.
    Exited,
    /// The unit entered the approach band outside the region.
    Approaching,
}

impl GeofenceEventKind {
    /// Return the kind as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entered => "ENTERED",
            Self::Exited => "EXITED",
            Self::Approaching => "APPROACHING",
        }
    }
}

impl fmt::Display for GeofenceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GeofenceEventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENTERED" => Ok(Self::Entered),
            "EXITED" => Ok(Self::Exited),
            "APPROACHING" => Ok(Self::Approaching),
            _ => Err(AppError::validation(format!(
                "Invalid geofence event kind: '{s}'"
            ))),
        }
    }
}

/// A geofence transition event.
///
/// Created exactly once per genuine transition and never retroactively
/// corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofenceEvent {
    /// The unit that transitioned.
    pub unit_id: UnitId,
    /// The facility whose region was crossed.
    pub facility_id: FacilityId,
    /// Transition kind.
    pub kind: GeofenceEventKind,
    /// Unit latitude at the time of the event.
    pub latitude: f64,
    /// Unit longitude at the time of the event.
    pub longitude: f64,
    /// When the event was detected.
    pub timestamp: DateTime<Utc>,
}
