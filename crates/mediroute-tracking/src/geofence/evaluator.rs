//! Geofence transition evaluator.
//!
//! Classifies a unit's position against every facility region and emits
//! ENTERED/EXITED/APPROACHING events on genuine transitions only. The
//! evaluator is deterministic: the same position sequence always yields the
//! same event sequence, and the wall clock is used only for event
//! timestamping.

use chrono::Utc;
use dashmap::DashMap;

use mediroute_core::types::{
    FacilityId, GeofenceEvent, GeofenceEventKind, GeofenceRegion, UnitId,
};

/// Mean Earth radius in meters.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Zone classification of a unit relative to one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    /// Distance <= radius. The boundary is closed on the inside.
    Inside,
    /// radius < distance <= radius * approach_factor.
    Approaching,
    /// Beyond the approach threshold.
    Outside,
}

/// Detects geofence transitions from per-pair containment state.
#[derive(Debug)]
pub struct GeofenceEvaluator {
    /// (unit, facility) → last classified zone. Absent means outside.
    zones: DashMap<(UnitId, FacilityId), Zone>,
    /// Multiplier deriving the approach threshold from the radius.
    approach_factor: f64,
}

impl GeofenceEvaluator {
    /// Creates a new evaluator.
    pub fn new(approach_factor: f64) -> Self {
        Self {
            zones: DashMap::new(),
            approach_factor,
        }
    }

    /// Evaluates a position against all regions, returning the transition
    /// events it causes (zero, one, or many).
    pub fn evaluate(
        &self,
        unit_id: &UnitId,
        latitude: f64,
        longitude: f64,
        regions: &[GeofenceRegion],
    ) -> Vec<GeofenceEvent> {
        let mut events = Vec::new();

        for region in regions {
            let distance = haversine_meters(
                latitude,
                longitude,
                region.center_latitude,
                region.center_longitude,
            );
            let zone = self.classify(distance, region.radius_meters);

            let key = (unit_id.clone(), region.facility_id.clone());
            let previous = self
                .zones
                .insert(key, zone)
                .unwrap_or(Zone::Outside);

            if let Some(kind) = transition(previous, zone) {
                events.push(GeofenceEvent {
                    unit_id: unit_id.clone(),
                    facility_id: region.facility_id.clone(),
                    kind,
                    latitude,
                    longitude,
                    timestamp: Utc::now(),
                });
            }
        }

        events
    }

    /// Returns whether a unit is currently inside a facility region.
    ///
    /// Absence of containment state is treated as outside.
    pub fn is_inside(&self, unit_id: &UnitId, facility_id: &FacilityId) -> bool {
        self.zones
            .get(&(unit_id.clone(), facility_id.clone()))
            .map(|zone| *zone == Zone::Inside)
            .unwrap_or(false)
    }

    fn classify(&self, distance: f64, radius: f64) -> Zone {
        if distance <= radius {
            Zone::Inside
        } else if distance <= radius * self.approach_factor {
            Zone::Approaching
        } else {
            Zone::Outside
        }
    }
}

/// Maps a zone change to the event it fires, if any.
fn transition(previous: Zone, current: Zone) -> Option<GeofenceEventKind> {
    match (previous, current) {
        (Zone::Inside, Zone::Inside) => None,
        (_, Zone::Inside) => Some(GeofenceEventKind::Entered),
        (Zone::Inside, _) => Some(GeofenceEventKind::Exited),
        (Zone::Outside, Zone::Approaching) => Some(GeofenceEventKind::Approaching),
        _ => None,
    }
}

/// Great-circle distance between two coordinates in meters.
pub fn haversine_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}
