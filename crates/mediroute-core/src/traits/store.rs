//! Persistence collaborator trait for the tracking hub.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::geofence::{GeofenceEvent, GeofenceRegion};
use crate::types::id::UnitId;
use crate::types::telemetry::LocationUpdate;

/// Persistence operations the tracking hub delegates to storage.
///
/// The [`TrackingStore`] trait is defined here in `mediroute-core` and
/// implemented in `mediroute-database`. Storage is best-effort for the live
/// tracking path: a failing store must never block the in-memory broadcast,
/// so callers log and report failures without propagating them to passive
/// subscribers.
#[async_trait]
pub trait TrackingStore: Send + Sync + std::fmt::Debug + 'static {
    /// Upsert the latest known position for a unit.
    async fn store_location(&self, update: &LocationUpdate) -> AppResult<()>;

    /// Append the observation to the unit's position history.
    async fn append_location_history(&self, update: &LocationUpdate) -> AppResult<()>;

    /// Record a geofence transition event.
    async fn store_geofence_event(&self, event: &GeofenceEvent) -> AppResult<()>;

    /// Update the status (and optionally the assigned unit) of a transport.
    async fn update_transport_status(
        &self,
        transport_id: &str,
        status: &str,
        assigned_unit_id: Option<&UnitId>,
    ) -> AppResult<()>;

    /// Load the current set of facility geofence regions.
    async fn load_facility_regions(&self) -> AppResult<Vec<GeofenceRegion>>;
}
