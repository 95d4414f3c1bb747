//! Tracking persistence repository.

use async_trait::async_trait;
use sqlx::PgPool;

use mediroute_core::error::{AppError, ErrorKind};
use mediroute_core::result::AppResult;
use mediroute_core::traits::store::TrackingStore;
use mediroute_core::types::geofence::{GeofenceEvent, GeofenceRegion};
use mediroute_core::types::id::UnitId;
use mediroute_core::types::telemetry::LocationUpdate;

/// Row mapping for facility geofence regions.
#[derive(Debug, Clone, sqlx::FromRow)]
struct RegionRow {
    facility_id: String,
    center_latitude: f64,
    center_longitude: f64,
    radius_meters: f64,
}

impl From<RegionRow> for GeofenceRegion {
    fn from(row: RegionRow) -> Self {
        Self {
            facility_id: row.facility_id,
            center_latitude: row.center_latitude,
            center_longitude: row.center_longitude,
            radius_meters: row.radius_meters,
        }
    }
}

/// Repository for unit positions, geofence events, and transport status.
#[derive(Debug, Clone)]
pub struct TrackingRepository {
    pool: PgPool,
}

impl TrackingRepository {
    /// Create a new tracking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackingStore for TrackingRepository {
    async fn store_location(&self, update: &LocationUpdate) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO unit_positions \
             (unit_id, latitude, longitude, speed, heading, battery_level, signal_strength, reported_at, received_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (unit_id) DO UPDATE SET \
             latitude = EXCLUDED.latitude, longitude = EXCLUDED.longitude, \
             speed = EXCLUDED.speed, heading = EXCLUDED.heading, \
             battery_level = EXCLUDED.battery_level, signal_strength = EXCLUDED.signal_strength, \
             reported_at = EXCLUDED.reported_at, received_at = EXCLUDED.received_at",
        )
        .bind(&update.unit_id)
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(update.speed)
        .bind(update.heading)
        .bind(update.battery_level)
        .bind(update.signal_strength)
        .bind(update.timestamp)
        .bind(update.received_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store location", e))?;

        Ok(())
    }

    async fn append_location_history(&self, update: &LocationUpdate) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO unit_position_history \
             (unit_id, latitude, longitude, speed, heading, battery_level, signal_strength, reported_at, received_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&update.unit_id)
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(update.speed)
        .bind(update.heading)
        .bind(update.battery_level)
        .bind(update.signal_strength)
        .bind(update.timestamp)
        .bind(update.received_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to append location history", e)
        })?;

        Ok(())
    }

    async fn store_geofence_event(&self, event: &GeofenceEvent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO geofence_events \
             (unit_id, facility_id, event_type, latitude, longitude, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&event.unit_id)
        .bind(&event.facility_id)
        .bind(event.kind.as_str())
        .bind(event.latitude)
        .bind(event.longitude)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store geofence event", e)
        })?;

        Ok(())
    }

    async fn update_transport_status(
        &self,
        transport_id: &str,
        status: &str,
        assigned_unit_id: Option<&UnitId>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE transports SET status = $2, \
             assigned_unit_id = COALESCE($3, assigned_unit_id), \
             updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(transport_id)
        .bind(status)
        .bind(assigned_unit_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update transport status", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Transport '{transport_id}' not found"
            )));
        }

        Ok(())
    }

    async fn load_facility_regions(&self) -> AppResult<Vec<GeofenceRegion>> {
        let rows = sqlx::query_as::<_, RegionRow>(
            "SELECT id AS facility_id, latitude AS center_latitude, \
             longitude AS center_longitude, geofence_radius_meters AS radius_meters \
             FROM facilities \
             WHERE geofence_radius_meters IS NOT NULL AND geofence_radius_meters > 0",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load facility regions", e)
        })?;

        Ok(rows.into_iter().map(GeofenceRegion::from).collect())
    }
}
