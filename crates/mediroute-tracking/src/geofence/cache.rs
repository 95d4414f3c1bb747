//! Read-mostly facility region cache.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use mediroute_core::traits::store::TrackingStore;
use mediroute_core::types::GeofenceRegion;

/// Caches the facility geofence region set.
///
/// The whole set is replaced atomically on refresh; readers clone the inner
/// `Arc` and always observe either the old or the new complete set, never a
/// partial update.
#[derive(Debug)]
pub struct RegionCache {
    regions: RwLock<Arc<Vec<GeofenceRegion>>>,
}

impl RegionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            regions: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Returns the current region set snapshot.
    pub async fn snapshot(&self) -> Arc<Vec<GeofenceRegion>> {
        self.regions.read().await.clone()
    }

    /// Replaces the cached set with a freshly loaded one.
    ///
    /// A load failure keeps the previous set so a transient storage outage
    /// never blanks the cache.
    pub async fn refresh(&self, store: &dyn TrackingStore) {
        match store.load_facility_regions().await {
            Ok(fresh) => {
                let count = fresh.len();
                *self.regions.write().await = Arc::new(fresh);
                debug!(regions = count, "Facility region cache refreshed");
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh facility regions, keeping previous set");
            }
        }
    }
}

impl Default for RegionCache {
    fn default() -> Self {
        Self::new()
    }
}
