//! Engine wiring for the tracking subsystem.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use mediroute_core::config::tracking::TrackingConfig;
use mediroute_core::traits::store::TrackingStore;

use crate::dispatch::dispatcher::BroadcastDispatcher;
use crate::geofence::cache::RegionCache;
use crate::geofence::evaluator::GeofenceEvaluator;
use crate::hub::TrackingHub;
use crate::liveness::LivenessMonitor;
use crate::metrics::TrackingMetrics;
use crate::session::manager::SessionManager;
use crate::session::pool::SessionPool;
use crate::topic::registry::TopicRegistry;

/// Owns the tracking subsystem: the hub, the session manager, the liveness
/// monitor and the region refresh task, plus the shutdown signal that stops
/// them all.
#[derive(Debug)]
pub struct TrackingEngine {
    hub: Arc<TrackingHub>,
    manager: Arc<SessionManager>,
    liveness: Arc<LivenessMonitor>,
    regions: Arc<RegionCache>,
    metrics: Arc<TrackingMetrics>,
    store: Arc<dyn TrackingStore>,
    shutdown_tx: broadcast::Sender<()>,
    region_refresh_interval: Duration,
}

impl TrackingEngine {
    /// Assembles the subsystem. Background tasks are not started until
    /// [`TrackingEngine::start`].
    pub fn new(config: TrackingConfig, store: Arc<dyn TrackingStore>) -> Self {
        let registry = Arc::new(TopicRegistry::new());
        let pool = Arc::new(SessionPool::new());
        let metrics = Arc::new(TrackingMetrics::new());
        let regions = Arc::new(RegionCache::new());

        let dispatcher = Arc::new(BroadcastDispatcher::new(
            registry.clone(),
            pool.clone(),
            metrics.clone(),
        ));
        let hub = Arc::new(TrackingHub::new(
            registry.clone(),
            dispatcher,
            GeofenceEvaluator::new(config.approach_factor),
            regions.clone(),
            store.clone(),
            metrics.clone(),
            config.max_subscriptions_per_session,
        ));
        let manager = Arc::new(SessionManager::new(
            config.clone(),
            pool,
            registry.clone(),
            metrics.clone(),
        ));
        let liveness = Arc::new(LivenessMonitor::new(
            &config,
            manager.clone(),
            registry,
            metrics.clone(),
        ));

        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            hub,
            manager,
            liveness,
            regions,
            metrics,
            store,
            shutdown_tx,
            region_refresh_interval: Duration::from_secs(config.region_refresh_interval_seconds),
        }
    }

    /// Loads the initial region set and spawns the background tasks.
    pub async fn start(&self) {
        self.regions.refresh(self.store.as_ref()).await;

        tokio::spawn(self.liveness.clone().run(self.shutdown_tx.subscribe()));

        let regions = self.regions.clone();
        let store = self.store.clone();
        let interval = self.region_refresh_interval;
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        regions.refresh(store.as_ref()).await;
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });

        info!("Tracking engine started");
    }

    /// Signals background tasks to stop and tears down all sessions.
    pub fn shutdown(&self) {
        // Errors only mean no task is listening anymore.
        let _ = self.shutdown_tx.send(());
        self.manager.close_all();
        info!("Tracking engine stopped");
    }

    /// The message hub.
    pub fn hub(&self) -> &Arc<TrackingHub> {
        &self.hub
    }

    /// The session manager.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Metrics counters.
    pub fn metrics(&self) -> &Arc<TrackingMetrics> {
        &self.metrics
    }
}
