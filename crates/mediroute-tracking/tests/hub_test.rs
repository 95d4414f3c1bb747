//! End-to-end tests for the tracking hub over an in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use mediroute_core::config::tracking::TrackingConfig;
use mediroute_core::error::AppError;
use mediroute_core::result::AppResult;
use mediroute_core::traits::store::TrackingStore;
use mediroute_core::types::{
    GeofenceEvent, GeofenceEventKind, GeofenceRegion, LocationUpdate, SubjectId, SubjectRole,
    UnitId,
};
use mediroute_tracking::TrackingEngine;
use mediroute_tracking::message::types::{AckStatus, OutboundMessage};
use mediroute_tracking::session::authenticator::AuthenticatedSession;
use mediroute_tracking::session::handle::SessionHandle;

/// In-memory store. Flip `fail` to make every write return a database error.
#[derive(Debug, Default)]
struct MemoryStore {
    fail: AtomicBool,
    regions: Vec<GeofenceRegion>,
    locations: Mutex<Vec<LocationUpdate>>,
    geofence_events: Mutex<Vec<GeofenceEvent>>,
    transport_updates: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    fn with_regions(regions: Vec<GeofenceRegion>) -> Self {
        Self {
            regions,
            ..Self::default()
        }
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(AppError::database("Simulated storage outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn store_location(&self, update: &LocationUpdate) -> AppResult<()> {
        self.check()?;
        self.locations.lock().await.push(update.clone());
        Ok(())
    }

    async fn append_location_history(&self, _update: &LocationUpdate) -> AppResult<()> {
        self.check()
    }

    async fn store_geofence_event(&self, event: &GeofenceEvent) -> AppResult<()> {
        self.check()?;
        self.geofence_events.lock().await.push(event.clone());
        Ok(())
    }

    async fn update_transport_status(
        &self,
        transport_id: &str,
        status: &str,
        _assigned_unit_id: Option<&UnitId>,
    ) -> AppResult<()> {
        self.check()?;
        self.transport_updates
            .lock()
            .await
            .push((transport_id.to_string(), status.to_string()));
        Ok(())
    }

    async fn load_facility_regions(&self) -> AppResult<Vec<GeofenceRegion>> {
        Ok(self.regions.clone())
    }
}

/// Store whose writes block until two are in flight at once.
#[derive(Debug)]
struct BarrierStore {
    barrier: tokio::sync::Barrier,
}

#[async_trait]
impl TrackingStore for BarrierStore {
    async fn store_location(&self, _update: &LocationUpdate) -> AppResult<()> {
        self.barrier.wait().await;
        Ok(())
    }

    async fn append_location_history(&self, _update: &LocationUpdate) -> AppResult<()> {
        Ok(())
    }

    async fn store_geofence_event(&self, _event: &GeofenceEvent) -> AppResult<()> {
        Ok(())
    }

    async fn update_transport_status(
        &self,
        _transport_id: &str,
        _status: &str,
        _assigned_unit_id: Option<&UnitId>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn load_facility_regions(&self) -> AppResult<Vec<GeofenceRegion>> {
        Ok(Vec::new())
    }
}

async fn engine_with(store: Arc<MemoryStore>) -> TrackingEngine {
    let engine = TrackingEngine::new(TrackingConfig::default(), store);
    engine.start().await;
    engine
}

fn connect(
    engine: &TrackingEngine,
    role: SubjectRole,
) -> (Arc<SessionHandle>, mpsc::Receiver<OutboundMessage>) {
    let auth = match role {
        SubjectRole::Demo => AuthenticatedSession::Demo {
            subject_id: SubjectId::from_uuid(uuid::Uuid::nil()),
        },
        role => AuthenticatedSession::Verified {
            subject_id: SubjectId::new(),
            role,
        },
    };
    engine.manager().register(&auth)
}

fn location_frame(unit_id: &str, lat: f64, lon: f64) -> String {
    format!(
        r#"{{"type":"location_update","unit_id":"{unit_id}","latitude":{lat},"longitude":{lon},"speed":52.0,"heading":180.0,"battery_level":76.0,"signal_strength":null,"timestamp":"2026-08-29T10:15:00Z"}}"#
    )
}

fn drain(rx: &mut mpsc::Receiver<OutboundMessage>) -> Vec<OutboundMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

#[tokio::test]
async fn test_unit_subscriber_receives_location_broadcast() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(store.clone()).await;

    let (producer, mut producer_rx) = connect(&engine, SubjectRole::UnitDevice);
    let (dashboard, mut dashboard_rx) = connect(&engine, SubjectRole::Coordinator);

    engine
        .hub()
        .handle_inbound(&dashboard, r#"{"type":"subscribe_units","unit_ids":["AMB-1"]}"#)
        .await;
    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-1", 48.2082, 16.3738))
        .await;

    let dashboard_msgs = drain(&mut dashboard_rx);
    assert!(matches!(
        dashboard_msgs[0],
        OutboundMessage::Subscribed { .. }
    ));
    assert!(matches!(
        dashboard_msgs[1],
        OutboundMessage::UnitsStatus { .. }
    ));
    match &dashboard_msgs[2] {
        OutboundMessage::LocationUpdate(update) => {
            assert_eq!(update.unit_id, "AMB-1");
            assert_eq!(update.latitude, 48.2082);
        }
        other => panic!("expected location broadcast, got {other:?}"),
    }

    // The producer only gets the ack, not its own broadcast.
    let producer_msgs = drain(&mut producer_rx);
    assert_eq!(producer_msgs.len(), 1);
    assert!(matches!(
        producer_msgs[0],
        OutboundMessage::LocationConfirmed {
            status: AckStatus::Stored,
            ..
        }
    ));

    assert_eq!(store.locations.lock().await.len(), 1);
    engine.shutdown();
}

#[tokio::test]
async fn test_storage_outage_degrades_ack_but_broadcast_proceeds() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(store.clone()).await;

    let (producer, mut producer_rx) = connect(&engine, SubjectRole::UnitDevice);
    let (dashboard, mut dashboard_rx) = connect(&engine, SubjectRole::Coordinator);
    engine
        .hub()
        .handle_inbound(&dashboard, r#"{"type":"subscribe_global"}"#)
        .await;
    drain(&mut dashboard_rx);

    store.fail.store(true, Ordering::SeqCst);
    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-2", 48.1, 16.2))
        .await;

    let acks = drain(&mut producer_rx);
    assert!(matches!(
        acks[0],
        OutboundMessage::LocationConfirmed {
            status: AckStatus::Dropped,
            ..
        }
    ));

    // Passive subscribers never see the producer's persistence failure.
    let broadcasts = drain(&mut dashboard_rx);
    assert!(
        broadcasts
            .iter()
            .any(|m| matches!(m, OutboundMessage::LocationUpdate(_)))
    );
    engine.shutdown();
}

#[tokio::test]
async fn test_geofence_transition_reaches_facility_subscriber() {
    // 100 m radius around Vienna General.
    let store = Arc::new(MemoryStore::with_regions(vec![GeofenceRegion {
        facility_id: "HOSP-VIE".to_string(),
        center_latitude: 48.2200,
        center_longitude: 16.3500,
        radius_meters: 100.0,
    }]));
    let engine = engine_with(store.clone()).await;

    let (producer, _producer_rx) = connect(&engine, SubjectRole::UnitDevice);
    let (dashboard, mut dashboard_rx) = connect(&engine, SubjectRole::Coordinator);
    engine
        .hub()
        .handle_inbound(
            &dashboard,
            r#"{"type":"subscribe_facilities","facility_ids":["HOSP-VIE"]}"#,
        )
        .await;
    drain(&mut dashboard_rx);

    // Far away, then inside the region.
    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-3", 48.1000, 16.3500))
        .await;
    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-3", 48.2200, 16.3500))
        .await;

    let msgs = drain(&mut dashboard_rx);
    match msgs.as_slice() {
        [OutboundMessage::GeofenceEvent(event)] => {
            assert_eq!(event.kind, GeofenceEventKind::Entered);
            assert_eq!(event.unit_id, "AMB-3");
            assert_eq!(event.facility_id, "HOSP-VIE");
        }
        other => panic!("expected a single geofence event, got {other:?}"),
    }

    assert_eq!(store.geofence_events.lock().await.len(), 1);
    engine.shutdown();
}

#[tokio::test]
async fn test_geofence_event_precedes_raw_update_on_global() {
    let store = Arc::new(MemoryStore::with_regions(vec![GeofenceRegion {
        facility_id: "HOSP-VIE".to_string(),
        center_latitude: 48.2200,
        center_longitude: 16.3500,
        radius_meters: 100.0,
    }]));
    let engine = engine_with(store.clone()).await;

    let (producer, _producer_rx) = connect(&engine, SubjectRole::UnitDevice);
    let (dashboard, mut dashboard_rx) = connect(&engine, SubjectRole::Coordinator);
    engine
        .hub()
        .handle_inbound(&dashboard, r#"{"type":"subscribe_global"}"#)
        .await;

    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-3", 48.1000, 16.3500))
        .await;
    drain(&mut dashboard_rx);

    // The crossing update must arrive as transition first, position second.
    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-3", 48.2200, 16.3500))
        .await;

    let msgs = drain(&mut dashboard_rx);
    match msgs.as_slice() {
        [
            OutboundMessage::GeofenceEvent(event),
            OutboundMessage::LocationUpdate(update),
        ] => {
            assert_eq!(event.kind, GeofenceEventKind::Entered);
            assert_eq!(update.unit_id, "AMB-3");
        }
        other => panic!("expected geofence event then location update, got {other:?}"),
    }

    engine.shutdown();
}

#[tokio::test]
async fn test_transport_update_fans_out_globally() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(store.clone()).await;

    let (coordinator, mut coordinator_rx) = connect(&engine, SubjectRole::Coordinator);
    let (watcher, mut watcher_rx) = connect(&engine, SubjectRole::Admin);
    engine
        .hub()
        .handle_inbound(&watcher, r#"{"type":"subscribe_global"}"#)
        .await;
    drain(&mut watcher_rx);

    engine
        .hub()
        .handle_inbound(
            &coordinator,
            r#"{"type":"transport_update","id":"TR-9","status":"en_route","assigned_unit_id":"AMB-1","timestamp":"2026-08-29T10:20:00Z"}"#,
        )
        .await;

    let acks = drain(&mut coordinator_rx);
    assert!(matches!(
        acks[0],
        OutboundMessage::TransportConfirmed {
            status: AckStatus::Stored,
            ..
        }
    ));

    let broadcasts = drain(&mut watcher_rx);
    match &broadcasts[0] {
        OutboundMessage::TransportUpdate(update) => {
            assert_eq!(update.id, "TR-9");
            assert_eq!(update.status, "en_route");
        }
        other => panic!("expected transport broadcast, got {other:?}"),
    }

    assert_eq!(
        store.transport_updates.lock().await.as_slice(),
        &[("TR-9".to_string(), "en_route".to_string())]
    );
    engine.shutdown();
}

#[tokio::test]
async fn test_invalid_coordinates_rejected_without_broadcast() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(store.clone()).await;

    let (producer, mut producer_rx) = connect(&engine, SubjectRole::UnitDevice);
    let (dashboard, mut dashboard_rx) = connect(&engine, SubjectRole::Coordinator);
    engine
        .hub()
        .handle_inbound(&dashboard, r#"{"type":"subscribe_global"}"#)
        .await;
    drain(&mut dashboard_rx);

    engine
        .hub()
        .handle_inbound(&producer, &location_frame("AMB-4", 95.0, 16.2))
        .await;

    let msgs = drain(&mut producer_rx);
    assert!(matches!(msgs[0], OutboundMessage::LocationError { .. }));
    assert!(drain(&mut dashboard_rx).is_empty());
    assert!(store.locations.lock().await.is_empty());
    engine.shutdown();
}

#[tokio::test]
async fn test_malformed_frame_yields_error_only() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(store).await;

    let (session, mut rx) = connect(&engine, SubjectRole::Coordinator);
    engine.hub().handle_inbound(&session, "not json").await;
    engine
        .hub()
        .handle_inbound(&session, r#"{"type":"launch_missiles"}"#)
        .await;

    let msgs = drain(&mut rx);
    assert_eq!(msgs.len(), 2);
    assert!(
        msgs.iter()
            .all(|m| matches!(m, OutboundMessage::Error { .. }))
    );
    engine.shutdown();
}

#[tokio::test]
async fn test_demo_session_may_not_publish_geofence_events() {
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(store.clone()).await;

    let (demo, mut demo_rx) = connect(&engine, SubjectRole::Demo);
    engine
        .hub()
        .handle_inbound(
            &demo,
            r#"{"type":"geofence_event","unit_id":"AMB-1","facility_id":"HOSP-VIE","event_type":"ENTERED","latitude":48.22,"longitude":16.35,"timestamp":"2026-08-29T10:25:00Z"}"#,
        )
        .await;

    let msgs = drain(&mut demo_rx);
    match &msgs[0] {
        OutboundMessage::Error { code, .. } => assert_eq!(code, "not_authorized"),
        other => panic!("expected error frame, got {other:?}"),
    }
    assert!(store.geofence_events.lock().await.is_empty());
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_updates_for_distinct_units_do_not_serialize() {
    // Both writes must be in flight at once for the barrier to release;
    // a hub that serialized producers behind the store would deadlock here.
    let store = Arc::new(BarrierStore {
        barrier: tokio::sync::Barrier::new(2),
    });
    let engine = Arc::new(TrackingEngine::new(TrackingConfig::default(), store));
    engine.start().await;

    let (a, _rx_a) = connect(&engine, SubjectRole::UnitDevice);
    let (b, _rx_b) = connect(&engine, SubjectRole::UnitDevice);

    let engine_a = engine.clone();
    let task_a = tokio::spawn(async move {
        engine_a
            .hub()
            .handle_inbound(&a, &location_frame("AMB-7", 48.1, 16.1))
            .await;
    });
    let engine_b = engine.clone();
    let task_b = tokio::spawn(async move {
        engine_b
            .hub()
            .handle_inbound(&b, &location_frame("AMB-8", 48.2, 16.2))
            .await;
    });

    let joined = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        task_a.await.unwrap();
        task_b.await.unwrap();
    })
    .await;
    assert!(joined.is_ok(), "concurrent updates serialized behind the store");
    engine.shutdown();
}

#[tokio::test]
async fn test_subscription_limit_enforced() {
    let store = Arc::new(MemoryStore::default());
    let engine = TrackingEngine::new(
        TrackingConfig {
            max_subscriptions_per_session: 2,
            ..TrackingConfig::default()
        },
        store,
    );
    engine.start().await;

    let (session, mut rx) = connect(&engine, SubjectRole::Coordinator);
    engine
        .hub()
        .handle_inbound(&session, r#"{"type":"subscribe_units","unit_ids":["U1","U2"]}"#)
        .await;
    engine
        .hub()
        .handle_inbound(&session, r#"{"type":"subscribe_units","unit_ids":["U3"]}"#)
        .await;

    let msgs = drain(&mut rx);
    let last = msgs.last().unwrap();
    match last {
        OutboundMessage::Error { code, .. } => assert_eq!(code, "subscription_limit"),
        other => panic!("expected limit error, got {other:?}"),
    }
    engine.shutdown();
}
