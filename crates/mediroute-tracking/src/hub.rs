//! Central message hub.
//!
//! Routes every inbound frame to its handler: subscription changes go to the
//! topic registry, telemetry flows through validation, persistence, geofence
//! evaluation and broadcast, and transport updates fan out globally. All
//! failures on the live path degrade to an acknowledgement status or an
//! error frame on the producing session only; passive subscribers never see
//! a producer's failure.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};

use mediroute_core::error::AppError;
use mediroute_core::traits::store::TrackingStore;
use mediroute_core::types::{
    GeofenceEvent, GeofenceEventKind, LocationUpdate, TransportUpdate, UnitId, UnitStatus,
};

use crate::dispatch::dispatcher::BroadcastDispatcher;
use crate::geofence::cache::RegionCache;
use crate::geofence::evaluator::GeofenceEvaluator;
use crate::message::types::{AckStatus, InboundMessage, OutboundMessage};
use crate::message::validator;
use crate::metrics::TrackingMetrics;
use crate::session::handle::SessionHandle;
use crate::topic::registry::TopicRegistry;
use crate::topic::topic::Topic;

/// The tracking hub.
#[derive(Debug)]
pub struct TrackingHub {
    /// Topic registry.
    registry: Arc<TopicRegistry>,
    /// Broadcast dispatcher.
    dispatcher: Arc<BroadcastDispatcher>,
    /// Geofence transition evaluator.
    evaluator: GeofenceEvaluator,
    /// Facility region cache.
    regions: Arc<RegionCache>,
    /// Persistence backend.
    store: Arc<dyn TrackingStore>,
    /// Metrics.
    metrics: Arc<TrackingMetrics>,
    /// Last known position per unit, for `units_status` snapshots.
    last_positions: DashMap<UnitId, LocationUpdate>,
    /// Per-session subscription ceiling.
    max_subscriptions: usize,
}

impl TrackingHub {
    /// Creates a new hub.
    pub fn new(
        registry: Arc<TopicRegistry>,
        dispatcher: Arc<BroadcastDispatcher>,
        evaluator: GeofenceEvaluator,
        regions: Arc<RegionCache>,
        store: Arc<dyn TrackingStore>,
        metrics: Arc<TrackingMetrics>,
        max_subscriptions: usize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            evaluator,
            regions,
            store,
            metrics,
            last_positions: DashMap::new(),
            max_subscriptions,
        }
    }

    /// Handles one raw inbound frame from a session.
    ///
    /// Malformed frames produce an error frame on the sending session and
    /// leave all hub state untouched.
    pub async fn handle_inbound(&self, session: &Arc<SessionHandle>, raw: &str) {
        self.metrics.message_received();

        if let Err(e) = validator::validate_raw(raw) {
            self.reply_error(session, "invalid_message", &e);
            return;
        }

        let message: InboundMessage = match serde_json::from_str(raw) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(session_id = %session.id, error = %e, "Unparseable inbound frame");
                self.reply_error(
                    session,
                    "invalid_message",
                    &AppError::validation(format!("Malformed message: {e}")),
                );
                return;
            }
        };

        match message {
            InboundMessage::SubscribeUnits { unit_ids } => {
                self.handle_subscribe_units(session, unit_ids).await;
            }
            InboundMessage::SubscribeFacilities { facility_ids } => {
                let topics = facility_ids.into_iter().map(Topic::facility).collect();
                self.handle_subscribe(session, topics);
            }
            InboundMessage::SubscribeGlobal => {
                self.handle_subscribe(session, vec![Topic::Global]);
            }
            InboundMessage::LocationUpdate {
                unit_id,
                latitude,
                longitude,
                speed,
                heading,
                battery_level,
                signal_strength,
                timestamp,
            } => {
                let update = LocationUpdate {
                    unit_id,
                    latitude,
                    longitude,
                    speed,
                    heading,
                    battery_level,
                    signal_strength,
                    timestamp,
                    received_at: Utc::now(),
                };
                self.handle_location_update(session, update).await;
            }
            InboundMessage::TransportUpdate {
                id,
                status,
                assigned_unit_id,
                timestamp,
            } => {
                let update = TransportUpdate {
                    id,
                    status,
                    assigned_unit_id,
                    timestamp,
                };
                self.handle_transport_update(session, update).await;
            }
            InboundMessage::GeofenceEvent {
                unit_id,
                facility_id,
                event_type,
                latitude,
                longitude,
                timestamp,
            } => {
                self.handle_external_geofence_event(
                    session,
                    unit_id,
                    facility_id,
                    &event_type,
                    latitude,
                    longitude,
                    timestamp,
                )
                .await;
            }
            InboundMessage::Pong { .. } => {
                session.record_pong();
            }
        }
    }

    /// Subscribes to per-unit topics and sends a last-known-status snapshot.
    async fn handle_subscribe_units(&self, session: &Arc<SessionHandle>, unit_ids: Vec<UnitId>) {
        let mut topics = Vec::with_capacity(unit_ids.len());
        for id in &unit_ids {
            if let Err(e) = validator::validate_id(id) {
                self.reply_error(session, "invalid_subscription", &e);
                return;
            }
            topics.push(Topic::unit(id.clone()));
        }

        if !self.handle_subscribe(session, topics) {
            return;
        }

        // Snapshot of last known positions so dashboards render immediately
        // instead of waiting for the next live update.
        let units: Vec<UnitStatus> = unit_ids
            .iter()
            .filter_map(|id| self.last_positions.get(id).map(|u| UnitStatus::from(&*u)))
            .collect();
        self.send(session, OutboundMessage::UnitsStatus { units });
    }

    /// Applies a batch of subscriptions and confirms the session's full
    /// topic set. Returns `false` when the batch was rejected.
    fn handle_subscribe(&self, session: &Arc<SessionHandle>, topics: Vec<Topic>) -> bool {
        for topic in &topics {
            if let Topic::Facility(id) = topic {
                if let Err(e) = validator::validate_id(id) {
                    self.reply_error(session, "invalid_subscription", &e);
                    return false;
                }
            }
        }

        let existing = self.registry.topics_of(session.id);
        let added = topics.iter().filter(|t| !existing.contains(t)).count();
        if existing.len() + added > self.max_subscriptions {
            self.reply_error(
                session,
                "subscription_limit",
                &AppError::validation(format!(
                    "Subscription limit of {} exceeded",
                    self.max_subscriptions
                )),
            );
            return false;
        }

        for topic in topics {
            self.registry.subscribe(topic, session.id);
        }

        let confirmed: Vec<String> = self
            .registry
            .topics_of(session.id)
            .iter()
            .map(|t| t.to_string())
            .collect();
        self.send(session, OutboundMessage::Subscribed { topics: confirmed });
        true
    }

    /// Processes a telemetry observation end to end.
    ///
    /// Persistence is best-effort: a failing store downgrades the ack to
    /// `dropped` but never suppresses the live broadcast or the geofence
    /// evaluation.
    async fn handle_location_update(&self, session: &Arc<SessionHandle>, update: LocationUpdate) {
        if let Err(e) = validator::validate_id(&update.unit_id) {
            self.send(
                session,
                OutboundMessage::LocationError {
                    unit_id: update.unit_id.clone(),
                    reason: e.to_string(),
                },
            );
            return;
        }
        if let Err(e) = validator::validate_coordinates(update.latitude, update.longitude) {
            self.send(
                session,
                OutboundMessage::LocationError {
                    unit_id: update.unit_id.clone(),
                    reason: e.to_string(),
                },
            );
            return;
        }

        let status = self.persist_location(&update).await;

        self.last_positions
            .insert(update.unit_id.clone(), update.clone());

        // Transition events go out before the position that caused them,
        // so a global subscriber sees the crossing first.
        let regions = self.regions.snapshot().await;
        let events = self
            .evaluator
            .evaluate(&update.unit_id, update.latitude, update.longitude, &regions);
        self.metrics.geofence_events(events.len() as u64);
        for event in events {
            self.publish_geofence_event(event, true).await;
        }

        let unit_topic = Topic::unit(update.unit_id.clone());
        let broadcast = OutboundMessage::LocationUpdate(update.clone());
        self.dispatcher.publish(&unit_topic, &broadcast);
        self.dispatcher.publish(&Topic::Global, &broadcast);

        self.send(
            session,
            OutboundMessage::LocationConfirmed {
                unit_id: update.unit_id,
                timestamp: update.received_at,
                status,
            },
        );
    }

    /// Processes a transport status change and fans it out globally.
    async fn handle_transport_update(&self, session: &Arc<SessionHandle>, update: TransportUpdate) {
        if let Err(e) = validator::validate_id(&update.id) {
            self.send(
                session,
                OutboundMessage::TransportError {
                    id: update.id.clone(),
                    reason: e.to_string(),
                },
            );
            return;
        }
        if update.status.trim().is_empty() {
            self.send(
                session,
                OutboundMessage::TransportError {
                    id: update.id.clone(),
                    reason: "Transport status must not be empty".to_string(),
                },
            );
            return;
        }

        let status = match self
            .store
            .update_transport_status(
                &update.id,
                &update.status,
                update.assigned_unit_id.as_ref(),
            )
            .await
        {
            Ok(()) => AckStatus::Stored,
            Err(e) => {
                warn!(
                    transport_id = %update.id,
                    error = %e,
                    "Failed to persist transport update"
                );
                AckStatus::Dropped
            }
        };

        self.dispatcher
            .publish(&Topic::Global, &OutboundMessage::TransportUpdate(update.clone()));

        self.send(
            session,
            OutboundMessage::TransportConfirmed {
                id: update.id,
                timestamp: Utc::now(),
                status,
            },
        );
    }

    /// Accepts a geofence event from a trusted external producer.
    ///
    /// Demo sessions are read-mostly and may not inject authoritative
    /// geofence events.
    #[allow(clippy::too_many_arguments)]
    async fn handle_external_geofence_event(
        &self,
        session: &Arc<SessionHandle>,
        unit_id: UnitId,
        facility_id: String,
        event_type: &str,
        latitude: f64,
        longitude: f64,
        timestamp: chrono::DateTime<Utc>,
    ) {
        if session.is_demo {
            self.reply_error(
                session,
                "not_authorized",
                &AppError::authorization("Demo sessions may not publish geofence events"),
            );
            return;
        }

        let kind = match GeofenceEventKind::from_str(event_type) {
            Ok(kind) => kind,
            Err(e) => {
                self.reply_error(session, "invalid_message", &e);
                return;
            }
        };
        if let Err(e) = validator::validate_id(&unit_id) {
            self.reply_error(session, "invalid_message", &e);
            return;
        }
        if let Err(e) = validator::validate_id(&facility_id) {
            self.reply_error(session, "invalid_message", &e);
            return;
        }
        if let Err(e) = validator::validate_coordinates(latitude, longitude) {
            self.reply_error(session, "invalid_message", &e);
            return;
        }

        let event = GeofenceEvent {
            unit_id,
            facility_id,
            kind,
            latitude,
            longitude,
            timestamp,
        };
        self.metrics.geofence_events(1);
        self.publish_geofence_event(event, true).await;
    }

    /// Returns a snapshot of last known unit statuses (health endpoint).
    pub fn tracked_unit_count(&self) -> usize {
        self.last_positions.len()
    }

    /// Persists a geofence event (best-effort) and broadcasts it to the
    /// facility topic and the global topic.
    async fn publish_geofence_event(&self, event: GeofenceEvent, persist: bool) {
        if persist {
            if let Err(e) = self.store.store_geofence_event(&event).await {
                warn!(
                    unit_id = %event.unit_id,
                    facility_id = %event.facility_id,
                    kind = %event.kind,
                    error = %e,
                    "Failed to persist geofence event"
                );
            }
        }

        debug!(
            unit_id = %event.unit_id,
            facility_id = %event.facility_id,
            kind = %event.kind,
            "Geofence transition"
        );

        let facility_topic = Topic::facility(event.facility_id.clone());
        let broadcast = OutboundMessage::GeofenceEvent(event);
        self.dispatcher.publish(&facility_topic, &broadcast);
        self.dispatcher.publish(&Topic::Global, &broadcast);
    }

    /// Stores the position and its history row, reporting the combined
    /// outcome as the ack status.
    async fn persist_location(&self, update: &LocationUpdate) -> AckStatus {
        let stored = match self.store.store_location(update).await {
            Ok(()) => true,
            Err(e) => {
                warn!(unit_id = %update.unit_id, error = %e, "Failed to store location");
                false
            }
        };
        let appended = match self.store.append_location_history(update).await {
            Ok(()) => true,
            Err(e) => {
                warn!(unit_id = %update.unit_id, error = %e, "Failed to append location history");
                false
            }
        };

        if stored && appended {
            AckStatus::Stored
        } else {
            AckStatus::Dropped
        }
    }

    fn reply_error(&self, session: &Arc<SessionHandle>, code: &str, error: &AppError) {
        self.send(
            session,
            OutboundMessage::Error {
                code: code.to_string(),
                message: error.to_string(),
            },
        );
    }

    fn send(&self, session: &Arc<SessionHandle>, message: OutboundMessage) {
        if session.send(message) {
            self.metrics.messages_sent(1);
        }
    }
}
