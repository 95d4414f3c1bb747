//! # mediroute-tracking
//!
//! Real-time fleet tracking engine for MediRoute. Provides:
//!
//! - Session management for long-lived bidirectional connections
//! - Topic-based subscriptions (per-unit, per-facility, global)
//! - Geofence ENTER/EXIT/APPROACHING transition detection
//! - Non-blocking broadcast fan-out with per-subscriber FIFO ordering
//! - Heartbeat emission and stale-session eviction

pub mod dispatch;
pub mod engine;
pub mod geofence;
pub mod hub;
pub mod liveness;
pub mod message;
pub mod metrics;
pub mod session;
pub mod topic;

pub use dispatch::BroadcastDispatcher;
pub use engine::TrackingEngine;
pub use geofence::evaluator::GeofenceEvaluator;
pub use hub::TrackingHub;
pub use liveness::LivenessMonitor;
pub use session::manager::SessionManager;
pub use topic::registry::TopicRegistry;
