//! Geofence transition detection.

pub mod cache;
pub mod evaluator;

pub use cache::RegionCache;
pub use evaluator::GeofenceEvaluator;
