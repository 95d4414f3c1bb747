//! Concrete repository implementations.

pub mod tracking;

pub use tracking::TrackingRepository;
