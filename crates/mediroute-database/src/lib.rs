//! # mediroute-database
//!
//! PostgreSQL connection management and the concrete
//! [`TrackingStore`](mediroute_core::traits::TrackingStore) implementation
//! backing the real-time tracking hub.

pub mod connection;
pub mod repositories;

pub use connection::{DatabaseHealth, DatabasePool};
pub use repositories::tracking::TrackingRepository;
