//! # mediroute-api
//!
//! HTTP layer for MediRoute built on Axum: health endpoints, error mapping
//! and the WebSocket upgrade into the tracking engine.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
