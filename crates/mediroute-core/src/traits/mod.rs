//! Core traits defined in `mediroute-core` and implemented by other crates.

pub mod identity;
pub mod store;

pub use identity::{IdentityVerifier, VerifiedIdentity};
pub use store::TrackingStore;
