//! # mediroute-core
//!
//! Core crate for MediRoute. Contains configuration schemas, domain types
//! shared across the platform, collaborator traits, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other MediRoute crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
