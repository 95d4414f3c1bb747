//! # mediroute-auth
//!
//! JWT credential issuance and verification for MediRoute. Implements the
//! [`IdentityVerifier`](mediroute_core::traits::IdentityVerifier) collaborator
//! consumed by the tracking hub.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
