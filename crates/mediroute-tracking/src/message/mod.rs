//! Wire message types and validation.

pub mod types;
pub mod validator;

pub use types::{AckStatus, InboundMessage, OutboundMessage};
