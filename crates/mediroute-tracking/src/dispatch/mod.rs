//! Broadcast fan-out.

pub mod dispatcher;

pub use dispatcher::BroadcastDispatcher;
