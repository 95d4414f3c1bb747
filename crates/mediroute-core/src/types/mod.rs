//! Shared domain types for MediRoute.

pub mod geofence;
pub mod id;
pub mod role;
pub mod telemetry;
pub mod transport;

pub use geofence::{GeofenceEvent, GeofenceEventKind, GeofenceRegion};
pub use id::{FacilityId, SessionId, SubjectId, UnitId};
pub use role::SubjectRole;
pub use telemetry::{LocationUpdate, UnitStatus};
pub use transport::TransportUpdate;
