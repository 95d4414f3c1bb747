//! Session lifecycle: authentication, handles, pooling, management.

pub mod authenticator;
pub mod handle;
pub mod manager;
pub mod pool;

pub use authenticator::{AuthenticatedSession, SessionAuthenticator};
pub use handle::SessionHandle;
pub use manager::SessionManager;
pub use pool::SessionPool;
