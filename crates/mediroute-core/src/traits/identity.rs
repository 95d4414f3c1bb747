//! Identity collaborator trait for connection authentication.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::id::SubjectId;
use crate::types::role::SubjectRole;

/// Identity resolved from a verified credential.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VerifiedIdentity {
    /// The authenticated subject.
    pub subject_id: SubjectId,
    /// The subject's role.
    pub role: SubjectRole,
}

/// Verifies a bearer credential and returns the subject identity.
///
/// Implemented in `mediroute-auth` over JWT. Verification is side-effect
/// free and safe to retry.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + std::fmt::Debug + 'static {
    /// Verify a credential, returning the subject identity or an
    /// authentication error.
    async fn verify(&self, credential: &str) -> AppResult<VerifiedIdentity>;
}
