//! Connection authentication — validates credentials before registration.

use std::sync::Arc;

use uuid::Uuid;

use mediroute_core::config::auth::AuthConfig;
use mediroute_core::error::AppError;
use mediroute_core::traits::identity::IdentityVerifier;
use mediroute_core::types::{SubjectId, SubjectRole};

/// The sentinel credential admitting a fixed demo coordinator.
const DEMO_CREDENTIAL: &str = "demo";

/// Fixed subject ID for the demo session.
const DEMO_SUBJECT: Uuid = Uuid::nil();

/// Identity attached to a connection after successful authentication.
///
/// Produced once by the authenticator; downstream code never re-interprets
/// the raw credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatedSession {
    /// Admitted via the demo sentinel.
    Demo {
        /// Fixed demo subject.
        subject_id: SubjectId,
    },
    /// Verified against the identity collaborator.
    Verified {
        /// The authenticated subject.
        subject_id: SubjectId,
        /// The subject's role.
        role: SubjectRole,
    },
}

impl AuthenticatedSession {
    /// The subject ID regardless of variant.
    pub fn subject_id(&self) -> SubjectId {
        match self {
            Self::Demo { subject_id } => *subject_id,
            Self::Verified { subject_id, .. } => *subject_id,
        }
    }

    /// The effective role. Demo sessions act as coordinators; demo-ness
    /// itself travels as the variant, not the role.
    pub fn role(&self) -> SubjectRole {
        match self {
            Self::Demo { .. } => SubjectRole::Coordinator,
            Self::Verified { role, .. } => *role,
        }
    }

    /// Whether this session was admitted via the demo sentinel.
    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Demo { .. })
    }
}

/// Authenticates inbound connections before any subscription is allowed.
///
/// Authentication is side-effect free: a failure admits nothing and the
/// caller may retry safely.
#[derive(Debug, Clone)]
pub struct SessionAuthenticator {
    /// Identity collaborator for non-sentinel credentials.
    verifier: Arc<dyn IdentityVerifier>,
    /// Whether the demo sentinel is accepted.
    allow_demo: bool,
}

impl SessionAuthenticator {
    /// Creates a new authenticator.
    pub fn new(verifier: Arc<dyn IdentityVerifier>, config: &AuthConfig) -> Self {
        Self {
            verifier,
            allow_demo: config.allow_demo_credential,
        }
    }

    /// Authenticates a bearer credential.
    pub async fn authenticate(&self, credential: &str) -> Result<AuthenticatedSession, AppError> {
        if credential == DEMO_CREDENTIAL {
            if self.allow_demo {
                return Ok(AuthenticatedSession::Demo {
                    subject_id: SubjectId::from_uuid(DEMO_SUBJECT),
                });
            }
            return Err(AppError::authentication("Demo credential is disabled"));
        }

        let identity = self.verifier.verify(credential).await?;
        Ok(AuthenticatedSession::Verified {
            subject_id: identity.subject_id,
            role: identity.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mediroute_core::traits::identity::VerifiedIdentity;

    #[derive(Debug)]
    struct StaticVerifier {
        identity: Option<VerifiedIdentity>,
    }

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, _credential: &str) -> Result<VerifiedIdentity, AppError> {
            self.identity
                .clone()
                .ok_or_else(|| AppError::authentication("Invalid credential"))
        }
    }

    fn authenticator(identity: Option<VerifiedIdentity>, allow_demo: bool) -> SessionAuthenticator {
        let config = AuthConfig {
            allow_demo_credential: allow_demo,
            ..AuthConfig::default()
        };
        SessionAuthenticator::new(Arc::new(StaticVerifier { identity }), &config)
    }

    #[tokio::test]
    async fn test_demo_sentinel_bypasses_verifier() {
        let auth = authenticator(None, true);
        let session = auth.authenticate("demo").await.unwrap();
        assert!(session.is_demo());
        assert_eq!(session.role(), SubjectRole::Coordinator);
    }

    #[tokio::test]
    async fn test_demo_sentinel_can_be_disabled() {
        let auth = authenticator(None, false);
        assert!(auth.authenticate("demo").await.is_err());
    }

    #[tokio::test]
    async fn test_verified_credential() {
        let subject = SubjectId::new();
        let auth = authenticator(
            Some(VerifiedIdentity {
                subject_id: subject,
                role: SubjectRole::UnitDevice,
            }),
            true,
        );

        let session = auth.authenticate("some-jwt").await.unwrap();
        assert_eq!(session.subject_id(), subject);
        assert_eq!(session.role(), SubjectRole::UnitDevice);
        assert!(!session.is_demo());
    }

    #[tokio::test]
    async fn test_bad_credential_rejected() {
        let auth = authenticator(None, true);
        let err = auth.authenticate("bad-token").await.unwrap_err();
        assert_eq!(err.kind, mediroute_core::error::ErrorKind::Authentication);
    }
}
