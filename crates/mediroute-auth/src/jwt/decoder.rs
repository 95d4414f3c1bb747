//! JWT token validation.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use mediroute_core::config::auth::AuthConfig;
use mediroute_core::error::AppError;
use mediroute_core::traits::identity::{IdentityVerifier, VerifiedIdentity};

use super::claims::Claims;

/// Validates JWT bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::authentication("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::authentication("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::authentication("Invalid token signature")
                    }
                    _ => AppError::authentication(format!("Token validation failed: {e}")),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtDecoder {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, AppError> {
        let claims = self.decode_access_token(credential)?;
        Ok(VerifiedIdentity {
            subject_id: claims.subject_id(),
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::JwtEncoder;
    use mediroute_core::types::{SubjectId, SubjectRole};

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_access_ttl_minutes: 5,
            allow_demo_credential: true,
        }
    }

    #[tokio::test]
    async fn test_roundtrip_verification() {
        let config = test_config();
        let encoder = JwtEncoder::new(&config);
        let decoder = JwtDecoder::new(&config);

        let subject = SubjectId::new();
        let (token, _) = encoder
            .generate_access_token(subject, SubjectRole::Coordinator)
            .unwrap();

        let identity = decoder.verify(&token).await.unwrap();
        assert_eq!(identity.subject_id, subject);
        assert_eq!(identity.role, SubjectRole::Coordinator);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let decoder = JwtDecoder::new(&test_config());
        let err = decoder.verify("not-a-token").await.unwrap_err();
        assert_eq!(err.kind, mediroute_core::error::ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let encoder = JwtEncoder::new(&test_config());
        let (token, _) = encoder
            .generate_access_token(SubjectId::new(), SubjectRole::UnitDevice)
            .unwrap();

        let mut other = test_config();
        other.jwt_secret = "different-secret".to_string();
        let decoder = JwtDecoder::new(&other);

        assert!(decoder.verify(&token).await.is_err());
    }
}
