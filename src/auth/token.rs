use crate::auth::Identity;
use crate::config::{JwtConfig, MAX_JWT_TTL_MINUTES};
use crate::error::AppError;
use crate::models::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the account id as a UUID string.
    pub sub: String,
    pub username: String,
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signs and verifies session tokens with the configured HMAC secret.
///
/// Built once at startup from [`JwtConfig`] and shared through the application
/// state; nothing here reads the environment.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            ttl: Duration::minutes(config.ttl_minutes.min(MAX_JWT_TTL_MINUTES)),
        }
    }

    /// Issues a token for `identity` that expires after the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_with_ttl(identity, self.ttl)
    }

    /// Issues a token with an explicit lifetime. A negative `ttl` yields a token
    /// that is already expired.
    pub fn issue_with_ttl(&self, identity: &Identity, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::InternalServerError("Token lifetime is out of range".to_string())
        })?;
        let claims = Claims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies signature, algorithm and expiry, then resolves the caller.
    ///
    /// Every failure is reported as `AppError::Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Unauthenticated("Token has expired".to_string())
                }
                _ => AppError::Unauthenticated(format!("Invalid token: {}", e)),
            })?;

        let id = Uuid::parse_str(&claims.sub).map_err(|_| {
            AppError::Unauthenticated("Invalid token: subject is not an account id".to_string())
        })?;

        Ok(Identity {
            id,
            username: claims.username,
            role: claims.role,
        })
    }
}
