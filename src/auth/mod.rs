pub mod extractors;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod token;

use crate::models::{Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Re-export necessary items
pub use extractors::{authorize_admin, AdminIdentity};
pub use middleware::{authenticate_request, AuthMiddleware};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenIssuer};

/// The authenticated caller, as resolved from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Must be between 3 and 150 characters and must not use the prefix reserved
    /// for OAuth accounts.
    #[validate(length(min = 3, max = 150), custom = "not_reserved_username")]
    pub username: String,
    /// Must be between 6 and 128 characters.
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

fn not_reserved_username(username: &str) -> Result<(), ValidationError> {
    if username.starts_with(oauth::EXTERNAL_USERNAME_PREFIX) {
        let mut error = ValidationError::new("reserved_prefix");
        error.message = Some("This username prefix is reserved for Yandex accounts".into());
        return Err(error);
    }
    Ok(())
}

/// Form-encoded login credentials.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response structure after successful authentication (password login or OAuth callback).
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            username: "test_user-123".to_string(),
            password: "password123".to_string(),
        };
        assert!(valid_register.validate().is_ok());

        let short_username_register = RegisterRequest {
            username: "tu".to_string(),
            password: "password123".to_string(),
        };
        assert!(short_username_register.validate().is_err());

        let long_username_register = RegisterRequest {
            username: "u".repeat(151),
            password: "password123".to_string(),
        };
        assert!(long_username_register.validate().is_err());

        let short_password_register = RegisterRequest {
            username: "test_user".to_string(),
            password: "12345".to_string(),
        };
        assert!(short_password_register.validate().is_err());
    }

    #[test]
    fn test_register_rejects_oauth_username_prefix() {
        let squatter = RegisterRequest {
            username: "ya_12345".to_string(),
            password: "password123".to_string(),
        };
        let errors = squatter.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let lookalike = RegisterRequest {
            username: "yak_herder".to_string(),
            password: "password123".to_string(),
        };
        assert!(lookalike.validate().is_ok());
    }

    #[test]
    fn test_identity_from_user() {
        let user = User::new("admin".into(), "hash".into(), Role::Admin);
        let identity = Identity::from(&user);
        assert_eq!(identity.id, user.id);
        assert!(identity.is_admin());
    }

    #[test]
    fn test_token_response_shape() {
        let json = serde_json::to_value(TokenResponse::bearer("abc".into())).unwrap();
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["token_type"], "bearer");
    }
}
