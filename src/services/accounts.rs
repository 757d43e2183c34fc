use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::auth::oauth::ExternalProfile;
use crate::auth::{hash_password, verify_password, RegisterRequest};
use crate::config::AdminSeed;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::store::UserStore;

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("Invalid credentials".to_string())
}

/// Account registration, password login and external (OAuth) login.
///
/// bcrypt runs on the blocking thread pool so a slow work factor does not
/// stall the async workers.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Verification task failed: {}", e)))?
    }

    /// Creates a regular account. Fails with `Conflict` if the username is taken.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        request.validate()?;
        let password_hash = self.hash(&request.password).await?;
        let user = self
            .users
            .create(&request.username, &password_hash, Role::User)
            .await?;
        log::info!("Registered user {}", user.username);
        Ok(user)
    }

    /// Checks credentials. Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(invalid_credentials)?;

        if self.verify(password, &user.password_hash).await? {
            Ok(user)
        } else {
            Err(invalid_credentials())
        }
    }

    /// Resolves the local account linked to a provider profile, creating it on
    /// first login with an unusable random password.
    pub async fn login_external(&self, profile: &ExternalProfile) -> Result<User, AppError> {
        let username = profile.username();
        if let Some(user) = self.users.find_by_username(&username).await? {
            return Ok(user);
        }
        let placeholder = self.hash(&Uuid::new_v4().to_string()).await?;
        let user = self
            .users
            .find_or_create(&username, &placeholder, Role::User)
            .await?;
        log::info!("Linked external account {}", user.username);
        Ok(user)
    }

    /// Returns the account named `username`, creating it with `password` and
    /// `role` if it does not exist yet. Existing accounts are left untouched.
    pub async fn provision(&self, username: &str, password: &str, role: Role) -> Result<User, AppError> {
        if let Some(user) = self.users.find_by_username(username).await? {
            return Ok(user);
        }
        let password_hash = self.hash(password).await?;
        self.users.find_or_create(username, &password_hash, role).await
    }

    /// Makes sure the configured administrator exists.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<User, AppError> {
        let user = self
            .provision(&seed.username, &seed.password, Role::Admin)
            .await?;
        if user.role == Role::Admin {
            log::info!("Administrator account {} is ready", user.username);
        } else {
            log::warn!(
                "Account {} exists but is not an administrator; leaving it unchanged",
                user.username
            );
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn service() -> AccountService {
        AccountService::new(Arc::new(MemoryStore::new()), 4)
    }

    fn request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_then_login() {
        let accounts = service();
        let user = accounts.register(&request("judy", "secret1")).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret1");

        let logged_in = accounts.login("judy", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[actix_rt::test]
    async fn test_register_duplicate_is_conflict() {
        let accounts = service();
        accounts.register(&request("karl", "secret1")).await.unwrap();
        assert!(matches!(
            accounts.register(&request("karl", "secret2")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_register_validates() {
        let accounts = service();
        assert!(matches!(
            accounts.register(&request("ab", "secret1")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            accounts.register(&request("valid", "123")).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let accounts = service();
        accounts.register(&request("lena", "secret1")).await.unwrap();

        let wrong_password = accounts.login("lena", "nope").await.unwrap_err();
        let unknown_user = accounts.login("nobody", "secret1").await.unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AppError::Unauthenticated(_)));
    }

    #[actix_rt::test]
    async fn test_login_external_is_stable() {
        let accounts = service();
        let profile = ExternalProfile {
            provider_user_id: "9001".to_string(),
        };

        let first = accounts.login_external(&profile).await.unwrap();
        let second = accounts.login_external(&profile).await.unwrap();
        assert_eq!(first.username, "ya_9001");
        assert_eq!(first.role, Role::User);
        assert_eq!(first.id, second.id);
    }

    #[actix_rt::test]
    async fn test_ensure_admin_is_idempotent() {
        let accounts = service();
        let seed = AdminSeed {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        };

        let first = accounts.ensure_admin(&seed).await.unwrap();
        let second = accounts.ensure_admin(&seed).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.role, Role::Admin);
        assert!(accounts.login("admin", "admin123").await.is_ok());
    }
}
