//! Persistence ports.
//!
//! Services talk to storage only through [`UserStore`] and [`TaskStore`].
//! [`PgStore`] is the production backend; [`MemoryStore`] keeps everything in
//! process for tests and local experiments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::{Role, Task, TaskQuery, TaskUpdate, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which tasks a caller may see or touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every task (administrators).
    All,
    /// Only tasks owned by the given account.
    Owner(Uuid),
}

impl Scope {
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_admin() {
            Scope::All
        } else {
            Scope::Owner(identity.id)
        }
    }

    pub fn owner(self) -> Option<Uuid> {
        match self {
            Scope::All => None,
            Scope::Owner(id) => Some(id),
        }
    }

    pub fn permits(self, task: &Task) -> bool {
        match self {
            Scope::All => true,
            Scope::Owner(id) => task.owner_id == id,
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Inserts a new account. A taken username yields `AppError::Conflict`.
    async fn create(&self, username: &str, password_hash: &str, role: Role)
        -> Result<User, AppError>;

    /// Returns the account with `username`, creating it atomically if absent.
    /// An existing account is returned unchanged.
    async fn find_or_create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &Task) -> Result<Task, AppError>;

    async fn find(&self, id: Uuid, scope: Scope) -> Result<Option<Task>, AppError>;

    /// Filtered and ordered listing as described by [`TaskQuery`].
    async fn list(&self, scope: Scope, query: &TaskQuery) -> Result<Vec<Task>, AppError>;

    /// Applies `update` in a single step and returns the new row, or `None`
    /// when no task with `id` is visible within `scope`.
    async fn update(
        &self,
        id: Uuid,
        scope: Scope,
        update: &TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, AppError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid, scope: Scope) -> Result<bool, AppError>;

    /// Every task, regardless of owner.
    async fn all(&self) -> Result<Vec<Task>, AppError>;
}

pub(crate) fn owner_missing() -> AppError {
    AppError::Unauthenticated("Account no longer exists".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "dave".to_string(),
            role,
        }
    }

    #[test]
    fn test_scope_for_identity() {
        let admin = identity(Role::Admin);
        let user = identity(Role::User);

        assert_eq!(Scope::for_identity(&admin), Scope::All);
        assert_eq!(Scope::for_identity(&user), Scope::Owner(user.id));
        assert_eq!(Scope::for_identity(&user).owner(), Some(user.id));
        assert_eq!(Scope::All.owner(), None);
    }

    #[test]
    fn test_scope_permits() {
        let owner = Uuid::new_v4();
        let task = Task::new(
            TaskInput {
                title: "scoped".to_string(),
                description: None,
                status: None,
                priority: None,
                deadline: None,
            },
            owner,
        );

        assert!(Scope::All.permits(&task));
        assert!(Scope::Owner(owner).permits(&task));
        assert!(!Scope::Owner(Uuid::new_v4()).permits(&task));
    }
}
