use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{owner_missing, Scope, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{sort_tasks, Role, Task, TaskQuery, TaskUpdate, User};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    tasks: HashMap<Uuid, Task>,
}

/// In-process store with the same observable behavior as [`super::PgStore`].
///
/// The lock is never held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(username).cloned())
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        if tables.users.contains_key(username) {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }
        let user = User::new(username.to_string(), password_hash.to_string(), role);
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_or_create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .entry(username.to_string())
            .or_insert_with(|| User::new(username.to_string(), password_hash.to_string(), role));
        Ok(user.clone())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        let mut tables = self.lock()?;
        if !tables.users.values().any(|u| u.id == task.owner_id) {
            return Err(owner_missing());
        }
        tables.tasks.insert(task.id, task.clone());
        Ok(task.clone())
    }

    async fn find(&self, id: Uuid, scope: Scope) -> Result<Option<Task>, AppError> {
        let tables = self.lock()?;
        Ok(tables.tasks.get(&id).filter(|t| scope.permits(t)).cloned())
    }

    async fn list(&self, scope: Scope, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let mut tasks: Vec<Task> = {
            let tables = self.lock()?;
            tables
                .tasks
                .values()
                .filter(|t| scope.permits(t) && query.matches(t))
                .cloned()
                .collect()
        };
        sort_tasks(&mut tasks, query.sort());
        Ok(tasks)
    }

    async fn update(
        &self,
        id: Uuid,
        scope: Scope,
        update: &TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, AppError> {
        let mut tables = self.lock()?;
        match tables.tasks.get_mut(&id) {
            Some(task) if scope.permits(task) => {
                task.apply(update, now);
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid, scope: Scope) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        let visible = tables.tasks.get(&id).is_some_and(|t| scope.permits(t));
        if visible {
            tables.tasks.remove(&id);
        }
        Ok(visible)
    }

    async fn all(&self) -> Result<Vec<Task>, AppError> {
        Ok(self.lock()?.tasks.values().cloned().collect())
    }
}
