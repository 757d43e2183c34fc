use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{owner_missing, Scope, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{Role, SortKey, Task, TaskQuery, TaskUpdate, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, created_at";
const TASK_COLUMNS: &str =
    "id, owner_id, title, description, status, priority, deadline, created_at, updated_at";

/// Postgres-backed implementation of both store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Escapes `LIKE` metacharacters so the term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds the listing query: scope and filters in `WHERE`, then the requested
/// key with `created_at DESC, id` as tie-breakers.
fn list_query<'a>(scope: Scope, query: &'a TaskQuery) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS));

    if let Some(owner) = scope.owner() {
        qb.push(" AND owner_id = ").push_bind(owner);
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(term) = query.search_term() {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    qb.push(" ORDER BY ");
    if let Some(sort) = query.sort() {
        qb.push(sort.key.column()).push(" ").push(sort.order.sql());
        if sort.key == SortKey::Deadline {
            qb.push(" NULLS LAST");
        }
        qb.push(", ");
    }
    qb.push("created_at DESC, id ASC");
    qb
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let user = User::new(username.to_string(), password_hash.to_string(), role);
        let stored = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
            cols = USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Username is already taken".to_string())
            } else {
                AppError::from(e)
            }
        })?;
        Ok(stored)
    }

    async fn find_or_create(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let user = User::new(username.to_string(), password_hash.to_string(), role);
        // The no-op update makes RETURNING yield the existing row on conflict.
        let stored = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (username) DO UPDATE SET username = EXCLUDED.username \
             RETURNING {cols}",
            cols = USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert(&self, task: &Task) -> Result<Task, AppError> {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {cols}",
            cols = TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(task.owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.deadline)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                owner_missing()
            } else {
                AppError::from(e)
            }
        })
    }

    async fn find(&self, id: Uuid, scope: Scope) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2)",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(scope.owner())
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn list(&self, scope: Scope, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let mut qb = list_query(scope, query);
        let tasks = qb.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn update(
        &self,
        id: Uuid,
        scope: Scope,
        update: &TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Task>, AppError> {
        // Nullable columns carry a "present" flag so an explicit null clears them.
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks SET \
                title = COALESCE($3, title), \
                description = CASE WHEN $4 THEN $5 ELSE description END, \
                status = COALESCE($6, status), \
                priority = COALESCE($7, priority), \
                deadline = CASE WHEN $8 THEN $9 ELSE deadline END, \
                updated_at = $10 \
             WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2) \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(scope.owner())
        .bind(update.title.as_deref())
        .bind(update.description.is_some())
        .bind(update.description.clone().flatten())
        .bind(update.status)
        .bind(update.priority)
        .bind(update.deadline.is_some())
        .bind(update.deadline.flatten())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(task)
    }

    async fn delete(&self, id: Uuid, scope: Scope) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM tasks WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2)")
                .bind(id)
                .bind(scope.owner())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn all(&self) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks", TASK_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }
}
