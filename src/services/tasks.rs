use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Identity;
use crate::error::AppError;
use crate::models::{Task, TaskInput, TaskQuery, TaskStatistics, TaskUpdate};
use crate::store::{Scope, TaskStore};

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".to_string())
}

/// Task operations, scoped by the caller's role.
///
/// Regular users only ever see their own tasks; a task owned by someone else
/// is reported as not found rather than forbidden.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    pub async fn create(&self, owner: &Identity, input: TaskInput) -> Result<Task, AppError> {
        input.validate()?;
        let task = Task::new(input, owner.id);
        self.tasks.insert(&task).await
    }

    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<Task, AppError> {
        self.tasks
            .find(id, Scope::for_identity(identity))
            .await?
            .ok_or_else(task_not_found)
    }

    pub async fn list(&self, identity: &Identity, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        self.tasks.list(Scope::for_identity(identity), query).await
    }

    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        update: &TaskUpdate,
    ) -> Result<Task, AppError> {
        update.validate()?;
        self.tasks
            .update(id, Scope::for_identity(identity), update, Utc::now())
            .await?
            .ok_or_else(task_not_found)
    }

    /// Returns whether an accessible task existed and was removed.
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<bool, AppError> {
        self.tasks.delete(id, Scope::for_identity(identity)).await
    }

    /// Counts over every task in the system, as of the current UTC date.
    pub async fn statistics(&self) -> Result<TaskStatistics, AppError> {
        let tasks = self.tasks.all().await?;
        Ok(TaskStatistics::tally(&tasks, Utc::now().date_naive()))
    }
}
