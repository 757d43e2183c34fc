use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum; variant order is the sort ordinal.
#[derive(
    Debug,
    Default,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum. Transitions are not enforced:
/// any status may be set directly.
#[derive(
    Debug,
    Default,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Created,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed.
    Completed,
}

/// Input structure for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `created` when omitted.
    pub status: Option<TaskStatus>,

    /// Defaults to `medium` when omitted.
    pub priority: Option<TaskPriority>,

    pub deadline: Option<DateTime<Utc>>,
}

/// Partial update of a task. Absent fields are left untouched.
///
/// `description` and `deadline` distinguish "absent" (`None`) from an explicit
/// JSON `null` (`Some(None)`), which clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_description"))]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "present_or_null")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_update_description(update: &TaskUpdate) -> Result<(), ValidationError> {
    match &update.description {
        Some(Some(text)) if text.chars().count() > 1000 => {
            let mut err = ValidationError::new("length");
            err.message = Some("description must be at most 1000 characters".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    /// Identifier of the user who owns the task.
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` for `owner_id`, filling in id, timestamps and defaults.
    pub fn new(input: TaskInput, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            deadline: input.deadline,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the supplied fields of `update` and stamps `updated_at` with `now`.
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = deadline;
        }
        self.updated_at = now;
    }
}

/// Sortable task columns accepted by `sort_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Status,
    Priority,
    Deadline,
}

impl SortKey {
    /// Returns `None` for unrecognized keys, which callers treat as "use the default order".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "created_at" => Some(SortKey::CreatedAt),
            "updated_at" => Some(SortKey::UpdatedAt),
            "status" => Some(SortKey::Status),
            "priority" => Some(SortKey::Priority),
            "deadline" => Some(SortKey::Deadline),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::Status => "status",
            SortKey::Priority => "priority",
            SortKey::Deadline => "deadline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` (case-insensitive) sorts ascending.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub key: SortKey,
    pub order: SortOrder,
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by status.
    pub status: Option<TaskStatus>,
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl TaskQuery {
    /// The search term, if it contains anything besides whitespace.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// The requested ordering, or `None` for the default (newest first).
    pub fn sort(&self) -> Option<TaskSort> {
        let key = self.sort_by.as_deref().and_then(SortKey::parse)?;
        let order = self
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();
        Some(TaskSort { key, order })
    }

    /// In-process equivalent of the SQL `WHERE` clause built by the Postgres store.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                let needle = term.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

/// Orders tasks the same way the Postgres store's `ORDER BY` does: the requested key
/// first (deadline NULLs last in both directions), then newest first, then id.
pub fn sort_tasks(tasks: &mut [Task], sort: Option<TaskSort>) {
    tasks.sort_by(|a, b| {
        let primary = match sort {
            Some(TaskSort { key, order }) => compare_by_key(a, b, key, order),
            None => Ordering::Equal,
        };
        primary
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_by_key(a: &Task, b: &Task, key: SortKey, order: SortOrder) -> Ordering {
    let directed = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };
    match key {
        SortKey::CreatedAt => directed(a.created_at.cmp(&b.created_at)),
        SortKey::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at)),
        SortKey::Status => directed(a.status.cmp(&b.status)),
        SortKey::Priority => directed(a.priority.cmp(&b.priority)),
        SortKey::Deadline => match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Aggregate counts over the whole task table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total: u64,
    pub created: u64,
    pub in_progress: u64,
    pub completed: u64,
    /// Has a deadline before `today`, and is not completed.
    pub overdue: u64,
    pub high_priority: u64,
    pub medium_priority: u64,
    pub low_priority: u64,
    /// Completed, with `updated_at` falling on `today`.
    pub completed_today: u64,
}

impl TaskStatistics {
    /// Computes the statistics for `tasks` as of the UTC calendar date `today`.
    pub fn tally<'a, I>(tasks: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut stats = TaskStatistics::default();
        for task in tasks {
            stats.total += 1;
            match task.status {
                TaskStatus::Created => stats.created += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
            }
            match task.priority {
                TaskPriority::High => stats.high_priority += 1,
                TaskPriority::Medium => stats.medium_priority += 1,
                TaskPriority::Low => stats.low_priority += 1,
            }
            let completed = task.status == TaskStatus::Completed;
            if !completed && task.deadline.is_some_and(|d| d.date_naive() < today) {
                stats.overdue += 1;
            }
            if completed && task.updated_at.date_naive() == today {
                stats.completed_today += 1;
            }
        }
        stats
    }
}
