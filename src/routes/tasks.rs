use crate::{
    auth::Identity,
    error::AppError,
    models::{TaskInput, TaskQuery, TaskUpdate},
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;

/// Lists the tasks visible to the caller.
///
/// Regular users see their own tasks; administrators see every task.
///
/// ## Query Parameters:
/// - `status` (optional): `created`, `in_progress` or `completed`.
/// - `search` (optional): case-insensitive substring of the title or description.
/// - `sort_by` (optional): `created_at`, `updated_at`, `status`, `priority` or `deadline`.
///   Unknown values fall back to newest first.
/// - `sort_order` (optional): `asc` (default) or `desc`.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list(&identity, &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task owned by the caller.
///
/// ## Request Body:
/// A JSON `TaskInput`: `title` (required), and optional `description`, `status`,
/// `priority` and `deadline`.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `422 Unprocessable Entity`: validation failed (e.g. empty title).
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.create(&identity, task_data.into_inner()).await?;
    log::info!("{} created task {}", identity.username, task.id);
    Ok(HttpResponse::Created().json(task))
}

/// Aggregate counts over all tasks in the system.
///
/// ## Responses:
/// - `200 OK`: a `TaskStatistics` object.
/// - `401 Unauthorized`: missing or invalid token.
#[get("/statistics/summary")]
pub async fn statistics(
    state: web::Data<AppState>,
    _identity: Identity,
) -> Result<impl Responder, AppError> {
    let stats = state.tasks.statistics().await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Retrieves a task by id.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = state.tasks.get(&identity, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task.
///
/// Absent fields are left unchanged; an explicit `null` clears `description`
/// or `deadline`. `updated_at` is refreshed.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `404 Not Found`: no such task, or it belongs to another user.
/// - `422 Unprocessable Entity`: validation failed.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
    update: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let task = state
        .tasks
        .update(&identity, task_id.into_inner(), &update)
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, or it belongs to another user.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    identity: Identity,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    if !state.tasks.delete(&identity, id).await? {
        return Err(AppError::NotFound("Task not found".to_string()));
    }
    log::info!("{} deleted task {}", identity.username, id);
    Ok(HttpResponse::NoContent().finish())
}
