use crate::{
    error::AppError,
    models::{Task, TaskCreate, TaskDto, TaskFilter, TaskUpdate},
    routes::list_response,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

async fn load_task(state: &AppState, id: i64) -> Result<Task, AppError> {
    state
        .store
        .find_task(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))
}

/// Resolves a status slug to its id. Unknown slugs are a client error.
async fn resolve_status(state: &AppState, slug: &str) -> Result<i64, AppError> {
    state
        .store
        .find_task_status_by_slug(slug)
        .await?
        .map(|status| status.id)
        .ok_or_else(|| AppError::BadRequest(format!("Task status '{}' does not exist", slug)))
}

async fn check_assignee(state: &AppState, assignee_id: Option<i64>) -> Result<(), AppError> {
    if let Some(id) = assignee_id {
        if state.store.find_user(id).await?.is_none() {
            return Err(AppError::BadRequest(format!("User {} does not exist", id)));
        }
    }
    Ok(())
}

async fn check_labels(state: &AppState, label_ids: &[i64]) -> Result<(), AppError> {
    for &id in label_ids {
        if state.store.find_label(id).await?.is_none() {
            return Err(AppError::BadRequest(format!("Label {} does not exist", id)));
        }
    }
    Ok(())
}

/// Lists tasks matching the query.
///
/// ## Query Parameters:
/// - `titleCont` (optional): case-insensitive substring of the title.
/// - `assigneeId` (optional): id of the assigned user.
/// - `status` (optional): task status slug.
/// - `labelId` (optional): id of a label the task carries.
///
/// ## Responses:
/// - `200 OK`: JSON array of tasks; `X-Total-Count` holds their number.
/// - `401 Unauthorized`: missing or invalid token.
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    params(TaskFilter),
    responses(
        (status = 200, description = "Matching tasks", body = [TaskDto]),
        (status = 400, description = "Malformed query"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    filter: web::Query<TaskFilter>,
) -> Result<impl Responder, AppError> {
    let tasks: Vec<TaskDto> = state
        .store
        .list_tasks(&filter)
        .await?
        .into_iter()
        .map(TaskDto::from)
        .collect();
    Ok(list_response(tasks))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = TaskDto),
        (status = 404, description = "No such task")
    ),
    security(("bearer_auth" = []))
)]
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = load_task(&state, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TaskDto::from(task)))
}

/// Creates a task.
///
/// ## Request Body:
/// - `title`: required, non-blank.
/// - `status`: required slug of an existing task status.
/// - `index`, `content`, `assignee_id`, `taskLabelIds`: optional.
///
/// ## Responses:
/// - `201 Created`: the new task.
/// - `400 Bad Request`: invalid body or a reference to a missing status, user or label.
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = TaskCreate,
    responses(
        (status = 201, description = "Task created", body = TaskDto),
        (status = 400, description = "Invalid input or unknown reference")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    task_data: web::Json<TaskCreate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task_data = task_data.into_inner();
    let task_status_id = resolve_status(&state, &task_data.status).await?;
    check_assignee(&state, task_data.assignee_id).await?;
    check_labels(&state, &task_data.label_ids).await?;

    let task = state
        .store
        .create_task(task_data.into_new_task(task_status_id))
        .await?;

    log::info!("Created task {} in status {}", task.id, task.status_slug);
    Ok(HttpResponse::Created().json(TaskDto::from(task)))
}

/// Updates a task. Absent fields are left unchanged; `null` clears
/// `index`, `assignee_id` and `content`.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    request_body = TaskUpdate,
    responses(
        (status = 200, description = "Task updated", body = TaskDto),
        (status = 400, description = "Invalid input or unknown reference"),
        (status = 404, description = "No such task")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let current = load_task(&state, task_id.into_inner()).await?;
    let task_data = task_data.into_inner();

    let task_status_id = match task_data.status.as_deref() {
        Some(slug) => Some(resolve_status(&state, slug).await?),
        None => None,
    };
    check_assignee(&state, task_data.assignee_id.flatten()).await?;
    if let Some(label_ids) = &task_data.label_ids {
        check_labels(&state, label_ids).await?;
    }

    let updated = state
        .store
        .update_task(current.id, task_data.merge_into(&current, task_status_id))
        .await?;

    Ok(HttpResponse::Ok().json(TaskDto::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "No such task")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    task_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    state.store.delete_task(id).await?;

    log::info!("Deleted task {}", id);
    Ok(HttpResponse::NoContent().finish())
}
