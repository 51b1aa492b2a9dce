use crate::{
    error::AppError,
    models::{TaskStatus, TaskStatusCreate, TaskStatusDto, TaskStatusUpdate},
    routes::list_response,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

async fn load_task_status(state: &AppState, id: i64) -> Result<TaskStatus, AppError> {
    state
        .store
        .find_task_status(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task status with id {} not found", id)))
}

#[utoipa::path(
    get,
    path = "/api/task_statuses",
    tag = "task_statuses",
    responses((status = 200, description = "All task statuses", body = [TaskStatusDto])),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_task_statuses(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let statuses: Vec<TaskStatusDto> = state
        .store
        .list_task_statuses()
        .await?
        .into_iter()
        .map(TaskStatusDto::from)
        .collect();
    Ok(list_response(statuses))
}

#[utoipa::path(
    get,
    path = "/api/task_statuses/{id}",
    tag = "task_statuses",
    params(("id" = i64, Path, description = "Task status id")),
    responses(
        (status = 200, description = "The task status", body = TaskStatusDto),
        (status = 404, description = "No such task status")
    ),
    security(("bearer_auth" = []))
)]
#[get("/{id}")]
pub async fn get_task_status(
    state: web::Data<AppState>,
    status_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let status = load_task_status(&state, status_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(TaskStatusDto::from(status)))
}

#[utoipa::path(
    post,
    path = "/api/task_statuses",
    tag = "task_statuses",
    request_body = TaskStatusCreate,
    responses(
        (status = 201, description = "Task status created", body = TaskStatusDto),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Name or slug already taken")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_task_status(
    state: web::Data<AppState>,
    status_data: web::Json<TaskStatusCreate>,
) -> Result<impl Responder, AppError> {
    status_data.validate()?;

    let status = state
        .store
        .create_task_status(status_data.into_inner().into())
        .await?;

    log::info!("Created task status {} ({})", status.id, status.slug);
    Ok(HttpResponse::Created().json(TaskStatusDto::from(status)))
}

#[utoipa::path(
    put,
    path = "/api/task_statuses/{id}",
    tag = "task_statuses",
    params(("id" = i64, Path, description = "Task status id")),
    request_body = TaskStatusUpdate,
    responses(
        (status = 200, description = "Task status updated", body = TaskStatusDto),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "No such task status"),
        (status = 409, description = "Name or slug already taken")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_task_status(
    state: web::Data<AppState>,
    status_id: web::Path<i64>,
    status_data: web::Json<TaskStatusUpdate>,
) -> Result<impl Responder, AppError> {
    status_data.validate()?;

    let current = load_task_status(&state, status_id.into_inner()).await?;
    let updated = state
        .store
        .update_task_status(current.id, status_data.into_inner().merge_into(&current))
        .await?;

    Ok(HttpResponse::Ok().json(TaskStatusDto::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/task_statuses/{id}",
    tag = "task_statuses",
    params(("id" = i64, Path, description = "Task status id")),
    responses(
        (status = 204, description = "Task status deleted"),
        (status = 404, description = "No such task status"),
        (status = 409, description = "Task status is used by tasks")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_task_status(
    state: web::Data<AppState>,
    status_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = status_id.into_inner();
    state.store.delete_task_status(id).await?;

    log::info!("Deleted task status {}", id);
    Ok(HttpResponse::NoContent().finish())
}
