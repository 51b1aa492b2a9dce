use crate::{
    error::AppError,
    models::{Label, LabelCreate, LabelDto, LabelUpdate},
    routes::list_response,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

async fn load_label(state: &AppState, id: i64) -> Result<Label, AppError> {
    state
        .store
        .find_label(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Label with id {} not found", id)))
}

#[utoipa::path(
    get,
    path = "/api/labels",
    tag = "labels",
    responses((status = 200, description = "All labels", body = [LabelDto])),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_labels(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let labels: Vec<LabelDto> = state
        .store
        .list_labels()
        .await?
        .into_iter()
        .map(LabelDto::from)
        .collect();
    Ok(list_response(labels))
}

#[utoipa::path(
    get,
    path = "/api/labels/{id}",
    tag = "labels",
    params(("id" = i64, Path, description = "Label id")),
    responses(
        (status = 200, description = "The label", body = LabelDto),
        (status = 404, description = "No such label")
    ),
    security(("bearer_auth" = []))
)]
#[get("/{id}")]
pub async fn get_label(
    state: web::Data<AppState>,
    label_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let label = load_label(&state, label_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LabelDto::from(label)))
}

#[utoipa::path(
    post,
    path = "/api/labels",
    tag = "labels",
    request_body = LabelCreate,
    responses(
        (status = 201, description = "Label created", body = LabelDto),
        (status = 400, description = "Name shorter than 3 or longer than 1000 characters"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = []))
)]
#[post("")]
pub async fn create_label(
    state: web::Data<AppState>,
    label_data: web::Json<LabelCreate>,
) -> Result<impl Responder, AppError> {
    label_data.validate()?;

    let label = state
        .store
        .create_label(label_data.into_inner().into())
        .await?;

    log::info!("Created label {} ({})", label.id, label.name);
    Ok(HttpResponse::Created().json(LabelDto::from(label)))
}

#[utoipa::path(
    put,
    path = "/api/labels/{id}",
    tag = "labels",
    params(("id" = i64, Path, description = "Label id")),
    request_body = LabelUpdate,
    responses(
        (status = 200, description = "Label updated", body = LabelDto),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "No such label"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_label(
    state: web::Data<AppState>,
    label_id: web::Path<i64>,
    label_data: web::Json<LabelUpdate>,
) -> Result<impl Responder, AppError> {
    label_data.validate()?;

    let current = load_label(&state, label_id.into_inner()).await?;
    let updated = state
        .store
        .update_label(current.id, label_data.into_inner().merge_into(&current))
        .await?;

    Ok(HttpResponse::Ok().json(LabelDto::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/labels/{id}",
    tag = "labels",
    params(("id" = i64, Path, description = "Label id")),
    responses(
        (status = 204, description = "Label deleted"),
        (status = 404, description = "No such label"),
        (status = 409, description = "Label is attached to tasks")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_label(
    state: web::Data<AppState>,
    label_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let id = label_id.into_inner();
    state.store.delete_label(id).await?;

    log::info!("Deleted label {}", id);
    Ok(HttpResponse::NoContent().finish())
}
