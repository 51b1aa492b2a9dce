use actix_web::{get, HttpResponse, Responder};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::{auth, models, routes};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::login::login,
        routes::users::list_users,
        routes::users::get_user,
        routes::users::create_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::task_statuses::list_task_statuses,
        routes::task_statuses::get_task_status,
        routes::task_statuses::create_task_status,
        routes::task_statuses::update_task_status,
        routes::task_statuses::delete_task_status,
        routes::labels::list_labels,
        routes::labels::get_label,
        routes::labels::create_label,
        routes::labels::update_label,
        routes::labels::delete_label,
        routes::tasks::list_tasks,
        routes::tasks::get_task,
        routes::tasks::create_task,
        routes::tasks::update_task,
        routes::tasks::delete_task,
    ),
    components(schemas(
        auth::LoginRequest,
        models::UserCreate,
        models::UserUpdate,
        models::UserDto,
        models::TaskStatusCreate,
        models::TaskStatusUpdate,
        models::TaskStatusDto,
        models::LabelCreate,
        models::LabelUpdate,
        models::LabelDto,
        models::TaskCreate,
        models::TaskUpdate,
        models::TaskDto,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Token issuance"),
        (name = "users", description = "User accounts"),
        (name = "task_statuses", description = "Task workflow states"),
        (name = "labels", description = "Task labels"),
        (name = "tasks", description = "Tasks")
    ),
    info(
        title = "Task Manager API",
        description = "Users, task statuses, labels and tasks behind JWT bearer authentication"
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Serves the OpenAPI document.
#[get("/v3/api-docs")]
pub async fn api_docs() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
