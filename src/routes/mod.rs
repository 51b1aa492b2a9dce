pub mod health;
pub mod labels;
pub mod login;
pub mod task_statuses;
pub mod tasks;
pub mod users;

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::error::AppError;

/// Header carrying the number of items in a list response.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

/// Routes mounted under `/api`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(login::login)
    .service(
        web::scope("/users")
            .service(users::list_users)
            .service(users::create_user)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user),
    )
    .service(
        web::scope("/task_statuses")
            .service(task_statuses::list_task_statuses)
            .service(task_statuses::create_task_status)
            .service(task_statuses::get_task_status)
            .service(task_statuses::update_task_status)
            .service(task_statuses::delete_task_status),
    )
    .service(
        web::scope("/labels")
            .service(labels::list_labels)
            .service(labels::create_label)
            .service(labels::get_label)
            .service(labels::update_label)
            .service(labels::delete_label),
    )
    .service(
        web::scope("/tasks")
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    );
}

/// `200 OK` with the items as a JSON array and their count in `X-Total-Count`.
pub(crate) fn list_response<T: Serialize>(items: Vec<T>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, items.len().to_string()))
        .json(items)
}
