use crate::{
    auth::{verify_password, LoginRequest},
    error::AppError,
    state::AppState,
};
use actix_web::{http::header::ContentType, post, web, HttpResponse, Responder};
use validator::Validate;

/// Login user
///
/// Checks the credentials and returns a bearer token as plain text. Unknown
/// emails and wrong passwords get the same answer.
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "JWT for the Authorization header", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = state.store.find_user_by_email(&login_data.username).await?;

    match user {
        Some(user) if verify_password(&login_data.password, &user.password_digest)? => {
            let token = state.tokens.generate(&user.email)?;
            log::info!("User {} logged in", user.id);
            Ok(HttpResponse::Ok()
                .content_type(ContentType::plaintext())
                .body(token))
        }
        _ => {
            log::warn!("Failed login attempt for {}", login_data.username);
            Err(AppError::Unauthorized("Invalid credentials".into()))
        }
    }
}
