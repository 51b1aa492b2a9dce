use crate::{
    auth::{hash_password, AuthenticatedUser},
    error::AppError,
    models::{User, UserCreate, UserDto, UserUpdate},
    routes::list_response,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use validator::Validate;

async fn load_user(state: &AppState, id: i64) -> Result<User, AppError> {
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
}

/// Users may only change or remove their own account.
fn ensure_self(caller: &AuthenticatedUser, target: &User) -> Result<(), AppError> {
    if caller.email() != target.email {
        return Err(AppError::Forbidden(
            "You can only modify your own account".into(),
        ));
    }
    Ok(())
}

/// Lists all users.
///
/// ## Responses:
/// - `200 OK`: JSON array of users; `X-Total-Count` holds their number.
/// - `401 Unauthorized`: missing or invalid token.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserDto]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
#[get("")]
pub async fn list_users(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let users: Vec<UserDto> = state
        .store
        .list_users()
        .await?
        .into_iter()
        .map(UserDto::from)
        .collect();
    Ok(list_response(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserDto),
        (status = 404, description = "No such user")
    ),
    security(("bearer_auth" = []))
)]
#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let user = load_user(&state, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

/// Registers a new user. Open to unauthenticated callers.
///
/// ## Responses:
/// - `201 Created`: the new user.
/// - `400 Bad Request`: invalid email, blank names or a short password.
/// - `409 Conflict`: the email is already registered.
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    user_data: web::Json<UserCreate>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;

    let user_data = user_data.into_inner();
    let password_digest = hash_password(&user_data.password, state.bcrypt_cost)?;
    let user = state
        .store
        .create_user(user_data.into_new_user(password_digest))
        .await?;

    log::info!("Created user {} ({})", user.id, user.email);
    Ok(HttpResponse::Created().json(UserDto::from(user)))
}

/// Updates the caller's own account. Absent fields are left unchanged.
///
/// The body is validated before ownership is checked, so an invalid body is
/// always `400` regardless of whose account it targets.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserDto),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
    user_data: web::Json<UserUpdate>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;

    let current = load_user(&state, user_id.into_inner()).await?;
    ensure_self(&caller, &current)?;

    let user_data = user_data.into_inner();
    let password_digest = match user_data.password.as_deref() {
        Some(password) => Some(hash_password(password, state.bcrypt_cost)?),
        None => None,
    };
    let updated = state
        .store
        .update_user(current.id, user_data.merge_into(&current, password_digest))
        .await?;

    Ok(HttpResponse::Ok().json(UserDto::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not the caller's account"),
        (status = 404, description = "No such user"),
        (status = 409, description = "User is assigned to tasks")
    ),
    security(("bearer_auth" = []))
)]
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let current = load_user(&state, user_id.into_inner()).await?;
    ensure_self(&caller, &current)?;

    state.store.delete_user(current.id).await?;
    log::info!("Deleted user {}", current.id);
    Ok(HttpResponse::NoContent().finish())
}
