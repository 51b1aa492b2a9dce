use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::validate_not_blank;

/// A user row. The password digest never leaves the server; responses go
/// through `UserDto`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for inserting or fully rewriting a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_digest: String,
}

/// Payload of `POST /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_not_blank", message = "First name must not be blank"))]
    pub first_name: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "Last name must not be blank"))]
    pub last_name: Option<String>,
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: String,
}

/// Payload of `PUT /api/users/{id}`. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_blank", message = "First name must not be blank"))]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_blank", message = "Last name must not be blank"))]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

impl UserCreate {
    pub fn into_new_user(self, password_digest: String) -> NewUser {
        NewUser {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_digest,
        }
    }
}

impl UserUpdate {
    /// `password_digest` is the hash of `self.password`, computed by the caller.
    pub fn merge_into(self, current: &User, password_digest: Option<String>) -> NewUser {
        NewUser {
            email: self.email.unwrap_or_else(|| current.email.clone()),
            first_name: self.first_name.or_else(|| current.first_name.clone()),
            last_name: self.last_name.or_else(|| current.last_name.clone()),
            password_digest: password_digest.unwrap_or_else(|| current.password_digest.clone()),
        }
    }
}
