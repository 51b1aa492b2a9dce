#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{body::MessageBody, dev::ServiceResponse, http::header, test, web};
use serde_json::Value;
use task_manager::{
    auth::{hash_password, TokenService},
    models::{NewUser, User},
    seed::{self, AdminAccount},
    store::{MemoryStore, Store},
    AppState,
};

pub const ADMIN_EMAIL: &str = "hexlet@example.com";
pub const ADMIN_PASSWORD: &str = "qwerty";
pub const TEST_BCRYPT_COST: u32 = 4;

/// In-memory state with the default admin, task statuses and labels loaded.
pub async fn seeded_state() -> web::Data<AppState> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    seed::load_defaults(
        store.as_ref(),
        AdminAccount {
            email: ADMIN_EMAIL,
            password: ADMIN_PASSWORD,
        },
        TEST_BCRYPT_COST,
    )
    .await
    .expect("Failed to load default data");

    let tokens = TokenService::new("integration-test-secret", chrono::Duration::hours(1));
    web::Data::new(AppState::new(store, tokens, TEST_BCRYPT_COST))
}

pub async fn insert_user(state: &AppState, email: &str, password: &str) -> User {
    let password_digest = hash_password(password, TEST_BCRYPT_COST).unwrap();
    state
        .store
        .create_user(NewUser {
            email: email.to_string(),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            password_digest,
        })
        .await
        .expect("Failed to insert user")
}

pub async fn admin(state: &AppState) -> User {
    state
        .store
        .find_user_by_email(ADMIN_EMAIL)
        .await
        .unwrap()
        .expect("Admin user should be seeded")
}

/// `Authorization` header for a token issued to `email`.
pub fn bearer(state: &AppState, email: &str) -> (header::HeaderName, String) {
    let token = state.tokens.generate(email).unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn read_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "Response is not JSON ({}): {:?}",
            e,
            String::from_utf8_lossy(&body)
        )
    })
}

pub fn total_count<B>(resp: &ServiceResponse<B>) -> usize {
    resp.headers()
        .get("X-Total-Count")
        .expect("X-Total-Count header missing")
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}
