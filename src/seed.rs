//! Default data loaded at startup.
//!
//! Every step checks for an existing row first, so running it against a
//! populated database changes nothing.

use crate::auth::hash_password;
use crate::error::AppError;
use crate::models::{NewLabel, NewTaskStatus, NewUser};
use crate::store::Store;

pub const DEFAULT_TASK_STATUSES: [(&str, &str); 5] = [
    ("Draft", "draft"),
    ("ToReview", "to_review"),
    ("ToBeFixed", "to_be_fixed"),
    ("ToPublish", "to_publish"),
    ("Published", "published"),
];

pub const DEFAULT_LABELS: [&str; 2] = ["feature", "bug"];

pub struct AdminAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

pub async fn load_defaults(
    store: &dyn Store,
    admin: AdminAccount<'_>,
    bcrypt_cost: u32,
) -> Result<(), AppError> {
    if store.find_user_by_email(admin.email).await?.is_none() {
        let password_digest = hash_password(admin.password, bcrypt_cost)?;
        store
            .create_user(NewUser {
                email: admin.email.to_string(),
                first_name: None,
                last_name: None,
                password_digest,
            })
            .await?;
        log::info!("Created admin user {}", admin.email);
    }

    for (name, slug) in DEFAULT_TASK_STATUSES {
        if store.find_task_status_by_slug(slug).await?.is_none() {
            store
                .create_task_status(NewTaskStatus {
                    name: name.to_string(),
                    slug: slug.to_string(),
                })
                .await?;
            log::debug!("Created task status {}", slug);
        }
    }

    for name in DEFAULT_LABELS {
        if store.find_label_by_name(name).await?.is_none() {
            store
                .create_label(NewLabel {
                    name: name.to_string(),
                })
                .await?;
            log::debug!("Created label {}", name);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    const ADMIN: AdminAccount<'static> = AdminAccount {
        email: "hexlet@example.com",
        password: "qwerty",
    };

    #[actix_rt::test]
    async fn test_load_defaults_is_idempotent() {
        let store = MemoryStore::new();
        load_defaults(&store, ADMIN, 4).await.unwrap();
        load_defaults(&store, ADMIN, 4).await.unwrap();

        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(verify_password("qwerty", &users[0].password_digest).unwrap());

        let slugs: Vec<String> = store
            .list_task_statuses()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.slug)
            .collect();
        assert_eq!(
            slugs,
            vec!["draft", "to_review", "to_be_fixed", "to_publish", "published"]
        );

        let labels: Vec<String> = store
            .list_labels()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(labels, vec!["feature", "bug"]);
    }
}
