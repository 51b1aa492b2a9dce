use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::validate_not_blank;

lazy_static! {
    // Lowercase letters, digits, underscores and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9_-]+$").unwrap();
}

/// A task workflow state such as `draft` or `published`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TaskStatus {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskStatus {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskStatusCreate {
    #[validate(custom(function = "validate_not_blank", message = "Name must not be blank"))]
    pub name: String,
    #[validate(
        length(min = 1),
        regex(
            path = "SLUG_REGEX",
            message = "Slug must contain lowercase letters, digits, underscores or hyphens"
        )
    )]
    pub slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_blank", message = "Name must not be blank"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 1),
        regex(
            path = "SLUG_REGEX",
            message = "Slug must contain lowercase letters, digits, underscores or hyphens"
        )
    )]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl From<TaskStatus> for TaskStatusDto {
    fn from(status: TaskStatus) -> Self {
        Self {
            id: status.id,
            name: status.name,
            slug: status.slug,
            created_at: status.created_at,
        }
    }
}

impl From<TaskStatusCreate> for NewTaskStatus {
    fn from(input: TaskStatusCreate) -> Self {
        Self {
            name: input.name,
            slug: input.slug,
        }
    }
}

impl TaskStatusUpdate {
    pub fn merge_into(self, current: &TaskStatus) -> NewTaskStatus {
        NewTaskStatus {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            slug: self.slug.unwrap_or_else(|| current.slug.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_validation() {
        let valid = TaskStatusCreate {
            name: "To review".into(),
            slug: "to_review".into(),
        };
        assert!(valid.validate().is_ok());

        let blank_name = TaskStatusCreate {
            name: "".into(),
            slug: "draft".into(),
        };
        assert!(blank_name.validate().is_err());

        let bad_slug = TaskStatusCreate {
            name: "Draft".into(),
            slug: "Has Spaces".into(),
        };
        assert!(bad_slug.validate().is_err());

        let bad_update = TaskStatusUpdate {
            slug: Some("".into()),
            ..Default::default()
        };
        assert!(bad_update.validate().is_err());
    }

    #[test]
    fn test_task_status_merge() {
        let current = TaskStatus {
            id: 1,
            name: "Draft".into(),
            slug: "draft".into(),
            created_at: Utc::now(),
        };
        let merged = TaskStatusUpdate {
            name: Some("Sketch".into()),
            slug: None,
        }
        .merge_into(&current);

        assert_eq!(merged.name, "Sketch");
        assert_eq!(merged.slug, "draft");
    }
}
