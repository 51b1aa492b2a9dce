use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{present, validate_not_blank};

/// A task as read from storage, with its status slug and label ids resolved.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Task {
    pub id: i64,
    #[sqlx(rename = "task_index")]
    pub index: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
    pub task_status_id: i64,
    pub status_slug: String,
    #[sqlx(skip)]
    pub label_ids: Vec<i64>,
    pub created_at: NaiveDate,
}

/// Column values for inserting or fully rewriting a task. References are
/// already resolved to ids.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub index: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub assignee_id: Option<i64>,
    pub task_status_id: i64,
    pub label_ids: BTreeSet<i64>,
}

/// Payload of `POST /api/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskCreate {
    pub index: Option<i64>,
    pub assignee_id: Option<i64>,
    #[validate(custom(function = "validate_not_blank", message = "Title must not be blank"))]
    pub title: String,
    pub content: Option<String>,
    /// Slug of the task status.
    #[validate(custom(function = "validate_not_blank", message = "Status must not be blank"))]
    pub status: String,
    #[serde(rename = "taskLabelIds", alias = "labelIds", default)]
    pub label_ids: Vec<i64>,
}

/// Payload of `PUT /api/tasks/{id}`. Absent fields are left alone; an explicit
/// `null` clears `index`, `assignee_id` and `content`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct TaskUpdate {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub index: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i64>)]
    pub assignee_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_blank", message = "Title must not be blank"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub content: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_blank", message = "Status must not be blank"))]
    pub status: Option<String>,
    #[serde(
        rename = "taskLabelIds",
        alias = "labelIds",
        skip_serializing_if = "Option::is_none"
    )]
    pub label_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: i64,
    pub index: Option<i64>,
    pub created_at: NaiveDate,
    #[serde(rename = "assignee_id")]
    pub assignee_id: Option<i64>,
    pub title: String,
    pub content: Option<String>,
    pub status: String,
    #[serde(rename = "taskLabelIds")]
    pub label_ids: Vec<i64>,
    /// Same ids as `taskLabelIds`, for clients of the older field name.
    #[serde(rename = "labelIds", default)]
    pub legacy_label_ids: Vec<i64>,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            index: task.index,
            created_at: task.created_at,
            assignee_id: task.assignee_id,
            title: task.name,
            content: task.description,
            status: task.status_slug,
            legacy_label_ids: task.label_ids.clone(),
            label_ids: task.label_ids,
        }
    }
}

impl TaskCreate {
    pub fn into_new_task(self, task_status_id: i64) -> NewTask {
        NewTask {
            index: self.index,
            name: self.title,
            description: self.content,
            assignee_id: self.assignee_id,
            task_status_id,
            label_ids: self.label_ids.into_iter().collect(),
        }
    }
}

impl TaskUpdate {
    /// `task_status_id` is the id resolved from `self.status`, if one was sent.
    pub fn merge_into(self, current: &Task, task_status_id: Option<i64>) -> NewTask {
        NewTask {
            index: self.index.unwrap_or(current.index),
            name: self.title.unwrap_or_else(|| current.name.clone()),
            description: self
                .content
                .unwrap_or_else(|| current.description.clone()),
            assignee_id: self.assignee_id.unwrap_or(current.assignee_id),
            task_status_id: task_status_id.unwrap_or(current.task_status_id),
            label_ids: match self.label_ids {
                Some(ids) => ids.into_iter().collect(),
                None => current.label_ids.iter().copied().collect(),
            },
        }
    }
}

/// Query parameters of `GET /api/tasks`. Every present criterion must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskFilter {
    /// Case-insensitive substring of the title.
    pub title_cont: Option<String>,
    pub assignee_id: Option<i64>,
    /// Task status slug.
    pub status: Option<String>,
    pub label_id: Option<i64>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(needle) = &self.title_cont {
            if !task.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(assignee_id) = self.assignee_id {
            if task.assignee_id != Some(assignee_id) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &task.status_slug != status {
                return false;
            }
        }
        if let Some(label_id) = self.label_id {
            if !task.label_ids.contains(&label_id) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_task() -> Task {
        Task {
            id: 3,
            index: Some(12),
            name: "Write the release notes".into(),
            description: Some("For 1.0".into()),
            assignee_id: Some(5),
            task_status_id: 1,
            status_slug: "draft".into(),
            label_ids: vec![1, 2],
            created_at: Utc::now().date_naive(),
        }
    }

    #[test]
    fn test_task_create_validation() {
        let input: TaskCreate = serde_json::from_value(json!({
            "title": "Task",
            "status": "draft",
            "assignee_id": 1,
            "labelIds": [2, 1, 2]
        }))
        .unwrap();
        assert!(input.validate().is_ok());

        let new_task = input.into_new_task(4);
        assert_eq!(new_task.task_status_id, 4);
        assert_eq!(new_task.assignee_id, Some(1));
        assert_eq!(new_task.label_ids, BTreeSet::from([1, 2]));

        let blank_title: TaskCreate =
            serde_json::from_value(json!({"title": "", "status": "draft"})).unwrap();
        assert!(blank_title.validate().is_err());

        let whitespace_status: TaskCreate =
            serde_json::from_value(json!({"title": "Task", "status": " \t"})).unwrap();
        assert!(whitespace_status.validate().is_err());

        let missing_status = serde_json::from_value::<TaskCreate>(json!({"title": "Task"}));
        assert!(missing_status.is_err());
    }

    #[test]
    fn test_task_update_distinguishes_null_from_absent() {
        let current = sample_task();

        let untouched: TaskUpdate = serde_json::from_value(json!({"title": "Renamed"})).unwrap();
        let merged = untouched.merge_into(&current, None);
        assert_eq!(merged.name, "Renamed");
        assert_eq!(merged.assignee_id, Some(5));
        assert_eq!(merged.index, Some(12));
        assert_eq!(merged.description.as_deref(), Some("For 1.0"));
        assert_eq!(merged.label_ids, BTreeSet::from([1, 2]));

        let cleared: TaskUpdate = serde_json::from_value(json!({
            "assignee_id": null,
            "content": null,
            "taskLabelIds": []
        }))
        .unwrap();
        let merged = cleared.merge_into(&current, Some(9));
        assert_eq!(merged.assignee_id, None);
        assert_eq!(merged.description, None);
        assert_eq!(merged.task_status_id, 9);
        assert!(merged.label_ids.is_empty());
    }

    #[test]
    fn test_task_dto_field_names() {
        let json = serde_json::to_value(TaskDto::from(sample_task())).unwrap();
        assert_eq!(json["title"], "Write the release notes");
        assert_eq!(json["content"], "For 1.0");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["assignee_id"], 5);
        assert_eq!(json["taskLabelIds"], json!([1, 2]));
        assert_eq!(json["labelIds"], json!([1, 2]));
        assert!(json["createdAt"].is_string());
    }

    #[test]
    fn test_task_filter_matches() {
        let task = sample_task();
        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter {
            title_cont: Some("RELEASE".into()),
            assignee_id: Some(5),
            status: Some("draft".into()),
            label_id: Some(2),
        }
        .matches(&task));
        assert!(!TaskFilter {
            status: Some("published".into()),
            ..Default::default()
        }
        .matches(&task));
        assert!(!TaskFilter {
            label_id: Some(99),
            ..Default::default()
        }
        .matches(&task));
        assert!(!TaskFilter {
            assignee_id: Some(6),
            ..Default::default()
        }
        .matches(&task));
    }
}
