use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

use super::Store;
use crate::error::AppError;
use crate::models::{
    Label, NewLabel, NewTask, NewTaskStatus, NewUser, Task, TaskFilter, TaskStatus, User,
};

#[derive(Debug, Clone)]
struct TaskRow {
    id: i64,
    index: Option<i64>,
    name: String,
    description: Option<String>,
    assignee_id: Option<i64>,
    task_status_id: i64,
    label_ids: BTreeSet<i64>,
    created_at: NaiveDate,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    task_statuses: BTreeMap<i64, TaskStatus>,
    labels: BTreeMap<i64, Label>,
    tasks: BTreeMap<i64, TaskRow>,
    last_user_id: i64,
    last_task_status_id: i64,
    last_label_id: i64,
    last_task_id: i64,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_task_status_unique(
        &self,
        status: &NewTaskStatus,
        except: Option<i64>,
    ) -> Result<(), AppError> {
        for existing in self.task_statuses.values() {
            if Some(existing.id) == except {
                continue;
            }
            if existing.name == status.name {
                return Err(AppError::Conflict(format!(
                    "Task status with name '{}' already exists",
                    status.name
                )));
            }
            if existing.slug == status.slug {
                return Err(AppError::Conflict(format!(
                    "Task status with slug '{}' already exists",
                    status.slug
                )));
            }
        }
        Ok(())
    }

    fn label_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.labels
            .values()
            .any(|l| l.name == name && Some(l.id) != except)
    }

    fn check_task_references(&self, task: &NewTask) -> Result<(), AppError> {
        if !self.task_statuses.contains_key(&task.task_status_id) {
            return Err(AppError::BadRequest(format!(
                "Task status {} does not exist",
                task.task_status_id
            )));
        }
        if let Some(assignee_id) = task.assignee_id {
            if !self.users.contains_key(&assignee_id) {
                return Err(AppError::BadRequest(format!(
                    "User {} does not exist",
                    assignee_id
                )));
            }
        }
        if let Some(missing) = task.label_ids.iter().find(|id| !self.labels.contains_key(*id)) {
            return Err(AppError::BadRequest(format!("Label {} does not exist", missing)));
        }
        Ok(())
    }

    fn render(&self, row: &TaskRow) -> Task {
        let status_slug = self
            .task_statuses
            .get(&row.task_status_id)
            .map(|s| s.slug.clone())
            .unwrap_or_default();
        Task {
            id: row.id,
            index: row.index,
            name: row.name.clone(),
            description: row.description.clone(),
            assignee_id: row.assignee_id,
            task_status_id: row.task_status_id,
            status_slug,
            label_ids: row.label_ids.iter().copied().collect(),
            created_at: row.created_at,
        }
    }
}

/// In-process store guarded by a single lock. Ids are assigned from
/// per-table sequences and never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        tables.last_user_id += 1;
        let now = Utc::now();
        let created = User {
            id: tables.last_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_digest: user.password_digest,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, Some(id)) {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists",
                user.email
            )));
        }
        let existing = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;
        existing.email = user.email;
        existing.first_name = user.first_name;
        existing.last_name = user.last_name;
        existing.password_digest = user.password_digest;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        if tables.tasks.values().any(|t| t.assignee_id == Some(id)) {
            return Err(AppError::Conflict(format!(
                "User {} is assigned to tasks and cannot be deleted",
                id
            )));
        }
        tables.users.remove(&id);
        Ok(())
    }

    async fn list_task_statuses(&self) -> Result<Vec<TaskStatus>, AppError> {
        Ok(self.tables.read().await.task_statuses.values().cloned().collect())
    }

    async fn find_task_status(&self, id: i64) -> Result<Option<TaskStatus>, AppError> {
        Ok(self.tables.read().await.task_statuses.get(&id).cloned())
    }

    async fn find_task_status_by_slug(&self, slug: &str) -> Result<Option<TaskStatus>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.task_statuses.values().find(|s| s.slug == slug).cloned())
    }

    async fn create_task_status(&self, status: NewTaskStatus) -> Result<TaskStatus, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_task_status_unique(&status, None)?;
        tables.last_task_status_id += 1;
        let created = TaskStatus {
            id: tables.last_task_status_id,
            name: status.name,
            slug: status.slug,
            created_at: Utc::now(),
        };
        tables.task_statuses.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_task_status(
        &self,
        id: i64,
        status: NewTaskStatus,
    ) -> Result<TaskStatus, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_task_status_unique(&status, Some(id))?;
        let existing = tables
            .task_statuses
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Task status with id {} not found", id)))?;
        existing.name = status.name;
        existing.slug = status.slug;
        Ok(existing.clone())
    }

    async fn delete_task_status(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.task_statuses.contains_key(&id) {
            return Err(AppError::NotFound(format!(
                "Task status with id {} not found",
                id
            )));
        }
        if tables.tasks.values().any(|t| t.task_status_id == id) {
            return Err(AppError::Conflict(format!(
                "Task status {} is used by tasks and cannot be deleted",
                id
            )));
        }
        tables.task_statuses.remove(&id);
        Ok(())
    }

    async fn list_labels(&self) -> Result<Vec<Label>, AppError> {
        Ok(self.tables.read().await.labels.values().cloned().collect())
    }

    async fn find_label(&self, id: i64) -> Result<Option<Label>, AppError> {
        Ok(self.tables.read().await.labels.get(&id).cloned())
    }

    async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.labels.values().find(|l| l.name == name).cloned())
    }

    async fn create_label(&self, label: NewLabel) -> Result<Label, AppError> {
        let mut tables = self.tables.write().await;
        if tables.label_name_taken(&label.name, None) {
            return Err(AppError::Conflict(format!(
                "Label '{}' already exists",
                label.name
            )));
        }
        tables.last_label_id += 1;
        let created = Label {
            id: tables.last_label_id,
            name: label.name,
            created_at: Utc::now(),
        };
        tables.labels.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_label(&self, id: i64, label: NewLabel) -> Result<Label, AppError> {
        let mut tables = self.tables.write().await;
        if tables.label_name_taken(&label.name, Some(id)) {
            return Err(AppError::Conflict(format!(
                "Label '{}' already exists",
                label.name
            )));
        }
        let existing = tables
            .labels
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Label with id {} not found", id)))?;
        existing.name = label.name;
        Ok(existing.clone())
    }

    async fn delete_label(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.labels.contains_key(&id) {
            return Err(AppError::NotFound(format!("Label with id {} not found", id)));
        }
        if tables.tasks.values().any(|t| t.label_ids.contains(&id)) {
            return Err(AppError::Conflict(format!(
                "Label {} is attached to tasks and cannot be deleted",
                id
            )));
        }
        tables.labels.remove(&id);
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .map(|row| tables.render(row))
            .filter(|task| filter.matches(task))
            .collect())
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).map(|row| tables.render(row)))
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_task_references(&task)?;
        tables.last_task_id += 1;
        let row = TaskRow {
            id: tables.last_task_id,
            index: task.index,
            name: task.name,
            description: task.description,
            assignee_id: task.assignee_id,
            task_status_id: task.task_status_id,
            label_ids: task.label_ids,
            created_at: Utc::now().date_naive(),
        };
        let rendered = tables.render(&row);
        tables.tasks.insert(row.id, row);
        Ok(rendered)
    }

    async fn update_task(&self, id: i64, task: NewTask) -> Result<Task, AppError> {
        let mut tables = self.tables.write().await;
        tables.check_task_references(&task)?;
        let row = tables
            .tasks
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))?;
        row.index = task.index;
        row.name = task.name;
        row.description = task.description;
        row.assignee_id = task.assignee_id;
        row.task_status_id = task.task_status_id;
        row.label_ids = task.label_ids;
        let row = row.clone();
        Ok(tables.render(&row))
    }

    async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            first_name: Some("Test".into()),
            last_name: None,
            password_digest: "digest".into(),
        }
    }

    fn new_status(name: &str, slug: &str) -> NewTaskStatus {
        NewTaskStatus {
            name: name.into(),
            slug: slug.into(),
        }
    }

    async fn seeded() -> (MemoryStore, User, TaskStatus, Label) {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let status = store
            .create_task_status(new_status("Draft", "draft"))
            .await
            .unwrap();
        let label = store
            .create_label(NewLabel { name: "bug".into() })
            .await
            .unwrap();
        (store, user, status, label)
    }

    fn new_task(name: &str, status: &TaskStatus, assignee: Option<&User>, labels: &[i64]) -> NewTask {
        NewTask {
            index: None,
            name: name.into(),
            description: None,
            assignee_id: assignee.map(|u| u.id),
            task_status_id: status.id,
            label_ids: labels.iter().copied().collect(),
        }
    }

    #[actix_rt::test]
    async fn test_user_email_is_unique() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("a@example.com")).await.unwrap();
        let second = store.create_user(new_user("b@example.com")).await.unwrap();
        assert_eq!(second.id, first.id + 1);

        let duplicate = store.create_user(new_user("a@example.com")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let stolen = store.update_user(second.id, new_user("a@example.com")).await;
        assert!(matches!(stolen, Err(AppError::Conflict(_))));

        // Rewriting a user with its own email is fine.
        let same = store.update_user(first.id, new_user("a@example.com")).await;
        assert!(same.is_ok());
    }

    #[actix_rt::test]
    async fn test_missing_rows_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_user(42, new_user("x@example.com")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(store.delete_label(42).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.delete_task(42).await, Err(AppError::NotFound(_))));
        assert_eq!(store.find_task_status(42).await.unwrap(), None);
    }

    #[actix_rt::test]
    async fn test_task_status_name_and_slug_are_unique() {
        let store = MemoryStore::new();
        store
            .create_task_status(new_status("Draft", "draft"))
            .await
            .unwrap();
        assert!(matches!(
            store.create_task_status(new_status("Draft", "other")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            store.create_task_status(new_status("Other", "draft")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_referenced_rows_cannot_be_deleted() {
        let (store, user, status, label) = seeded().await;
        let task = store
            .create_task(new_task("Task", &status, Some(&user), &[label.id]))
            .await
            .unwrap();
        assert_eq!(task.status_slug, "draft");
        assert_eq!(task.label_ids, vec![label.id]);

        assert!(matches!(store.delete_user(user.id).await, Err(AppError::Conflict(_))));
        assert!(matches!(
            store.delete_task_status(status.id).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(store.delete_label(label.id).await, Err(AppError::Conflict(_))));

        store.delete_task(task.id).await.unwrap();
        store.delete_label(label.id).await.unwrap();
        store.delete_task_status(status.id).await.unwrap();
        store.delete_user(user.id).await.unwrap();
    }

    #[actix_rt::test]
    async fn test_task_with_unknown_references_is_rejected() {
        let (store, _user, status, _label) = seeded().await;
        let mut task = new_task("Task", &status, None, &[99]);
        assert!(matches!(store.create_task(task.clone()).await, Err(AppError::BadRequest(_))));

        task.label_ids.clear();
        task.assignee_id = Some(99);
        assert!(matches!(store.create_task(task.clone()).await, Err(AppError::BadRequest(_))));

        task.assignee_id = None;
        let created = store.create_task(task.clone()).await.unwrap();
        task.task_status_id = 99;
        assert!(matches!(
            store.update_task(created.id, task).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[actix_rt::test]
    async fn test_status_rename_is_visible_on_tasks() {
        let (store, _user, status, _label) = seeded().await;
        let task = store
            .create_task(new_task("Task", &status, None, &[]))
            .await
            .unwrap();
        store
            .update_task_status(status.id, new_status("Drafted", "drafted"))
            .await
            .unwrap();

        let reloaded = store.find_task(task.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status_slug, "drafted");
    }

    #[actix_rt::test]
    async fn test_list_tasks_applies_filter() {
        let (store, user, status, label) = seeded().await;
        let published = store
            .create_task_status(new_status("Published", "published"))
            .await
            .unwrap();
        store
            .create_task(new_task("Fix login", &status, Some(&user), &[label.id]))
            .await
            .unwrap();
        store
            .create_task(new_task("Write docs", &published, None, &[]))
            .await
            .unwrap();

        let all = store.list_tasks(&TaskFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_title = store
            .list_tasks(&TaskFilter {
                title_cont: Some("LOGIN".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].name, "Fix login");

        let by_status_and_label = store
            .list_tasks(&TaskFilter {
                status: Some("published".into()),
                label_id: Some(label.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(by_status_and_label.is_empty());
    }
}
