//! Persistence seam.
//!
//! Handlers talk to a `Store` trait object. `MemoryStore` keeps everything in
//! process and backs the development profile and the test suite; `PgStore`
//! runs on PostgreSQL through `sqlx`. Both enforce the same constraints:
//! unique emails, status names, status slugs and label names, and no deletion
//! of users, statuses or labels that a task still points at.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{
    Label, NewLabel, NewTask, NewTaskStatus, NewUser, Task, TaskFilter, TaskStatus, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness probe used by `/health`.
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn update_user(&self, id: i64, user: NewUser) -> Result<User, AppError>;
    async fn delete_user(&self, id: i64) -> Result<(), AppError>;

    async fn list_task_statuses(&self) -> Result<Vec<TaskStatus>, AppError>;
    async fn find_task_status(&self, id: i64) -> Result<Option<TaskStatus>, AppError>;
    async fn find_task_status_by_slug(&self, slug: &str) -> Result<Option<TaskStatus>, AppError>;
    async fn create_task_status(&self, status: NewTaskStatus) -> Result<TaskStatus, AppError>;
    async fn update_task_status(
        &self,
        id: i64,
        status: NewTaskStatus,
    ) -> Result<TaskStatus, AppError>;
    async fn delete_task_status(&self, id: i64) -> Result<(), AppError>;

    async fn list_labels(&self) -> Result<Vec<Label>, AppError>;
    async fn find_label(&self, id: i64) -> Result<Option<Label>, AppError>;
    async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>, AppError>;
    async fn create_label(&self, label: NewLabel) -> Result<Label, AppError>;
    async fn update_label(&self, id: i64, label: NewLabel) -> Result<Label, AppError>;
    async fn delete_label(&self, id: i64) -> Result<(), AppError>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError>;
    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError>;
    async fn create_task(&self, task: NewTask) -> Result<Task, AppError>;
    async fn update_task(&self, id: i64, task: NewTask) -> Result<Task, AppError>;
    async fn delete_task(&self, id: i64) -> Result<(), AppError>;
}
