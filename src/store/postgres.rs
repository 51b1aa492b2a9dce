use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeSet;

use super::Store;
use crate::error::AppError;
use crate::models::{
    Label, NewLabel, NewTask, NewTaskStatus, NewUser, Task, TaskFilter, TaskStatus, User,
};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_digest, created_at, updated_at";
const TASK_STATUS_COLUMNS: &str = "id, name, slug, created_at";
const TASK_REFERENCE_MISSING: &str = "Task refers to a status or user that does not exist";
const LABEL_COLUMNS: &str = "id, name, created_at";
const TASK_SELECT: &str = "SELECT t.id, t.task_index, t.name, t.description, t.assignee_id, \
     t.task_status_id, s.slug AS status_slug, t.created_at \
     FROM tasks t JOIN task_statuses s ON s.id = t.task_status_id";

/// PostgreSQL-backed store. Uniqueness and referential rules live in the
/// schema (see `migrations/`); violations surface as `AppError::Conflict`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn attach_labels(&self, tasks: &mut [Task]) -> Result<(), AppError> {
        if tasks.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let links = sqlx::query_as::<_, (i64, i64)>(
            "SELECT task_id, label_id FROM task_labels WHERE task_id = ANY($1) ORDER BY label_id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        for task in tasks.iter_mut() {
            task.label_ids = links
                .iter()
                .filter(|(task_id, _)| *task_id == task.id)
                .map(|(_, label_id)| *label_id)
                .collect();
        }
        Ok(())
    }

    async fn reload_task(&self, id: i64) -> Result<Task, AppError> {
        self.find_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task with id {} not found", id)))
    }
}

async fn replace_labels(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i64,
    label_ids: &BTreeSet<i64>,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM task_labels WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut **tx)
        .await?;

    if !label_ids.is_empty() {
        let ids: Vec<i64> = label_ids.iter().copied().collect();
        sqlx::query("INSERT INTO task_labels (task_id, label_id) SELECT $1, UNNEST($2::BIGINT[])")
            .bind(task_id)
            .bind(ids)
            .execute(&mut **tx)
            .await
            .map_err(unknown_reference("Task refers to a label that does not exist"))?;
    }
    Ok(())
}

/// Rewrites a constraint violation into a message naming what blocked it.
fn conflict_as(message: String) -> impl FnOnce(sqlx::Error) -> AppError {
    move |error| match AppError::from(error) {
        AppError::Conflict(_) => AppError::Conflict(message),
        other => other,
    }
}

/// Foreign-key failures on task writes mean the body named a status, user or
/// label that is gone.
fn unknown_reference(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |error| match AppError::from(error) {
        AppError::Conflict(_) => AppError::BadRequest(message.to_string()),
        other => other,
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (email, first_name, last_name, password_digest) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_digest)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "User with email '{}' already exists",
                user.email
            )))
    }

    async fn update_user(&self, id: i64, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET email = $1, first_name = $2, last_name = $3, \
             password_digest = $4, updated_at = NOW() WHERE id = $5 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_digest)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "User with email '{}' already exists",
                user.email
            )))?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "User {} is assigned to tasks and cannot be deleted",
                id
            )))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    async fn list_task_statuses(&self) -> Result<Vec<TaskStatus>, AppError> {
        let sql = format!("SELECT {} FROM task_statuses ORDER BY id", TASK_STATUS_COLUMNS);
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_task_status(&self, id: i64) -> Result<Option<TaskStatus>, AppError> {
        let sql = format!("SELECT {} FROM task_statuses WHERE id = $1", TASK_STATUS_COLUMNS);
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_task_status_by_slug(&self, slug: &str) -> Result<Option<TaskStatus>, AppError> {
        let sql = format!(
            "SELECT {} FROM task_statuses WHERE slug = $1",
            TASK_STATUS_COLUMNS
        );
        Ok(sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_task_status(&self, status: NewTaskStatus) -> Result<TaskStatus, AppError> {
        let sql = format!(
            "INSERT INTO task_statuses (name, slug) VALUES ($1, $2) RETURNING {}",
            TASK_STATUS_COLUMNS
        );
        sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(&status.name)
            .bind(&status.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "Task status with name '{}' or slug '{}' already exists",
                status.name, status.slug
            )))
    }

    async fn update_task_status(
        &self,
        id: i64,
        status: NewTaskStatus,
    ) -> Result<TaskStatus, AppError> {
        let sql = format!(
            "UPDATE task_statuses SET name = $1, slug = $2 WHERE id = $3 RETURNING {}",
            TASK_STATUS_COLUMNS
        );
        sqlx::query_as::<_, TaskStatus>(&sql)
            .bind(&status.name)
            .bind(&status.slug)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "Task status with name '{}' or slug '{}' already exists",
                status.name, status.slug
            )))?
            .ok_or_else(|| AppError::NotFound(format!("Task status with id {} not found", id)))
    }

    async fn delete_task_status(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM task_statuses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "Task status {} is used by tasks and cannot be deleted",
                id
            )))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Task status with id {} not found",
                id
            )));
        }
        Ok(())
    }

    async fn list_labels(&self) -> Result<Vec<Label>, AppError> {
        let sql = format!("SELECT {} FROM labels ORDER BY id", LABEL_COLUMNS);
        Ok(sqlx::query_as::<_, Label>(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_label(&self, id: i64) -> Result<Option<Label>, AppError> {
        let sql = format!("SELECT {} FROM labels WHERE id = $1", LABEL_COLUMNS);
        Ok(sqlx::query_as::<_, Label>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_label_by_name(&self, name: &str) -> Result<Option<Label>, AppError> {
        let sql = format!("SELECT {} FROM labels WHERE name = $1", LABEL_COLUMNS);
        Ok(sqlx::query_as::<_, Label>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_label(&self, label: NewLabel) -> Result<Label, AppError> {
        let sql = format!(
            "INSERT INTO labels (name) VALUES ($1) RETURNING {}",
            LABEL_COLUMNS
        );
        sqlx::query_as::<_, Label>(&sql)
            .bind(&label.name)
            .fetch_one(&self.pool)
            .await
            .map_err(conflict_as(format!("Label '{}' already exists", label.name)))
    }

    async fn update_label(&self, id: i64, label: NewLabel) -> Result<Label, AppError> {
        let sql = format!(
            "UPDATE labels SET name = $1 WHERE id = $2 RETURNING {}",
            LABEL_COLUMNS
        );
        sqlx::query_as::<_, Label>(&sql)
            .bind(&label.name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conflict_as(format!("Label '{}' already exists", label.name)))?
            .ok_or_else(|| AppError::NotFound(format!("Label with id {} not found", id)))
    }

    async fn delete_label(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM labels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(conflict_as(format!(
                "Label {} is attached to tasks and cannot be deleted",
                id
            )))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Label with id {} not found", id)));
        }
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        // Conditions are appended in the same order the values are bound below.
        let mut sql = String::from(TASK_SELECT);
        let mut param_count = 1;
        let mut conditions: Vec<String> = Vec::new();

        if filter.title_cont.is_some() {
            conditions.push(format!("t.name ILIKE ${}", param_count));
            param_count += 1;
        }
        if filter.assignee_id.is_some() {
            conditions.push(format!("t.assignee_id = ${}", param_count));
            param_count += 1;
        }
        if filter.status.is_some() {
            conditions.push(format!("s.slug = ${}", param_count));
            param_count += 1;
        }
        if filter.label_id.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM task_labels tl WHERE tl.task_id = t.id AND tl.label_id = ${})",
                param_count
            ));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY t.id");

        let mut query = sqlx::query_as::<_, Task>(&sql);
        if let Some(title) = &filter.title_cont {
            query = query.bind(format!("%{}%", escape_like(title)));
        }
        if let Some(assignee_id) = filter.assignee_id {
            query = query.bind(assignee_id);
        }
        if let Some(status) = &filter.status {
            query = query.bind(status);
        }
        if let Some(label_id) = filter.label_id {
            query = query.bind(label_id);
        }

        let mut tasks = query.fetch_all(&self.pool).await?;
        self.attach_labels(&mut tasks).await?;
        Ok(tasks)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        let sql = format!("{} WHERE t.id = $1", TASK_SELECT);
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match task {
            Some(task) => {
                let mut tasks = [task];
                self.attach_labels(&mut tasks).await?;
                let [task] = tasks;
                Ok(Some(task))
            }
            None => Ok(None),
        }
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await?;
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO tasks (task_index, name, description, assignee_id, task_status_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(task.index)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.task_status_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unknown_reference(TASK_REFERENCE_MISSING))?;
        replace_labels(&mut tx, id, &task.label_ids).await?;
        tx.commit().await?;

        self.reload_task(id).await
    }

    async fn update_task(&self, id: i64, task: NewTask) -> Result<Task, AppError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, (i64,)>(
            "UPDATE tasks SET task_index = $1, name = $2, description = $3, assignee_id = $4, \
             task_status_id = $5 WHERE id = $6 RETURNING id",
        )
        .bind(task.index)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.task_status_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unknown_reference(TASK_REFERENCE_MISSING))?;
        if updated.is_none() {
            return Err(AppError::NotFound(format!("Task with id {} not found", id)));
        }
        replace_labels(&mut tx, id, &task.label_ids).await?;
        tx.commit().await?;

        self.reload_task(id).await
    }

    async fn delete_task(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Task with id {} not found", id)));
        }
        Ok(())
    }
}
