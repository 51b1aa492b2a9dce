pub mod label;
pub mod task;
pub mod task_status;
pub mod user;

pub use label::{Label, LabelCreate, LabelDto, LabelUpdate, NewLabel};
pub use task::{NewTask, Task, TaskCreate, TaskDto, TaskFilter, TaskUpdate};
pub use task_status::{NewTaskStatus, TaskStatus, TaskStatusCreate, TaskStatusDto, TaskStatusUpdate};
pub use user::{NewUser, User, UserCreate, UserDto, UserUpdate};

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in partial update bodies. Use together with `#[serde(default)]`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Rejects values that are empty or whitespace only.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
