use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::validate_not_blank;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLabel {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LabelCreate {
    #[validate(
        length(min = 3, max = 1000),
        custom(function = "validate_not_blank", message = "Name must not be blank")
    )]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct LabelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(
        length(min = 3, max = 1000),
        custom(function = "validate_not_blank", message = "Name must not be blank")
    )]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelDto {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Label> for LabelDto {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
            created_at: label.created_at,
        }
    }
}

impl From<LabelCreate> for NewLabel {
    fn from(input: LabelCreate) -> Self {
        Self { name: input.name }
    }
}

impl LabelUpdate {
    pub fn merge_into(self, current: &Label) -> NewLabel {
        NewLabel {
            name: self.name.unwrap_or_else(|| current.name.clone()),
        }
    }
}
