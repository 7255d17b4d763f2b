use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Roles form a flat catalog. `parent_role_id` only groups roles for display
/// and does not cascade permissions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_role_id: Option<i64>,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewRole {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub description: Option<String>,

    pub parent_role_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateRole {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub parent_role_id: Option<i64>,

    #[validate(range(min = 0, max = 1))]
    pub status: Option<i16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignRoles {
    #[validate(length(min = 1))]
    pub role_ids: Vec<i64>,
}
