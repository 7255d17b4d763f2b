use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Navigation-menu entry shown to roles it is attached to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sidebar {
    pub id: i64,
    pub name: String,
    pub screen: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
