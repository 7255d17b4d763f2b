use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    static ref PERMISSION_KEY_REGEX: Regex =
        Regex::new(r"^[a-z][a-z0-9_-]*:[a-z][a-z0-9_-]*$").unwrap();
    static ref GROUP_ACTION_REGEX: Regex =
        Regex::new(r"^[a-z][a-z0-9_-]*:\*$").unwrap();
}

/// `resource:action`, e.g. `posts:create`.
pub fn is_valid_permission_key(key: &str) -> bool {
    PERMISSION_KEY_REGEX.is_match(key)
}

/// `resource:*`, e.g. `posts:*`.
pub fn is_valid_group_action(action: &str) -> bool {
    GROUP_ACTION_REGEX.is_match(action)
}

/// Named bucket of related permissions, keyed by its `action`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionGroup {
    pub id: i64,
    pub action: String,
    pub label: String,
    pub description: Option<String>,
    pub action_url: Option<String>,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: i64,
    pub permission_group_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: i16,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GrantPermissions {
    #[validate(length(min = 1))]
    pub permission_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_key_format() {
        assert!(is_valid_permission_key("posts:create"));
        assert!(is_valid_permission_key("meta_tables:update"));
        assert!(!is_valid_permission_key("posts:*"));
        assert!(!is_valid_permission_key("Posts:create"));
        assert!(!is_valid_permission_key("posts"));
    }

    #[test]
    fn test_group_action_format() {
        assert!(is_valid_group_action("posts:*"));
        assert!(!is_valid_group_action("posts:create"));
        assert!(!is_valid_group_action("*"));
    }
}
