use crate::error::{DatabaseError, Result};
use civic_models::{Permission, PermissionGroup};
use sqlx::PgPool;

pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List active permission groups
    pub async fn list_groups(&self) -> Result<Vec<PermissionGroup>> {
        let groups = sqlx::query_as::<_, PermissionGroup>(
            "SELECT * FROM tbl_permission_group WHERE status = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Find group by its action, e.g. `posts:*`
    pub async fn find_group_by_action(&self, action: &str) -> Result<PermissionGroup> {
        let group = sqlx::query_as::<_, PermissionGroup>(
            "SELECT * FROM tbl_permission_group WHERE action = $1",
        )
        .bind(action)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Permission group {} not found", action)))?;

        Ok(group)
    }

    /// List active permissions belonging to the group with `action`
    pub async fn list_by_group_action(&self, action: &str) -> Result<Vec<Permission>> {
        let group = self.find_group_by_action(action).await?;

        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT * FROM tbl_permission
            WHERE permission_group_id = $1 AND status = 1
            ORDER BY id
            "#,
        )
        .bind(group.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// List all active permissions
    pub async fn list_active(&self) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT * FROM tbl_permission WHERE status = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Find permission by its key, e.g. `posts:create`
    pub async fn find_by_name(&self, name: &str) -> Result<Permission> {
        let permission = sqlx::query_as::<_, Permission>(
            "SELECT * FROM tbl_permission WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Permission {} not found", name)))?;

        Ok(permission)
    }

    /// Permissions whose group row is missing. Empty on a consistent database.
    pub async fn find_orphans(&self) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.* FROM tbl_permission p
            LEFT JOIN tbl_permission_group g ON g.id = p.permission_group_id
            WHERE g.id IS NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }
}
