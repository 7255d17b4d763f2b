use crate::error::{DatabaseError, Result};
use civic_models::{NewRole, Permission, Role, UpdateRole};
use sqlx::PgPool;

/// Read side of the RBAC model plus soft revocation. Grants and
/// assignments go through the idempotent upsert in `civic-rbac`.
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new role
    pub async fn create(&self, new_role: &NewRole, actor_id: i64) -> Result<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO tbl_role (name, description, parent_role_id, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&new_role.name)
        .bind(&new_role.description)
        .bind(new_role.parent_role_id)
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateEntry(_) => DatabaseError::duplicate("Role", &format!("name {}", new_role.name)),
            other => other,
        })?;

        Ok(role)
    }

    /// Find role by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Role> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM tbl_role WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Role", &id.to_string()))?;

        Ok(role)
    }

    /// Find role by name
    pub async fn find_by_name(&self, name: &str) -> Result<Role> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM tbl_role WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Role {} not found", name)))?;

        Ok(role)
    }

    /// List roles
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM tbl_role WHERE ($1 OR status = 1) ORDER BY id",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    /// Update role
    pub async fn update(&self, id: i64, update: &UpdateRole, actor_id: i64) -> Result<Role> {
        let mut query_builder = sqlx::QueryBuilder::new("UPDATE tbl_role SET updated_by = ");
        query_builder.push_bind(actor_id);

        if let Some(ref name) = update.name {
            query_builder.push(", name = ");
            query_builder.push_bind(name);
        }

        if let Some(ref description) = update.description {
            query_builder.push(", description = ");
            query_builder.push_bind(description);
        }

        if let Some(parent_role_id) = update.parent_role_id {
            if parent_role_id == id {
                return Err(DatabaseError::InvalidInput("A role cannot be its own parent".to_string()));
            }
            query_builder.push(", parent_role_id = ");
            query_builder.push_bind(parent_role_id);
        }

        if let Some(status) = update.status {
            query_builder.push(", status = ");
            query_builder.push_bind(status);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);
        query_builder.push(" RETURNING *");

        let role = query_builder
            .build_query_as::<Role>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Role", &id.to_string()))?;

        Ok(role)
    }

    // User-Role Management

    /// Soft-revoke a role from a user
    pub async fn revoke_from_user(&self, user_id: i64, role_id: i64, actor_id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE tbl_user_role SET status = 0, updated_by = $1 WHERE user_id = $2 AND role_id = $3",
        )
        .bind(actor_id)
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Role {} is not assigned to user {}",
                role_id, user_id
            )));
        }

        Ok(())
    }

    /// Get all active roles for a user
    pub async fn get_user_roles(&self, user_id: i64) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.* FROM tbl_role r
            JOIN tbl_user_role ur ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND ur.status = 1 AND r.status = 1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }

    // Permission Management

    /// Get all active permissions granted to a role
    pub async fn get_permissions(&self, role_id: i64) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.* FROM tbl_permission p
            JOIN tbl_role_permission rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1 AND rp.status = 1 AND p.status = 1
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Number of role-permission rows for a role, active or not
    pub async fn count_permission_rows(&self, role_id: i64) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tbl_role_permission WHERE role_id = $1")
                .bind(role_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0)
    }

    /// Get all permissions for a user (through all their active roles)
    pub async fn get_user_permissions(&self, user_id: i64) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT DISTINCT p.* FROM tbl_permission p
            JOIN tbl_role_permission rp ON p.id = rp.permission_id AND rp.status = 1
            JOIN tbl_user_role ur ON rp.role_id = ur.role_id AND ur.status = 1
            JOIN tbl_role r ON r.id = ur.role_id AND r.status = 1
            WHERE ur.user_id = $1 AND p.status = 1
            ORDER BY p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Soft-revoke a permission from a role
    pub async fn revoke_permission(&self, role_id: i64, permission_id: i64, actor_id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tbl_role_permission SET status = 0, updated_by = $1
            WHERE role_id = $2 AND permission_id = $3
            "#,
        )
        .bind(actor_id)
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Permission {} is not granted to role {}",
                permission_id, role_id
            )));
        }

        Ok(())
    }

    /// Check if user has a specific permission
    pub async fn user_has_permission(&self, user_id: i64, permission_name: &str) -> Result<bool> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tbl_permission p
                JOIN tbl_role_permission rp ON p.id = rp.permission_id AND rp.status = 1
                JOIN tbl_user_role ur ON rp.role_id = ur.role_id AND ur.status = 1
                JOIN tbl_role r ON r.id = ur.role_id AND r.status = 1
                WHERE ur.user_id = $1 AND p.name = $2 AND p.status = 1
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }
}
